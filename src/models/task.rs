use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use validator::Validate;

use crate::models::User;
use crate::repository::{Entity, FieldValue, Fields};

/// A stored value that does not map onto one of the task enums.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

/// Represents the status of a task.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is yet to be completed.
    #[default]
    Pending,
    /// Task is completed.
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "done" => Ok(TaskStatus::Done),
            _ => Err(ParseEnumError {
                kind: "task status",
                value: s.to_string(),
            }),
        }
    }
}

impl From<TaskStatus> for FieldValue {
    fn from(status: TaskStatus) -> Self {
        FieldValue::Text(status.as_str().to_string())
    }
}

/// Ordinal priority of a task, serialised as its number (1 = lowest, 5 = highest).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(try_from = "i32", into = "i32")]
pub enum TaskPriority {
    Lowest = 1,
    Low = 2,
    #[default]
    Medium = 3,
    High = 4,
    Highest = 5,
}

impl TryFrom<i32> for TaskPriority {
    type Error = ParseEnumError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TaskPriority::Lowest),
            2 => Ok(TaskPriority::Low),
            3 => Ok(TaskPriority::Medium),
            4 => Ok(TaskPriority::High),
            5 => Ok(TaskPriority::Highest),
            _ => Err(ParseEnumError {
                kind: "task priority",
                value: value.to_string(),
            }),
        }
    }
}

impl From<TaskPriority> for i32 {
    fn from(priority: TaskPriority) -> Self {
        priority as i32
    }
}

impl From<TaskPriority> for FieldValue {
    fn from(priority: TaskPriority) -> Self {
        FieldValue::Int(priority.into())
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    /// Name of the owner at the time the task was created.
    pub customer_name: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Identifier of the user who owns the task.
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn decode_error(column: &str, err: ParseEnumError) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    }
}

impl<'r> FromRow<'r, PgRow> for Task {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        let priority: i32 = row.try_get("priority")?;

        Ok(Self {
            id: row.try_get("id")?,
            customer_name: row.try_get("customer_name")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            status: status.parse().map_err(|e| decode_error("status", e))?,
            priority: TaskPriority::try_from(priority).map_err(|e| decode_error("priority", e))?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl Entity for Task {
    const TABLE: &'static str = "tasks";
    const NAME: &'static str = "Task";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "customer_name",
        "title",
        "description",
        "status",
        "priority",
        "user_id",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> i32 {
        self.id
    }
}

/// Payload for creating a task. Owner fields are stamped from the caller.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
}

impl CreateTask {
    pub fn into_fields(self, owner: &User) -> Fields {
        Fields::new()
            .set("customer_name", owner.name.as_str())
            .set("user_id", owner.id)
            .set("title", self.title)
            .set_opt("description", self.description)
            .set("status", self.status)
            .set("priority", self.priority)
    }
}

/// Partial update of a task. `None` leaves the stored value unchanged.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskUpdate {
    pub fn into_fields(self) -> Fields {
        Fields::new()
            .set_opt("title", self.title)
            .set_opt("description", self.description)
            .set_opt("status", self.status)
            .set_opt("priority", self.priority)
    }
}

/// Query parameters accepted when listing tasks.
#[derive(Debug, Default, Deserialize)]
pub struct TaskFilterQuery {
    /// Lower bound on the creation time, see [`parse_timestamp`].
    pub created_at: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

#[derive(Debug, Deserialize)]
pub struct TaskSearchQuery {
    pub search_term: String,
}

/// Parses RFC 3339, `YYYY-MM-DDTHH:MM:SS` (read as UTC) or a bare `YYYY-MM-DD`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

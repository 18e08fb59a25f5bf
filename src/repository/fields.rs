use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

/// A single column value that can be bound into a query.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    Int(i32),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    pub(crate) fn push_bind(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        match self {
            FieldValue::Bool(v) => {
                builder.push_bind(*v);
            }
            FieldValue::Int(v) => {
                builder.push_bind(*v);
            }
            FieldValue::Text(v) => {
                builder.push_bind(v.clone());
            }
            FieldValue::Timestamp(v) => {
                builder.push_bind(*v);
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

/// Ordered column → value mapping used for create, update and filter calls.
///
/// A `None` value means "no value supplied": `create` leaves the column to its
/// default, `update` leaves it unchanged and `get_by_filters` adds no predicate.
/// Setting the same column twice keeps the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields {
    entries: Vec<(String, Option<FieldValue>)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(self, column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.put(column.into(), Some(value.into()))
    }

    pub fn set_opt<V: Into<FieldValue>>(self, column: impl Into<String>, value: Option<V>) -> Self {
        self.put(column.into(), value.map(Into::into))
    }

    fn put(mut self, column: String, value: Option<FieldValue>) -> Self {
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FieldValue>)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_ref()))
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::repository::Entity;

/// A registered account as stored in the `users` table.
///
/// The password hash and the current refresh token never leave the server.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
    pub active: bool,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const TABLE: &'static str = "users";
    const NAME: &'static str = "User";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "email",
        "password",
        "active",
        "refresh_token",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> i32 {
        self.id
    }
}

/// Public view of a user returned by registration.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct UserRead {
    pub name: String,
    pub email: Option<String>,
    pub active: bool,
}

impl From<&User> for UserRead {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            active: user.active,
        }
    }
}

//! Domain services used by the HTTP handlers.
//!
//! Services are built once at startup from the pool and the auth settings and
//! handed to actix as `web::Data`. They hold no mutable state of their own.

pub mod tasks;
pub mod users;

use std::sync::Arc;

use actix_web::web;
use sqlx::PgPool;

use crate::auth::session::SessionResolver;
use crate::auth::token::TokenIssuer;
use crate::config::AuthConfig;
use crate::db::Database;
use crate::repository::{TasksRepository, UsersRepository};

pub use tasks::TasksService;
pub use users::UsersService;

/// Everything the request handlers need, wired together.
#[derive(Clone)]
pub struct Services {
    pub database: Database,
    pub users: UsersService,
    pub tasks: TasksService,
    pub sessions: SessionResolver,
}

impl Services {
    pub fn build(pool: PgPool, auth: &AuthConfig) -> Self {
        let tokens = Arc::new(TokenIssuer::new(auth));
        let users_repo = UsersRepository::new(pool.clone());

        Self {
            database: Database::from_pool(pool.clone()),
            users: UsersService::new(users_repo.clone(), tokens.clone()),
            tasks: TasksService::new(TasksRepository::new(pool)),
            sessions: SessionResolver::new(tokens, users_repo),
        }
    }

    /// Registers every service as app data on `cfg`.
    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.database.clone()))
            .app_data(web::Data::new(self.users.clone()))
            .app_data(web::Data::new(self.tasks.clone()))
            .app_data(web::Data::new(self.sessions.clone()));
    }
}

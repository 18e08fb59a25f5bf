#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Domain models, authentication and session handling, the generic repository,"]
#![doc = "domain services, routing configuration and error handling for the TaskDesk"]
#![doc = "service. The binary (`main.rs`) loads the configuration, opens the database"]
#![doc = "and mounts [`routes::config`] on an actix-web server."]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;

pub use crate::config::Config;
pub use crate::db::Database;
pub use crate::error::AppError;
pub use crate::services::Services;

pub mod auth;
pub mod health;
pub mod tasks;
pub mod users;

use actix_web::{error, web, HttpRequest};

use crate::error::AppError;

fn bad_request<E: std::fmt::Display>(err: E, _req: &HttpRequest) -> error::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Mounts `/health` and the versioned API.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(bad_request))
        .app_data(web::QueryConfig::default().error_handler(bad_request))
        .app_data(web::FormConfig::default().error_handler(bad_request))
        .app_data(web::PathConfig::default().error_handler(bad_request))
        .service(health::health)
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/auth")
                        .service(auth::register)
                        .service(auth::login)
                        .service(auth::refresh),
                )
                .service(web::scope("/users").service(users::list_users))
                .service(
                    web::scope("/tasks")
                        .service(tasks::search_tasks)
                        .service(tasks::get_tasks)
                        .service(tasks::create_task)
                        .service(tasks::update_task),
                ),
        );
}

use crate::{auth::CurrentUser, error::AppError, services::UsersService};
use actix_web::{routes, web, HttpResponse, Responder};

/// Lists every user. Requires a bearer token.
#[routes]
#[get("")]
#[get("/")]
pub async fn list_users(
    _current: CurrentUser,
    users: web::Data<UsersService>,
) -> Result<impl Responder, AppError> {
    let users = users.list().await?;
    Ok(HttpResponse::Ok().json(users))
}

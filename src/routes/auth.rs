use crate::{
    auth::{CurrentUser, LoginForm, RefreshQuery, RegisterRequest},
    error::AppError,
    models::UserRead,
    services::UsersService,
};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{post, web, HttpResponse, Responder};
use log::debug;
use validator::Validate;

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .secure(true)
        .same_site(SameSite::None)
        .finish()
}

/// Register a new user
///
/// Creates the account and returns its public view. No token is issued; the
/// client logs in afterwards.
#[post("/register")]
pub async fn register(
    users: web::Data<UsersService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;

    let user = users.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserRead::from(&user)))
}

/// Login user
///
/// Accepts a form with `username` (name or email) and `password`. On success the
/// tokens are returned in the body, as cookies, and the access token in the
/// `Authorization` header.
#[post("/login")]
pub async fn login(
    users: web::Data<UsersService>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    let tokens = users.login(&form.username, &form.password).await?;

    Ok(HttpResponse::Ok()
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", tokens.access_token),
        ))
        .cookie(session_cookie("access_token", tokens.access_token.clone()))
        .cookie(session_cookie("refresh_token", tokens.refresh_token.clone()))
        .json(tokens))
}

/// Exchange a refresh token for a new access token
///
/// The caller must still present a valid access token.
#[post("/refresh")]
pub async fn refresh(
    current: CurrentUser,
    users: web::Data<UsersService>,
    query: web::Query<RefreshQuery>,
) -> Result<impl Responder, AppError> {
    let refresh_token = query
        .refresh_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("refresh_token is required".into()))?;
    debug!("User {} refreshing access token", current.0.id);

    let token = users.refresh(refresh_token).await?;

    Ok(HttpResponse::Ok()
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", token.access_token),
        ))
        .cookie(session_cookie("access_token", token.access_token.clone()))
        .json(token))
}

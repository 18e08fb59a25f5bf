use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, Error as ActixError, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;

use crate::auth::session::SessionResolver;
use crate::error::AppError;
use crate::models::User;

/// The authenticated caller of a request.
///
/// Adding this extractor to a handler's arguments protects the route: the bearer
/// token from the `Authorization` header is resolved through the
/// [`SessionResolver`] registered as app data, and the request fails with a 401
/// before the handler runs if that does not succeed.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Token from an `Authorization: Bearer <token>` header, if there is one.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

impl FromRequest for CurrentUser {
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let resolver = req.app_data::<web::Data<SessionResolver>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let resolver = resolver.ok_or_else(|| {
                AppError::ServerError("SessionResolver is not registered as app data".into())
            })?;
            let user = resolver.resolve(token.as_deref()).await?;
            Ok(CurrentUser(user))
        })
    }
}

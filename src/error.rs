//!
//! # Error Handling
//!
//! `AppError` is the error type every handler and service returns. It carries the
//! taxonomy the API exposes to clients and implements
//! `actix_web::error::ResponseError`, so a handler returning `Err(AppError)` becomes
//! a JSON error response with the matching status code.
//!
//! Lower layers have their own error types (`RepoError`, `TokenError`) which convert
//! into `AppError` through `From`, keeping the `?` operator usable end to end.
//! Server-side failures are logged here, at the boundary, with their full cause; the
//! client only ever sees a generic message for them.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use validator::ValidationErrors;

use crate::auth::token::TokenError;
use crate::repository::RepoError;

/// Every failure the API can report.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A requested record does not exist (HTTP 404).
    #[error("{0}")]
    NotFound(String),
    /// Login with a password that does not match the stored hash (HTTP 400).
    #[error("Invalid password")]
    InvalidPassword,
    /// The bearer token's `exp` claim has elapsed (HTTP 401).
    #[error("Token has expired")]
    Expired,
    /// The bearer token has a bad signature or malformed claims (HTTP 401).
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    /// No bearer token was supplied (HTTP 401).
    #[error("Token not provided")]
    Unauthenticated,
    /// The token is valid but the account is switched off (HTTP 401).
    #[error("User is deactivated")]
    Deactivated,
    /// Malformed request input (HTTP 400).
    #[error("{0}")]
    BadRequest(String),
    /// Input failed validation rules (HTTP 422).
    #[error("{0}")]
    ValidationError(String),
    /// The data store failed (HTTP 500).
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// Anything unexpected (HTTP 500).
    #[error("Internal server error: {0}")]
    ServerError(String),
}

const GENERIC_SERVER_MESSAGE: &str = "Internal server error";

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidPassword | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Expired
            | AppError::InvalidToken(_)
            | AppError::Unauthenticated
            | AppError::Deactivated => StatusCode::UNAUTHORIZED,
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DatabaseError(_) | AppError::ServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("Request failed: {}", self);
            GENERIC_SERVER_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

impl From<RepoError> for AppError {
    fn from(error: RepoError) -> AppError {
        match error {
            RepoError::NotFound { entity } => AppError::NotFound(format!("{} not found", entity)),
            RepoError::Validation(msg) => AppError::ValidationError(msg),
            RepoError::Conflict(msg) => AppError::BadRequest(msg),
            RepoError::Database { .. } => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        match error {
            TokenError::Expired => AppError::Expired,
            TokenError::Invalid(msg) => AppError::InvalidToken(msg),
            TokenError::Encode(msg) => AppError::ServerError(msg),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::ServerError(format!("Password hashing failed: {}", error))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(error: tokio::task::JoinError) -> AppError {
        AppError::ServerError(format!("Background task failed: {}", error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (AppError::NotFound("User not found".into()), 404),
            (AppError::InvalidPassword, 400),
            (AppError::BadRequest("bad".into()), 400),
            (AppError::Expired, 401),
            (AppError::InvalidToken("bad signature".into()), 401),
            (AppError::Unauthenticated, 401),
            (AppError::Deactivated, 401),
            (AppError::ValidationError("title".into()), 422),
            (AppError::DatabaseError("boom".into()), 500),
            (AppError::ServerError("boom".into()), 500),
        ];

        for (error, expected) in cases {
            assert_eq!(error.error_response().status(), expected, "{:?}", error);
        }
    }

    #[actix_rt::test]
    async fn test_server_errors_do_not_leak_details() {
        let response = AppError::DatabaseError("relation \"users\" does not exist".into())
            .error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], GENERIC_SERVER_MESSAGE);
    }

    #[actix_rt::test]
    async fn test_client_errors_carry_message() {
        let response = AppError::NotFound("Task not found".into()).error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["error"], "Task not found");
    }

    #[test]
    fn test_repo_error_translation() {
        let err: AppError = RepoError::NotFound { entity: "Task" }.into();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "Task not found"));

        let err: AppError = RepoError::Conflict("name already taken".into()).into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = RepoError::Validation("no column `nope`".into()).into();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[test]
    fn test_token_error_translation() {
        assert!(matches!(AppError::from(TokenError::Expired), AppError::Expired));
        assert!(matches!(
            AppError::from(TokenError::Invalid("InvalidSignature".into())),
            AppError::InvalidToken(_)
        ));
    }
}

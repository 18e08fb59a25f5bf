use std::sync::Arc;

use log::{error, warn};

use crate::auth::token::TokenIssuer;
use crate::error::AppError;
use crate::models::User;
use crate::repository::{RepoError, UsersRepository};

/// Turns a bearer token into the active [`User`] it belongs to.
///
/// Nothing is cached: every call verifies the token and reads the user afresh.
#[derive(Clone)]
pub struct SessionResolver {
    tokens: Arc<TokenIssuer>,
    users: UsersRepository,
}

impl SessionResolver {
    pub fn new(tokens: Arc<TokenIssuer>, users: UsersRepository) -> Self {
        Self { tokens, users }
    }

    pub async fn resolve(&self, bearer: Option<&str>) -> Result<User, AppError> {
        let token = match bearer {
            Some(token) if !token.trim().is_empty() => token.trim(),
            _ => {
                warn!("Token not provided");
                return Err(AppError::Unauthenticated);
            }
        };

        let claims = self.tokens.verify(token).map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            AppError::from(e)
        })?;

        // Checked again after decoding; verification and this check read the clock separately.
        if claims.is_expired() {
            warn!("Token has expired");
            return Err(AppError::Expired);
        }

        let user_id: i32 = claims.user_id.parse().map_err(|_| {
            warn!("Token carries a non-numeric user_id: {}", claims.user_id);
            AppError::InvalidToken("malformed user_id claim".into())
        })?;

        let user = match self.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(RepoError::NotFound { .. }) => {
                warn!("Token refers to missing user {}", user_id);
                return Err(AppError::InvalidToken("unknown user".into()));
            }
            Err(e) => {
                error!("unexpected error while resolving session: {}", e);
                return Err(AppError::ServerError(e.to_string()));
            }
        };

        if !user.active {
            warn!("User {} is deactivated", user.id);
            return Err(AppError::Deactivated);
        }
        Ok(user)
    }
}

use std::sync::Arc;

use log::{info, warn};
use tokio::task;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::{Subject, TokenIssuer};
use crate::auth::{AccessToken, RegisterRequest, TokenPair, TOKEN_TYPE};
use crate::error::AppError;
use crate::models::User;
use crate::repository::{Fields, UsersRepository};

/// Registration, login and token refresh.
#[derive(Clone)]
pub struct UsersService {
    repo: UsersRepository,
    tokens: Arc<TokenIssuer>,
}

impl UsersService {
    pub fn new(repo: UsersRepository, tokens: Arc<TokenIssuer>) -> Self {
        Self { repo, tokens }
    }

    /// Creates an account. The email is stored lower-case; a missing password is
    /// replaced by a random one before hashing.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        let RegisterRequest {
            name,
            email,
            password,
        } = request;

        let hashed = task::spawn_blocking(move || hash_password(password.as_deref())).await??;
        let email = email.map(|e| e.trim().to_lowercase());

        let fields = Fields::new()
            .set("name", name.trim())
            .set_opt("email", email)
            .set("password", hashed);

        let user = self.repo.create(fields).await?;
        info!("Registered user {} ({})", user.name, user.id);
        Ok(user)
    }

    /// Checks the credentials and opens a new session, replacing the stored
    /// refresh token so the previous one stops working.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self.repo.get_by_login(username).await?.ok_or_else(|| {
            warn!("Login attempt for unknown user '{}'", username.trim());
            AppError::NotFound("User not found".into())
        })?;

        let plain = password.to_string();
        let hashed = user.password.clone();
        let matches = task::spawn_blocking(move || verify_password(&plain, &hashed)).await??;
        if !matches {
            warn!("Wrong password for user {}", user.id);
            return Err(AppError::InvalidPassword);
        }

        let subject = Subject::from(&user);
        let access_token = self.tokens.issue_access(&subject)?;
        let refresh_token = self.tokens.issue_refresh(&subject)?;

        self.repo
            .update(&user, Fields::new().set("refresh_token", refresh_token.as_str()))
            .await?;
        info!("User {} logged in", user.id);

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Issues a fresh access token for whoever currently holds `refresh_token`.
    /// The refresh token itself must still be valid and unexpired.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AppError> {
        self.tokens.verify(refresh_token).map_err(|e| {
            warn!("Rejected refresh token: {}", e);
            AppError::from(e)
        })?;
        let user = self.repo.get_by_refresh_token(refresh_token).await?;
        let access_token = self.tokens.issue_access(&Subject::from(&user))?;
        Ok(AccessToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    pub async fn list(&self) -> Result<Vec<User>, AppError> {
        Ok(self.repo.get_all().await?)
    }
}

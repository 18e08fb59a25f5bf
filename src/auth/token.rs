//! JWT issuance and verification.
//!
//! The signing key, algorithm and access-token lifetime come from [`AuthConfig`]
//! once, when the [`TokenIssuer`] is built, and never change afterwards.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::models::User;

/// Lifetime of refresh tokens.
pub const REFRESH_TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,
    #[error("{0}")]
    Invalid(String),
    #[error("Failed to create token: {0}")]
    Encode(String),
}

/// Identity embedded into a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub user_id: String,
    pub name: String,
}

impl From<&User> for Subject {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.to_string(),
            name: user.name.clone(),
        }
    }
}

/// Represents the claims encoded within a JWT.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Identifier of the user the token was issued to.
    pub user_id: String,
    /// Display name of that user.
    pub name: String,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Issue timestamp (seconds since epoch).
    pub iat: i64,
    /// Unique token id; two tokens issued in the same second still differ.
    pub jti: String,
}

impl Claims {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    header: Header,
    validation: Validation,
    access_ttl: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret_key.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret_key.as_bytes()),
            header: Header::new(config.algorithm),
            validation,
            access_ttl: config.access_token_ttl,
        }
    }

    pub fn issue_access(&self, subject: &Subject) -> Result<String, TokenError> {
        self.issue_access_with_ttl(subject, self.access_ttl)
    }

    pub fn issue_access_with_ttl(&self, subject: &Subject, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: subject.user_id.clone(),
            name: subject.name.clone(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&self.header, &claims, &self.encoding_key).map_err(|e| {
            log::error!("Failed create token: {}", e);
            TokenError::Encode(e.to_string())
        })
    }

    pub fn issue_refresh(&self, subject: &Subject) -> Result<String, TokenError> {
        self.issue_access_with_ttl(subject, Duration::days(REFRESH_TOKEN_TTL_DAYS))
    }

    /// Verifies the signature and decodes the claims.
    ///
    /// Returns [`TokenError::Expired`] once `exp` is reached and
    /// [`TokenError::Invalid`] for anything structurally wrong.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e.to_string()),
            })?;

        // The library only rejects once `exp` is strictly in the past.
        if claims.is_expired() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

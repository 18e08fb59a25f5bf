pub mod extractors;
pub mod password;
pub mod session;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use password::MAX_PASSWORD_BYTES;

pub use extractors::CurrentUser;
pub use password::{hash_password, verify_password};
pub use session::SessionResolver;
pub use token::{Claims, Subject, TokenError, TokenIssuer};

pub const TOKEN_TYPE: &str = "bearer";

lazy_static! {
    // Names are also accepted as login, so they may not look like an email.
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_.-]+$").unwrap();
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired name for the new account.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Name must be alphanumeric, dots, underscores, or hyphens"
        )
    )]
    pub name: String,
    /// Optional email address, stored lower-case.
    #[validate(email)]
    pub email: Option<String>,
    /// Password for the new account. Left empty, a random one is generated.
    #[serde(default)]
    #[validate(custom = "validate_password_bytes")]
    pub password: Option<String>,
}

fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut err = ValidationError::new("password_too_long");
        err.message = Some(format!("must be at most {} bytes", MAX_PASSWORD_BYTES).into());
        return Err(err);
    }
    Ok(())
}

/// Form fields posted to the login endpoint. `username` may be a name or an email.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Response body after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Response body after a successful refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshQuery {
    pub refresh_token: Option<String>,
}

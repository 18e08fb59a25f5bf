use bcrypt::{hash, verify, DEFAULT_COST};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::AppError;

/// bcrypt only reads this many bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()";

/// Random 8 to 12 character password of letters, digits and symbols.
pub fn generate_password() -> String {
    let mut rng = rand::thread_rng();
    let length = rng.gen_range(8..=12);
    (0..length)
        .filter_map(|_| PASSWORD_ALPHABET.choose(&mut rng).map(|b| *b as char))
        .collect()
}

/// Hashes `password` with a fresh salt. An empty or absent password is replaced by
/// a generated one first, so the account exists but cannot be guessed.
/// Passwords longer than [`MAX_PASSWORD_BYTES`] are rejected.
pub fn hash_password(password: Option<&str>) -> Result<String, AppError> {
    let generated;
    let plain = match password {
        Some(p) if p.len() > MAX_PASSWORD_BYTES => {
            return Err(AppError::ValidationError(format!(
                "password: must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        Some(p) if !p.is_empty() => p,
        _ => {
            generated = generate_password();
            generated.as_str()
        }
    };

    hash(plain, DEFAULT_COST)
        .map_err(|e| AppError::ServerError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    // Could never have been hashed; bcrypt would compare only its prefix.
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    verify(password, hashed_password)
        .map_err(|e| AppError::ServerError(format!("Failed to verify password: {}", e)))
}

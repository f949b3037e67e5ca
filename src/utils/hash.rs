use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};

use crate::error::AppError;

const ARGON2_PREFIX: &str = "$argon2";

/// Checks a login attempt against the roster's password cell.
///
/// Cells holding an Argon2 PHC string are verified as hashes; anything else
/// is compared as plaintext after trimming both sides.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AppError> {
    let stored = stored.trim();
    if !stored.starts_with(ARGON2_PREFIX) {
        return Ok(!stored.is_empty() && password.trim() == stored);
    }

    let parsed_hash =
        PasswordHash::new(stored).map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let result = Argon2::default().verify_password(password.as_bytes(), &parsed_hash);

    match result {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}

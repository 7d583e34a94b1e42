use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Hex-encoded SHA-256 of the password. Same digest format as existing
/// `users.json` files, so accounts carry over.
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

pub fn verify_password(password: &str, digest: &str) -> bool {
    hash_password(password) == digest
}

/// Signup rejections, each with the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignupError {
    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Username must be at least {MIN_USERNAME_LEN} characters")]
    UsernameTooShort,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

/// Checks a signup against the credential collection. Rules are applied in a
/// fixed order and the first failure wins. Nothing is written here.
///
/// Returns the username to store: trimmed, matching how login looks it up.
pub fn validate_signup(
    req: &SignupRequest,
    is_taken: impl Fn(&str) -> bool,
) -> Result<String, SignupError> {
    let username = req.username.trim();

    if username.is_empty() || req.password.is_empty() {
        return Err(SignupError::MissingFields);
    }
    if is_taken(username) {
        return Err(SignupError::UsernameTaken);
    }
    if req.password != req.confirm_password {
        return Err(SignupError::PasswordMismatch);
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(SignupError::UsernameTooShort);
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(SignupError::PasswordTooShort);
    }

    Ok(username.to_string())
}

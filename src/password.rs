//! Password hashing and verification.
//!
//! Hashes are Argon2id PHC strings, so the salt and cost parameters travel with the
//! hash and can be raised later without touching stored records.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Hash a plaintext password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(PasswordError::Hashing)?;
    Ok(hash.to_string())
}

/// Check a plaintext password against a stored hash.
///
/// The comparison is constant-time inside `argon2`. A stored hash that cannot be parsed
/// is reported as `Hashing`, never as `Mismatch`.
pub fn verify_password(hash: &str, password: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(PasswordError::Hashing)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(()),
        Err(argon2::password_hash::Error::Password) => Err(PasswordError::Mismatch),
        Err(e) => Err(PasswordError::Hashing(e)),
    }
}

/// Run [`hash_password`] on the blocking pool.
pub async fn hash_password_blocking(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| PasswordError::TaskFailed)?
}

/// Run [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(hash: String, password: String) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|_| PasswordError::TaskFailed)?
}

/// Errors from password operations.
#[derive(Debug)]
pub enum PasswordError {
    /// The password does not match the hash
    Mismatch,
    /// Hashing failed or the stored hash is unreadable
    Hashing(argon2::password_hash::Error),
    /// The blocking task panicked or was cancelled
    TaskFailed,
}

impl std::fmt::Display for PasswordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PasswordError::Mismatch => write!(f, "Password does not match"),
            PasswordError::Hashing(e) => write!(f, "Password hashing failed: {}", e),
            PasswordError::TaskFailed => write!(f, "Password hashing task failed"),
        }
    }
}

impl std::error::Error for PasswordError {}

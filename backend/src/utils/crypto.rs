//! Password hashing helpers.
//!
//! Hashing is an explicit step the service performs before handing a record
//! to the repository; the repository never hashes on write. bcrypt runs on
//! the blocking pool so it never stalls the async workers.

use crate::errors::{ServiceError, ServiceResult};
use bcrypt::{hash, verify};
use std::sync::LazyLock;

/// bcrypt cost factor (10 salt rounds).
pub const PASSWORD_HASH_COST: u32 = 10;

/// Compared against when an account has no stored hash, so an unknown email
/// costs the same bcrypt round as a wrong password.
static PLACEHOLDER_HASH: LazyLock<String> =
    LazyLock::new(|| hash("placeholder-password", PASSWORD_HASH_COST).unwrap_or_default());

/// Hash a plain-text password for storage.
pub async fn hash_password(password: &str) -> ServiceResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || hash(password, PASSWORD_HASH_COST))
        .await
        .map_err(|e| ServiceError::internal_error(format!("Password hashing task failed: {e}")))?
        .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {e}")))
}

/// Verify a plain-text password against a stored hash.
///
/// With no stored hash the password is still checked against a placeholder
/// and the result is always `false`. A malformed stored hash is reported as
/// a mismatch so callers can keep a single "invalid email or password"
/// outcome.
pub async fn verify_password(password: &str, password_hash: Option<&str>) -> bool {
    let password = password.to_owned();
    let stored = password_hash.map(str::to_owned);

    let outcome = tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify(&password, &stored),
        None => verify(&password, &PLACEHOLDER_HASH).map(|_| false),
    })
    .await;

    match outcome {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            tracing::warn!("Stored password hash could not be verified: {}", e);
            false
        }
        Err(e) => {
            tracing::error!("Password verification task failed: {}", e);
            false
        }
    }
}

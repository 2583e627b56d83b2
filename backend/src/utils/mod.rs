//! Collection of general utility functions.
//!
//! This module serves as a repository for small, reusable helpers that do
//! not fit into other specific domain modules: token signing, password
//! hashing, cookie handling and random token generation.

pub mod cookies;
pub mod crypto;
pub mod generate_random_string;
pub mod jwt;

/// Canonical form of an email address: trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

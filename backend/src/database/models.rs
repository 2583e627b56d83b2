//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Note that these may differ from API-specific models:
//! `User` carries the password hash and verification token and is never
//! serialized; handlers expose `UserProfile` instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")] // Store as TEXT in SQLite
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Customer,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Customer => write!(f, "customer"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(UserRole::Customer),
            "admin" => Ok(UserRole::Admin),
            _ => Err(format!("Invalid user role: {}", s)),
        }
    }
}

/// A line in the customer's embedded cart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub image: String,
    #[sqlx(json)]
    pub cart_items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert DTO for the `users` table.
///
/// Built through `with_password` or `federated` so a row always has a
/// password hash or a Google id.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub image: String,
}

impl CreateUser {
    /// A local account awaiting email verification. `password_hash` must already be hashed.
    pub fn with_password(
        name: String,
        email: String,
        password_hash: String,
        verification_token: String,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name,
            email,
            password_hash: Some(password_hash),
            google_id: None,
            role: UserRole::Customer,
            is_verified: false,
            verification_token: Some(verification_token),
            image: String::new(),
        }
    }

    /// An account created from a Google profile. Google has already verified the email.
    pub fn federated(name: String, email: String, google_id: String, image: String) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            name,
            email,
            password_hash: None,
            google_id: Some(google_id),
            role: UserRole::Customer,
            is_verified: true,
            verification_token: None,
            image,
        }
    }
}

/// User record with credentials stripped, safe to return to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_verified: bool,
    pub image: String,
    pub google_linked: bool,
    pub cart_items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_verified: user.is_verified,
            image: user.image.clone(),
            google_linked: user.google_id.is_some(),
            cart_items: user.cart_items.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl UserProfile {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

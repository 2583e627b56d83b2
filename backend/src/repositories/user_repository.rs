//! Database repository for user management operations.
//!
//! `UserStore` is the credential store consulted by every auth flow;
//! `UserRepository` is its SQLite implementation.

use crate::database::models::{CreateUser, User};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::types::Json;

/// Persistence operations the auth flows need from the user store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails on a duplicate email or Google id.
    async fn create_user(&self, user: CreateUser) -> Result<User>;

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>>;

    /// Looks up a user by an already-normalized email.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Marks the owner of `token` verified and clears the token in one step.
    ///
    /// Returns `None` when no user holds the token, so a second call with the
    /// same token never succeeds.
    async fn consume_verification_token(&self, token: &str) -> Result<Option<User>>;

    /// Writes back the mutable fields of `user` and bumps `updated_at`.
    async fn update_user(&self, user: &User) -> Result<User>;

    async fn list_users(&self, limit: u64, offset: u64) -> Result<Vec<User>>;

    async fn count_users(&self) -> Result<u64>;
}

const USER_COLUMNS: &str = "id, name, email, password_hash, google_id, role, is_verified, \
     verification_token, image, cart_items, created_at, updated_at";

/// Repository for user database operations.
#[derive(Clone)]
pub struct UserRepository {
    /// Shared SQLite connection pool
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository instance.
    ///
    /// # Arguments
    /// * `pool` - SQLite connection pool (cloning a pool is cheap)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// True when `error` is the unique-index violation on `users.email`.
///
/// Other unique columns (`google_id`, `verification_token`) do not match.
pub fn is_duplicate_email(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .is_some_and(|db| db.is_unique_violation() && db.message().contains("users.email"))
}

#[async_trait]
impl UserStore for UserRepository {
    async fn create_user(&self, user: CreateUser) -> Result<User> {
        let now = Utc::now();
        let query = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, google_id, role, is_verified,
                               verification_token, image, cart_items, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', ?, ?)
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .bind(user.role)
            .bind(user.is_verified)
            .bind(&user.verification_token)
            .bind(&user.image)
            .bind(now)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn consume_verification_token(&self, token: &str) -> Result<Option<User>> {
        let query = format!(
            r#"
            UPDATE users
            SET is_verified = 1, verification_token = NULL, updated_at = ?
            WHERE verification_token = ?
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(Utc::now())
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let query = format!(
            r#"
            UPDATE users
            SET name = ?, email = ?, password_hash = ?, google_id = ?, role = ?,
                is_verified = ?, verification_token = ?, image = ?, cart_items = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING {USER_COLUMNS}
            "#
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .bind(user.role)
            .bind(user.is_verified)
            .bind(&user.verification_token)
            .bind(&user.image)
            .bind(Json(&user.cart_items))
            .bind(Utc::now())
            .bind(&user.id)
            .fetch_one(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(&self, limit: u64, offset: u64) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        let users = sqlx::query_as::<_, User>(&query)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    async fn count_users(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}

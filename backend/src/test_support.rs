//! Shared fixtures for unit and HTTP tests.

use crate::config::{Config, SessionStoreKind};
use crate::database::migrate;
use crate::database::models::{CreateUser, User, UserRole};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::session_repository::SqlSessionCache;
use crate::repositories::user_repository::{UserRepository, UserStore};
use crate::services::email_service::Mailer;
use crate::services::session_cache::{MokaSessionCache, SessionCache};
use crate::state::AppState;
use crate::utils::crypto::hash_password;
use crate::utils::jwt::TokenIssuer;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Fresh in-memory database with migrations applied.
///
/// A single connection keeps every query on the same in-memory database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    migrate(&pool).await.expect("migrations");
    pool
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".into(),
        max_connections: 1,
        acquire_timeout_seconds: 3,
        access_token_secret: "test-access-secret".into(),
        refresh_token_secret: "test-refresh-secret".into(),
        server_port: 0,
        client_url: "http://localhost:5173".into(),
        production: false,
        session_store: SessionStoreKind::Memory,
        email: None,
        google: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub email: String,
    pub name: String,
    pub token: String,
}

/// Mailer that records every verification email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
    fail_next: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_verification_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        verification_token: &str,
    ) -> ServiceResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::external_service("Failed to send email"));
        }
        self.sent.lock().unwrap().push(SentMail {
            email: recipient_email.to_string(),
            name: recipient_name.to_string(),
            token: verification_token.to_string(),
        });
        Ok(())
    }
}

/// Session cache whose backend is always unreachable.
pub struct UnavailableSessionCache;

#[async_trait]
impl SessionCache for UnavailableSessionCache {
    async fn put(&self, _user_id: &str, _refresh_token: &str) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }

    async fn get(&self, _user_id: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("connection refused")
    }

    async fn delete(&self, _user_id: &str) -> anyhow::Result<()> {
        anyhow::bail!("connection refused")
    }
}

/// Application state wired to in-memory collaborators.
pub struct TestContext {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::build(memory_pool().await, Arc::new(MokaSessionCache::new()))
    }

    /// Sessions live in the `session_tokens` table of the users database.
    pub async fn with_database_sessions() -> Self {
        let pool = memory_pool().await;
        Self::build(pool.clone(), Arc::new(SqlSessionCache::new(pool)))
    }

    pub async fn with_failing_sessions() -> Self {
        Self::build(memory_pool().await, Arc::new(UnavailableSessionCache))
    }

    fn build(pool: SqlitePool, sessions: Arc<dyn SessionCache>) -> Self {
        let config = test_config();
        let tokens =
            TokenIssuer::new(&config.access_token_secret, &config.refresh_token_secret).unwrap();
        let mailer = Arc::new(RecordingMailer::default());

        let state = AppState {
            config: Arc::new(config),
            users: Arc::new(UserRepository::new(pool)),
            sessions,
            mailer: mailer.clone(),
            tokens: Arc::new(tokens),
            oauth: None,
        };

        Self { state, mailer }
    }
}

/// Inserts a verified password account.
pub async fn verified_user(ctx: &TestContext, email: &str, password: &str) -> User {
    let user = unverified_user(ctx, email, password, &format!("token-{email}")).await;
    ctx.state
        .users
        .consume_verification_token(&format!("token-{email}"))
        .await
        .unwrap()
        .unwrap_or(user)
}

/// Inserts a password account still waiting on `token`.
pub async fn unverified_user(ctx: &TestContext, email: &str, password: &str, token: &str) -> User {
    ctx.state
        .users
        .create_user(CreateUser::with_password(
            "Ann".into(),
            email.into(),
            hash_password(password).await.unwrap(),
            token.into(),
        ))
        .await
        .unwrap()
}

/// Inserts a verified admin account.
pub async fn admin_user(ctx: &TestContext, email: &str, password: &str) -> User {
    let mut user = verified_user(ctx, email, password).await;
    user.role = UserRole::Admin;
    ctx.state.users.update_user(&user).await.unwrap()
}

//! Shared application state.
//!
//! Every collaborator the auth flows depend on is injected here as a trait
//! object, so tests can swap the SQLite store, moka cache, SMTP mailer or
//! Google client for in-memory stand-ins.

use crate::auth::oauth::{GoogleOAuthClient, OAuthProvider};
use crate::config::{Config, SessionStoreKind};
use crate::database::Database;
use crate::repositories::session_repository::SqlSessionCache;
use crate::repositories::user_repository::{UserRepository, UserStore};
use crate::services::email_service::{EmailService, LogMailer, Mailer};
use crate::services::session_cache::{MokaSessionCache, SessionCache};
use crate::utils::jwt::TokenIssuer;
use anyhow::{Context, Result};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionCache>,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: Arc<TokenIssuer>,
    pub oauth: Option<Arc<dyn OAuthProvider>>,
}

impl AppState {
    /// Wires the production collaborators from configuration.
    pub fn from_config(config: Config, db: &Database) -> Result<Self> {
        let tokens = TokenIssuer::new(&config.access_token_secret, &config.refresh_token_secret)
            .context("failed to initialise token issuer")?;

        let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(db.pool().clone()));

        let sessions: Arc<dyn SessionCache> = match config.session_store {
            SessionStoreKind::Memory => Arc::new(MokaSessionCache::new()),
            SessionStoreKind::Database => Arc::new(SqlSessionCache::new(db.pool().clone())),
        };

        let mailer: Arc<dyn Mailer> = match config.email_config() {
            Some(email_config) => match EmailService::new(email_config) {
                Ok(service) => {
                    tracing::info!("Email service initialized successfully");
                    Arc::new(service)
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to initialize email service: {}. Verification links will only be logged.",
                        e
                    );
                    Arc::new(LogMailer::new(config.client_url.clone()))
                }
            },
            None => {
                tracing::warn!(
                    "Email configuration not found. Verification links will only be logged."
                );
                Arc::new(LogMailer::new(config.client_url.clone()))
            }
        };

        let oauth = config.google.clone().map(|google| {
            tracing::info!("Google sign-in enabled");
            Arc::new(GoogleOAuthClient::new(google)) as Arc<dyn OAuthProvider>
        });

        Ok(Self {
            config: Arc::new(config),
            users,
            sessions,
            mailer,
            tokens: Arc::new(tokens),
            oauth,
        })
    }
}

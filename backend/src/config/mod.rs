//! Central module for application-wide configuration settings.
//!
//! This module handles loading and managing configuration parameters such as
//! the database URL, server port, token secrets, and the optional SMTP and
//! Google OAuth credential groups.

use anyhow::{Context, Result, bail};
use std::env;

/// Backing store used for the refresh-token session cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStoreKind {
    /// In-process moka cache.
    Memory,
    /// `session_tokens` table in the primary database.
    Database,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    pub access_token_secret: String,
    pub refresh_token_secret: String,
    pub server_port: u16,
    pub client_url: String,
    pub production: bool,
    pub session_store: SessionStoreKind,
    pub email: Option<EmailConfig>,
    pub google: Option<GoogleOAuthConfig>,
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
    /// Frontend origin used when building verification links.
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DB_MAX_CONNECTIONS must be a valid number")?;

        let acquire_timeout_seconds = env::var("DB_ACQUIRE_TIMEOUT_SECONDS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<u64>()
            .context("DB_ACQUIRE_TIMEOUT_SECONDS must be a valid number")?;

        let access_token_secret =
            env::var("ACCESS_TOKEN_SECRET").context("ACCESS_TOKEN_SECRET not set")?;
        let refresh_token_secret =
            env::var("REFRESH_TOKEN_SECRET").context("REFRESH_TOKEN_SECRET not set")?;

        if access_token_secret.is_empty() || refresh_token_secret.is_empty() {
            bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must not be empty");
        }
        if access_token_secret == refresh_token_secret {
            bail!("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ");
        }

        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .context("SERVER_PORT must be a valid number")?;

        let client_url = env::var("CLIENT_URL")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .trim_end_matches('/')
            .to_string();

        let production = env::var("APP_ENV")
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let session_store = match env::var("SESSION_STORE")
            .unwrap_or_else(|_| "memory".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => SessionStoreKind::Memory,
            "database" => SessionStoreKind::Database,
            other => bail!("SESSION_STORE must be 'memory' or 'database', got '{other}'"),
        };

        let email = Self::email_from_env(&client_url)?;
        let google = Self::google_from_env();

        Ok(Config {
            database_url,
            max_connections,
            acquire_timeout_seconds,
            access_token_secret,
            refresh_token_secret,
            server_port,
            client_url,
            production,
            session_store,
            email,
            google,
        })
    }

    /// Returns the SMTP configuration if one was provided.
    pub fn email_config(&self) -> Option<EmailConfig> {
        self.email.clone()
    }

    /// Cookies are only marked `Secure` in production.
    pub fn secure_cookies(&self) -> bool {
        self.production
    }

    /// The SMTP group is optional, but once `SMTP_HOST` is present the rest must be too.
    fn email_from_env(client_url: &str) -> Result<Option<EmailConfig>> {
        let Ok(smtp_host) = env::var("SMTP_HOST") else {
            return Ok(None);
        };

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .context("SMTP_PORT must be a valid number")?;

        Ok(Some(EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username: env::var("SMTP_USERNAME").context("SMTP_USERNAME not set")?,
            smtp_password: env::var("SMTP_PASSWORD").context("SMTP_PASSWORD not set")?,
            from_email: env::var("FROM_EMAIL").context("FROM_EMAIL not set")?,
            from_name: env::var("FROM_NAME").unwrap_or_else(|_| "Store".to_string()),
            base_url: client_url.to_string(),
        }))
    }

    fn google_from_env() -> Option<GoogleOAuthConfig> {
        let client_id = env::var("GOOGLE_CLIENT_ID").ok()?;
        let client_secret = env::var("GOOGLE_CLIENT_SECRET").ok()?;
        let callback_url = env::var("GOOGLE_CALLBACK_URL").unwrap_or_else(|_| {
            "http://localhost:5000/api/auth/google/callback".to_string()
        });

        Some(GoogleOAuthConfig {
            client_id,
            client_secret,
            callback_url,
        })
    }
}

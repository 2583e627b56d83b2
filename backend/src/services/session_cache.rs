//! Session cache holding the single valid refresh token per user.
//!
//! The cache is the source of truth for "the current session": a refresh
//! token is only honoured while it is byte-equal to the value stored under
//! its user's key. Every write overwrites, so issuing a new session
//! implicitly revokes the previous one.

use anyhow::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::time::Duration;

use crate::utils::jwt::REFRESH_TOKEN_TTL_SECONDS;

/// Entries expire together with the refresh token they hold.
pub const SESSION_TTL: Duration = Duration::from_secs(REFRESH_TOKEN_TTL_SECONDS as u64);

/// Namespaced cache key for a user's refresh token.
pub fn refresh_token_key(user_id: &str) -> String {
    format!("refresh_token:{user_id}")
}

/// Key-value store for the current refresh token of each user.
///
/// Errors mean the store is unreachable; callers must fail rather than
/// treat them as "no session".
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Stores `refresh_token` for `user_id`, replacing any previous value, with a 7-day TTL.
    async fn put(&self, user_id: &str, refresh_token: &str) -> Result<()>;

    /// Returns the current refresh token for `user_id`, if any.
    async fn get(&self, user_id: &str) -> Result<Option<String>>;

    /// Removes the entry for `user_id`. Removing a missing entry is not an error.
    async fn delete(&self, user_id: &str) -> Result<()>;
}

/// In-process session cache backed by moka.
#[derive(Clone)]
pub struct MokaSessionCache {
    entries: Cache<String, String>,
}

impl MokaSessionCache {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    /// Entries leave only by TTL or `delete`. The cache has no size bound, so
    /// a stored session is never refused admission or evicted for space.
    pub fn with_ttl(ttl: Duration) -> Self {
        let entries = Cache::builder().time_to_live(ttl).build();
        Self { entries }
    }
}

impl Default for MokaSessionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionCache for MokaSessionCache {
    async fn put(&self, user_id: &str, refresh_token: &str) -> Result<()> {
        self.entries
            .insert(refresh_token_key(user_id), refresh_token.to_string())
            .await;
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<String>> {
        Ok(self.entries.get(&refresh_token_key(user_id)).await)
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        self.entries.invalidate(&refresh_token_key(user_id)).await;
        Ok(())
    }
}

//! Database-backed session cache.
//!
//! Shares refresh-token state between processes through the
//! `session_tokens` table. Each row is one cache entry; expired rows are
//! ignored on read and overwritten on the next write.

use crate::services::session_cache::{SESSION_TTL, SessionCache, refresh_token_key};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SqlSessionCache {
    pool: SqlitePool,
    ttl: Duration,
}

impl SqlSessionCache {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            ttl: Duration::seconds(SESSION_TTL.as_secs() as i64),
        }
    }

    #[cfg(test)]
    fn with_ttl(pool: SqlitePool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl SessionCache for SqlSessionCache {
    async fn put(&self, user_id: &str, refresh_token: &str) -> Result<()> {
        let expires_at = Utc::now() + self.ttl;
        sqlx::query(
            r#"
            INSERT INTO session_tokens (cache_key, token, expires_at)
            VALUES (?, ?, ?)
            ON CONFLICT (cache_key) DO UPDATE SET
                token = excluded.token,
                expires_at = excluded.expires_at
            "#,
        )
        .bind(refresh_token_key(user_id))
        .bind(refresh_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<String>> {
        let row: Option<(String, DateTime<Utc>)> =
            sqlx::query_as("SELECT token, expires_at FROM session_tokens WHERE cache_key = ?")
                .bind(refresh_token_key(user_id))
                .fetch_optional(&self.pool)
                .await?;

        Ok(row
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(token, _)| token))
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM session_tokens WHERE cache_key = ?")
            .bind(refresh_token_key(user_id))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_pool;

    #[tokio::test]
    async fn last_write_wins() {
        let cache = SqlSessionCache::new(memory_pool().await);
        cache.put("u1", "first").await.unwrap();
        cache.put("u1", "second").await.unwrap();

        assert_eq!(cache.get("u1").await.unwrap().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let cache = SqlSessionCache::new(memory_pool().await);
        cache.put("u1", "token").await.unwrap();
        cache.delete("u1").await.unwrap();
        cache.delete("u1").await.unwrap();

        assert_eq!(cache.get("u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_rows_read_as_absent() {
        let cache = SqlSessionCache::with_ttl(memory_pool().await, Duration::seconds(-1));
        cache.put("u1", "token").await.unwrap();

        assert_eq!(cache.get("u1").await.unwrap(), None);
    }
}

//! Typed cache client over a Redis connection manager.
//!
//! The connection manager multiplexes one TCP connection and reconnects
//! transparently, so the client is cheap to clone and safe for concurrent
//! calls from any number of request handlers.

use crate::error::CacheError;
use crate::keys;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

/// Typed facade over the key-value store.
#[derive(Clone)]
pub struct CacheClient {
    manager: ConnectionManager,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient").finish_non_exhaustive()
    }
}

impl CacheClient {
    /// Connect to Redis at the given URL.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Unavailable` if the initial connection fails.
    pub async fn connect(redis_url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;

        tracing::info!("Cache client connected");
        Ok(Self { manager })
    }

    /// Wrap an existing connection manager (tests, shared setups).
    #[must_use]
    pub fn from_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }

    /// Set a key with a TTL, overwriting any prior value.
    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    /// Get a key's value, if present.
    pub async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Delete a key. Deleting an absent key is not an error.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    /// Atomically increment a counter, applying the window TTL when the
    /// post-increment value is 1 (i.e. this call opened the window).
    ///
    /// Returns the post-increment value.
    pub async fn increment_with_ttl(
        &self,
        key: &str,
        window: Duration,
    ) -> Result<i64, CacheError> {
        let mut conn = self.manager.clone();
        let count: i64 = conn.incr(key, 1).await?;
        if count == 1 {
            conn.expire::<_, ()>(key, window.as_secs() as i64).await?;
        }
        Ok(count)
    }

    /// Blacklist an access-token jti for the given remaining lifetime.
    pub async fn blacklist_jti(&self, jti: &str, ttl: Duration) -> Result<(), CacheError> {
        self.set_with_ttl(&keys::blacklist(jti), r#"{"reason":"logout"}"#, ttl)
            .await
    }

    /// Check whether a jti has been blacklisted.
    pub async fn is_jti_blacklisted(&self, jti: &str) -> Result<bool, CacheError> {
        Ok(self.get(&keys::blacklist(jti)).await?.is_some())
    }

    /// Claim an idempotency key for 24 hours.
    ///
    /// Returns `true` when this call claimed the key, `false` when a prior
    /// request already holds it within the window (a replay).
    pub async fn try_claim_idempotency(
        &self,
        tenant_id: &str,
        key: &str,
    ) -> Result<bool, CacheError> {
        let mut conn = self.manager.clone();
        let claimed: Option<String> = redis::cmd("SET")
            .arg(keys::idempotency(tenant_id, key))
            .arg("1")
            .arg("NX")
            .arg("EX")
            .arg(keys::IDEMPOTENCY_TTL.as_secs())
            .query_async(&mut conn)
            .await?;

        // SET NX replies OK on insert and Nil when the key already exists.
        Ok(claimed.is_some())
    }
}

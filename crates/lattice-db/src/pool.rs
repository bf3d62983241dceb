//! Connection pool management for `PostgreSQL`.
//!
//! Provides a configurable connection pool using `SQLx`'s `PgPool`. The pool
//! is a fixed-size set of live connections: acquisition blocks (up to the
//! acquire timeout) when every connection is checked out, and each connection
//! is liveness-checked before it is handed out so a dead connection is
//! replaced rather than returned to a caller. The pooled connection handle
//! releases itself on drop on every exit path, including panics.

use crate::error::DbError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// A wrapper around `SQLx`'s `PostgreSQL` connection pool.
///
/// # Example
///
/// ```rust,ignore
/// use lattice_db::DbPool;
///
/// #[tokio::main]
/// async fn main() -> Result<(), lattice_db::DbError> {
///     let pool = DbPool::connect("postgres://localhost/lattice").await?;
///     // Use pool for queries...
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct DbPool {
    inner: PgPool,
}

impl DbPool {
    /// Connect to `PostgreSQL` using the provided database URL.
    ///
    /// Uses default pool options (min: 1, max: 10, timeout: 5s).
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if the connection cannot be established.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        Self::connect_with_options(database_url, DbPoolOptions::default()).await
    }

    /// Connect to `PostgreSQL` with custom pool options.
    ///
    /// # Errors
    ///
    /// Returns `DbError::ConnectionFailed` if the connection cannot be established.
    pub async fn connect_with_options(
        database_url: &str,
        options: DbPoolOptions,
    ) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .min_connections(options.min_connections)
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            // A connection that died while idle is discarded and replaced
            // before acquire returns it.
            .test_before_acquire(true)
            .connect(database_url)
            .await
            .map_err(DbError::ConnectionFailed)?;

        Ok(Self { inner: pool })
    }

    /// Wrap an existing `SQLx` `PgPool`.
    ///
    /// Useful when the pool is already created externally (e.g., in tests).
    #[must_use]
    pub fn from_raw(pool: PgPool) -> Self {
        Self { inner: pool }
    }

    /// Get a reference to the inner `SQLx` pool.
    ///
    /// This allows direct access to `SQLx`'s `PgPool` for model queries.
    #[must_use]
    pub fn inner(&self) -> &PgPool {
        &self.inner
    }

    /// Begin a new database transaction.
    ///
    /// The transaction rolls back on drop unless explicitly committed, so an
    /// early return or a call whose deadline elapsed never leaves a
    /// half-applied write behind.
    ///
    /// # Errors
    ///
    /// Returns `DbError::PoolClosed` after shutdown, or
    /// `DbError::ConnectionUnavailable` when no live connection can be
    /// produced within the acquire timeout.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, DbError> {
        self.inner.begin().await.map_err(DbError::from_acquire)
    }

    /// Acquire a connection from the pool.
    ///
    /// Blocks (asynchronously) while the pool is empty. The returned handle
    /// is scoped: dropping it returns the connection to the pool on every
    /// exit path.
    ///
    /// # Errors
    ///
    /// Returns `DbError::PoolClosed` after shutdown, or
    /// `DbError::ConnectionUnavailable` when a replacement connection cannot
    /// be opened within the acquire timeout.
    pub async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, DbError> {
        self.inner.acquire().await.map_err(DbError::from_acquire)
    }

    /// Close all connections in the pool.
    ///
    /// Drains the pool, wakes blocked acquirers with a terminal failure, and
    /// refuses further acquisitions.
    pub async fn close(&self) {
        self.inner.close().await;
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Configuration options for the database connection pool.
///
/// # Example
///
/// ```rust
/// use lattice_db::DbPoolOptions;
/// use std::time::Duration;
///
/// let options = DbPoolOptions {
///     min_connections: 2,
///     max_connections: 50,
///     acquire_timeout: Duration::from_secs(30),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct DbPoolOptions {
    /// Minimum number of connections to maintain in the pool.
    ///
    /// Default: 1
    pub min_connections: u32,

    /// Maximum number of connections allowed in the pool.
    ///
    /// Default: 10
    pub max_connections: u32,

    /// Maximum time to wait when acquiring a connection.
    ///
    /// Default: 5 seconds
    pub acquire_timeout: Duration,
}

impl Default for DbPoolOptions {
    fn default() -> Self {
        Self {
            min_connections: 1,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_options() {
        let options = DbPoolOptions::default();
        assert_eq!(options.min_connections, 1);
        assert_eq!(options.max_connections, 10);
        assert_eq!(options.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_custom_pool_options() {
        let options = DbPoolOptions {
            min_connections: 5,
            max_connections: 100,
            acquire_timeout: Duration::from_secs(30),
        };
        assert_eq!(options.min_connections, 5);
        assert_eq!(options.max_connections, 100);
        assert_eq!(options.acquire_timeout, Duration::from_secs(30));
    }
}

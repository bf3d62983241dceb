//! Error types for the lattice-db crate.
//!
//! Provides a unified error type that wraps `SQLx` errors with additional context.

use thiserror::Error;

/// Database operation errors.
///
/// This enum wraps all possible database errors with clear, actionable messages.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish a database connection.
    ///
    /// This typically indicates network issues, invalid credentials,
    /// or the database server being unavailable.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// The pool has been shut down; no further acquisitions are served.
    #[error("Connection pool is closed")]
    PoolClosed,

    /// No live connection could be produced within the acquire timeout.
    #[error("No database connection available: {0}")]
    ConnectionUnavailable(#[source] sqlx::Error),

    /// A database migration failed to apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    /// A database query failed to execute.
    ///
    /// This can indicate SQL syntax errors, constraint violations,
    /// or issues with the query parameters.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl DbError {
    /// Classify an acquire-path sqlx error into the pool taxonomy.
    ///
    /// `sqlx::Error::PoolClosed` maps to [`DbError::PoolClosed`]; timeouts and
    /// connect failures map to [`DbError::ConnectionUnavailable`].
    #[must_use]
    pub fn from_acquire(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolClosed => DbError::PoolClosed,
            e @ (sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::Tls(_)) => {
                DbError::ConnectionUnavailable(e)
            }
            e => DbError::ConnectionFailed(e),
        }
    }

    /// Check if this error indicates a connection problem.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            DbError::ConnectionFailed(_) | DbError::ConnectionUnavailable(_)
        )
    }

    /// Check if this error indicates the pool was closed.
    #[must_use]
    pub fn is_pool_closed(&self) -> bool {
        matches!(self, DbError::PoolClosed)
    }

    /// Check if this error indicates a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound("row not found".to_string()),
            sqlx::Error::PoolClosed => DbError::PoolClosed,
            e => DbError::QueryFailed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_closed_display() {
        let err = DbError::PoolClosed;
        assert_eq!(err.to_string(), "Connection pool is closed");
        assert!(err.is_pool_closed());
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_from_acquire_pool_closed() {
        let err = DbError::from_acquire(sqlx::Error::PoolClosed);
        assert!(matches!(err, DbError::PoolClosed));
    }

    #[test]
    fn test_from_acquire_timeout_is_unavailable() {
        let err = DbError::from_acquire(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, DbError::ConnectionUnavailable(_)));
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }
}

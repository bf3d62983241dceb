//! Error types for the lattice-cache crate.

use thiserror::Error;

/// Cache operation errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache could not be reached or the command failed in transit.
    #[error("Cache unavailable: {0}")]
    Unavailable(#[source] redis::RedisError),

    /// The cache returned a value the caller could not interpret.
    #[error("Unexpected cache value for key '{key}'")]
    UnexpectedValue {
        /// The key whose value failed to parse
        key: String,
    },
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Unavailable(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_value_display() {
        let err = CacheError::UnexpectedValue {
            key: "otp:rate:u@x.io".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unexpected cache value for key 'otp:rate:u@x.io'"
        );
    }
}

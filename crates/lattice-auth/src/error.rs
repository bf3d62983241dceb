//! Error types for authentication primitives.

use thiserror::Error;

/// Errors from JWT, password hashing, and TOTP operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The signing or verification key could not be parsed.
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The token is malformed or failed validation.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token's signature did not verify.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The token uses an algorithm other than RS256.
    #[error("Invalid algorithm")]
    InvalidAlgorithm,

    /// A required claim is missing.
    #[error("Missing claim: {0}")]
    MissingClaim(String),

    /// Password hashing failed.
    #[error("Hashing failed: {0}")]
    HashingFailed(String),

    /// TOTP secret or code handling failed.
    #[error("TOTP error: {0}")]
    Totp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AuthError::TokenExpired.to_string(), "Token expired");
        assert_eq!(
            AuthError::MissingClaim("jti".to_string()).to_string(),
            "Missing claim: jti"
        );
    }
}

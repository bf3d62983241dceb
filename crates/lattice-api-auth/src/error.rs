//! Error types for the authentication API.
//!
//! Uses RFC 7807 Problem Details for structured error responses. The
//! `status_code()` mapping carries the platform status taxonomy:
//! bad input 400, missing/invalid credential 401, denied 403, TOTP
//! precondition 412, not found 404, rate limited 429, idempotency replay
//! 409, everything unexpected 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base URL for error type URIs.
const ERROR_BASE_URL: &str = "https://lattice.dev/errors";

/// RFC 7807 Problem Details structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI identifying the problem type.
    #[serde(rename = "type")]
    pub error_type: String,

    /// Short human-readable summary.
    pub title: String,

    /// HTTP status code.
    pub status: u16,

    /// Human-readable explanation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ProblemDetails {
    /// Create a new `ProblemDetails` instance.
    #[must_use]
    pub fn new(error_type: &str, title: &str, status: StatusCode) -> Self {
        Self {
            error_type: format!("{ERROR_BASE_URL}/{error_type}"),
            title: title.to_string(),
            status: status.as_u16(),
            detail: None,
        }
    }

    /// Add detail message.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Authentication API errors.
#[derive(Debug, Error)]
pub enum ApiAuthError {
    /// Invalid credentials. The message is identical for unknown email and
    /// wrong password to prevent account enumeration.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The account authenticates only via a federated provider. Not an
    /// enumeration oracle: this is never a response to a password guess on a
    /// password-bearing account.
    #[error("This account uses OAuth authentication only. Please login with your OAuth provider.")]
    OAuthOnlyAccount,

    /// The account has a TOTP second factor and no code was supplied.
    #[error("TOTP code required")]
    TotpRequired,

    /// The supplied TOTP code (and every unused backup code) failed.
    #[error("Invalid TOTP code")]
    InvalidTotpCode,

    /// Structurally invalid input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing, expired, or unverifiable credential.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Refresh-token reuse: evidence of theft. All sessions are revoked.
    #[error("Token reuse detected. All sessions revoked.")]
    TokenReuseDetected,

    /// Authenticated but not allowed.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Target row absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Per-actor limit exhausted.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Idempotency replay within the 24 h window.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// TOTP is not enrolled for this account.
    #[error("TOTP not enrolled")]
    TotpNotEnrolled,

    /// Internal failure.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database error (pool wrapper).
    #[error("Database error: {0}")]
    DatabaseInternal(#[from] lattice_db::DbError),

    /// Cache error.
    #[error("Cache error: {0}")]
    Cache(#[from] lattice_cache::CacheError),
}

impl ApiAuthError {
    /// Convert to `ProblemDetails`.
    #[must_use]
    pub fn to_problem_details(&self) -> ProblemDetails {
        match self {
            ApiAuthError::InvalidCredentials => ProblemDetails::new(
                "invalid-credentials",
                "Invalid Credentials",
                StatusCode::UNAUTHORIZED,
            )
            .with_detail("Invalid credentials"),
            ApiAuthError::OAuthOnlyAccount => ProblemDetails::new(
                "oauth-only-account",
                "OAuth-Only Account",
                StatusCode::UNAUTHORIZED,
            )
            .with_detail(self.to_string()),
            ApiAuthError::TotpRequired => ProblemDetails::new(
                "totp-required",
                "TOTP Code Required",
                StatusCode::PRECONDITION_FAILED,
            )
            .with_detail("TOTP code required"),
            ApiAuthError::InvalidTotpCode => ProblemDetails::new(
                "invalid-totp-code",
                "Invalid TOTP Code",
                StatusCode::UNAUTHORIZED,
            )
            .with_detail("Invalid TOTP code"),
            ApiAuthError::InvalidArgument(msg) => ProblemDetails::new(
                "invalid-argument",
                "Invalid Argument",
                StatusCode::BAD_REQUEST,
            )
            .with_detail(msg.clone()),
            ApiAuthError::Unauthenticated => ProblemDetails::new(
                "unauthenticated",
                "Unauthenticated",
                StatusCode::UNAUTHORIZED,
            )
            .with_detail("Authentication required."),
            ApiAuthError::TokenReuseDetected => ProblemDetails::new(
                "token-reuse-detected",
                "Token Reuse Detected",
                StatusCode::FORBIDDEN,
            )
            .with_detail("Token reuse detected. All sessions revoked. Please login again."),
            ApiAuthError::PermissionDenied(reason) => ProblemDetails::new(
                "permission-denied",
                "Permission Denied",
                StatusCode::FORBIDDEN,
            )
            .with_detail(reason.clone()),
            ApiAuthError::NotFound(what) => {
                ProblemDetails::new("not-found", "Not Found", StatusCode::NOT_FOUND)
                    .with_detail(format!("{what} not found"))
            }
            ApiAuthError::RateLimited => ProblemDetails::new(
                "rate-limited",
                "Rate Limit Exceeded",
                StatusCode::TOO_MANY_REQUESTS,
            )
            .with_detail("Too many requests. Please try again later."),
            ApiAuthError::AlreadyExists(what) => ProblemDetails::new(
                "already-exists",
                "Already Exists",
                StatusCode::CONFLICT,
            )
            .with_detail(what.clone()),
            ApiAuthError::TotpNotEnrolled => ProblemDetails::new(
                "totp-not-enrolled",
                "TOTP Not Enrolled",
                StatusCode::BAD_REQUEST,
            )
            .with_detail("TOTP is not enrolled for this account."),
            ApiAuthError::Internal(msg) => ProblemDetails::new(
                "internal-error",
                "Internal Server Error",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .with_detail(msg.clone()),
            ApiAuthError::Database(err) => ProblemDetails::new(
                "database-error",
                "Database Error",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .with_detail(err.to_string()),
            ApiAuthError::DatabaseInternal(err) => ProblemDetails::new(
                "database-error",
                "Database Error",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .with_detail(err.to_string()),
            ApiAuthError::Cache(err) => ProblemDetails::new(
                "cache-error",
                "Cache Error",
                StatusCode::INTERNAL_SERVER_ERROR,
            )
            .with_detail(err.to_string()),
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiAuthError::InvalidCredentials
            | ApiAuthError::OAuthOnlyAccount
            | ApiAuthError::InvalidTotpCode
            | ApiAuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiAuthError::TotpRequired => StatusCode::PRECONDITION_FAILED,
            ApiAuthError::InvalidArgument(_) | ApiAuthError::TotpNotEnrolled => {
                StatusCode::BAD_REQUEST
            }
            ApiAuthError::TokenReuseDetected | ApiAuthError::PermissionDenied(_) => {
                StatusCode::FORBIDDEN
            }
            ApiAuthError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiAuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiAuthError::AlreadyExists(_) => StatusCode::CONFLICT,
            ApiAuthError::Internal(_)
            | ApiAuthError::Database(_)
            | ApiAuthError::DatabaseInternal(_)
            | ApiAuthError::Cache(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<lattice_core::CoreError> for ApiAuthError {
    fn from(err: lattice_core::CoreError) -> Self {
        use lattice_core::CoreError;
        match err {
            CoreError::Unauthenticated { .. } => ApiAuthError::Unauthenticated,
            CoreError::PermissionDenied { reason } => ApiAuthError::PermissionDenied(reason),
            CoreError::NotFound { resource, .. } => ApiAuthError::NotFound(resource),
            mismatch @ CoreError::TenantMismatch { .. } => {
                ApiAuthError::PermissionDenied(mismatch.to_string())
            }
            CoreError::InvalidArgument { field, message } => {
                ApiAuthError::InvalidArgument(format!("{field}: {message}"))
            }
        }
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let problem = self.to_problem_details();

        let mut response = (status, Json(problem)).into_response();
        response.headers_mut().insert(
            http::header::CONTENT_TYPE,
            http::HeaderValue::from_static("application/problem+json"),
        );

        if matches!(self, ApiAuthError::RateLimited) {
            response.headers_mut().insert(
                http::header::RETRY_AFTER,
                http::HeaderValue::from_static("60"),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_protection_same_message() {
        // Unknown email and wrong password must be textually identical.
        let err = ApiAuthError::InvalidCredentials;
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(
            err.to_problem_details().detail.as_deref(),
            Some("Invalid credentials")
        );
    }

    #[test]
    fn test_status_taxonomy_mapping() {
        assert_eq!(
            ApiAuthError::InvalidArgument("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiAuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiAuthError::TokenReuseDetected.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiAuthError::TotpRequired.status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            ApiAuthError::NotFound("key".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiAuthError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiAuthError::AlreadyExists("replay".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiAuthError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::new("test-error", "Test Error", StatusCode::BAD_REQUEST)
            .with_detail("This is a test error");

        let json = serde_json::to_string(&problem).unwrap();
        assert!(json.contains("\"type\":\"https://lattice.dev/errors/test-error\""));
        assert!(json.contains("\"title\":\"Test Error\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"detail\":\"This is a test error\""));
    }

    #[test]
    fn test_reuse_detection_detail() {
        let problem = ApiAuthError::TokenReuseDetected.to_problem_details();
        assert!(problem
            .detail
            .as_deref()
            .unwrap()
            .starts_with("Token reuse detected. All sessions revoked."));
    }
}

//! Error Types
//!
//! This module provides the standardized base error type for lattice.
//!
//! # Example
//!
//! ```
//! use lattice_core::{CoreError, Result};
//!
//! fn find_user(id: &str) -> Result<String> {
//!     if id.is_empty() {
//!         return Err(CoreError::NotFound {
//!             resource: "User".to_string(),
//!             id: None,
//!         });
//!     }
//!     Ok(format!("User {}", id))
//! }
//! ```

use crate::ids::TenantId;
use serde::Serialize;
use thiserror::Error;

/// Standardized error type for lattice services.
///
/// Each variant maps to one entry of the platform status taxonomy and can be
/// converted to an HTTP status code by the API crates.
///
/// # Variants
///
/// - `Unauthenticated` - Missing or invalid credential (HTTP 401)
/// - `PermissionDenied` - Cross-tenant access, scope denial (HTTP 403)
/// - `NotFound` - Resource not found (HTTP 404)
/// - `TenantMismatch` - Tenant isolation violation (HTTP 403)
/// - `InvalidArgument` - Input validation failure (HTTP 400)
#[derive(Debug, Clone, Error, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreError {
    /// Missing, invalid, or expired credential.
    ///
    /// The message is deliberately neutral to prevent account enumeration.
    /// Maps to HTTP 401 Unauthorized.
    #[error("Unauthenticated{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unauthenticated {
        /// Optional message providing more context
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },

    /// The caller is authenticated but not allowed to perform the operation.
    ///
    /// Used for scope denials and revoked-session rejections.
    /// Maps to HTTP 403 Forbidden.
    #[error("Permission denied: {reason}")]
    PermissionDenied {
        /// Why the operation was denied
        reason: String,
    },

    /// Requested resource was not found.
    ///
    /// Use when a database lookup returns no results.
    /// Maps to HTTP 404 Not Found.
    #[error("{resource} not found{}", id.as_ref().map(|i| format!(": {i}")).unwrap_or_default())]
    NotFound {
        /// The type of resource that was not found (e.g., "User", "Webhook")
        resource: String,
        /// Optional identifier of the resource
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<String>,
    },

    /// Tenant isolation violation.
    ///
    /// Use when an operation attempts to access data from a different tenant.
    /// This is a critical security error. Maps to HTTP 403 Forbidden.
    #[error("Tenant mismatch: expected {expected}, got {actual}")]
    TenantMismatch {
        /// The expected tenant ID
        expected: TenantId,
        /// The actual tenant ID that was provided
        actual: TenantId,
    },

    /// Input validation failure.
    ///
    /// Use when caller input fails validation rules.
    /// Maps to HTTP 400 Bad Request.
    #[error("Validation error on field '{field}': {message}")]
    InvalidArgument {
        /// The field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },
}

/// Type alias for Results using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    mod display_tests {
        use super::*;

        #[test]
        fn test_unauthenticated_without_message() {
            let error = CoreError::Unauthenticated { message: None };
            assert_eq!(error.to_string(), "Unauthenticated");
        }

        #[test]
        fn test_unauthenticated_with_message() {
            let error = CoreError::Unauthenticated {
                message: Some("Invalid credentials".to_string()),
            };
            assert_eq!(error.to_string(), "Unauthenticated: Invalid credentials");
        }

        #[test]
        fn test_not_found_without_id() {
            let error = CoreError::NotFound {
                resource: "User".to_string(),
                id: None,
            };
            assert_eq!(error.to_string(), "User not found");
        }

        #[test]
        fn test_not_found_with_id() {
            let error = CoreError::NotFound {
                resource: "Webhook".to_string(),
                id: Some("wh-123".to_string()),
            };
            assert_eq!(error.to_string(), "Webhook not found: wh-123");
        }

        #[test]
        fn test_tenant_mismatch_includes_both_tenants() {
            let expected = TenantId::new();
            let actual = TenantId::new();
            let error = CoreError::TenantMismatch { expected, actual };

            let display = error.to_string();
            assert!(display.contains("Tenant mismatch"));
            assert!(display.contains(&expected.to_string()));
            assert!(display.contains(&actual.to_string()));
        }

        #[test]
        fn test_invalid_argument_format() {
            let error = CoreError::InvalidArgument {
                field: "email".to_string(),
                message: "must be a valid email address".to_string(),
            };
            assert_eq!(
                error.to_string(),
                "Validation error on field 'email': must be a valid email address"
            );
        }

        #[test]
        fn test_is_std_error() {
            let error = CoreError::Unauthenticated { message: None };
            let _: &dyn std::error::Error = &error;
        }
    }

    mod serde_tests {
        use super::*;

        #[test]
        fn test_unauthenticated_serialization() {
            let error = CoreError::Unauthenticated {
                message: Some("test".to_string()),
            };
            let json = serde_json::to_string(&error).unwrap();
            assert!(json.contains("\"type\":\"unauthenticated\""));
            assert!(json.contains("\"message\":\"test\""));
        }

        #[test]
        fn test_unauthenticated_skips_none_message() {
            let error = CoreError::Unauthenticated { message: None };
            let json = serde_json::to_string(&error).unwrap();
            assert!(!json.contains("message"));
        }

        #[test]
        fn test_tenant_mismatch_serialization() {
            let error = CoreError::TenantMismatch {
                expected: TenantId::new(),
                actual: TenantId::new(),
            };
            let json = serde_json::to_string(&error).unwrap();
            assert!(json.contains("\"type\":\"tenant_mismatch\""));
            assert!(json.contains("\"expected\""));
            assert!(json.contains("\"actual\""));
        }

        #[test]
        fn test_json_is_parseable() {
            let error = CoreError::PermissionDenied {
                reason: "scope".to_string(),
            };
            let json = serde_json::to_string(&error).unwrap();
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert!(value.is_object());
        }
    }

    mod result_tests {
        use super::*;

        fn error_function() -> Result<String> {
            Err(CoreError::NotFound {
                resource: "Test".to_string(),
                id: None,
            })
        }

        fn propagating_function() -> Result<String> {
            error_function()?;
            Ok("never reached".to_string())
        }

        #[test]
        fn test_question_mark_propagation() {
            assert!(propagating_function().is_err());
        }
    }
}

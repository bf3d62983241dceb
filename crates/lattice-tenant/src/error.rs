//! Error types for tenant context extraction.

use lattice_core::{CoreError, TenantId};
use thiserror::Error;
use uuid::Uuid;

/// Tenant context extraction errors.
#[derive(Debug, Error)]
pub enum TenantError {
    /// No tenant context could be derived from the request.
    #[error("Tenant context missing")]
    Missing,

    /// A header value was present but unusable.
    #[error("Invalid tenant context: {0}")]
    InvalidFormat(String),

    /// The caller-supplied tenant header disagrees with the token claim.
    ///
    /// This is treated as a cross-tenant access attempt.
    #[error("Tenant header does not match token claims")]
    Mismatch {
        /// Tenant the verified claims carry.
        expected: Uuid,
        /// Tenant the caller asserted in the header.
        actual: Uuid,
    },
}

impl From<TenantError> for CoreError {
    fn from(err: TenantError) -> Self {
        match err {
            TenantError::Missing => CoreError::Unauthenticated { message: None },
            TenantError::InvalidFormat(message) => CoreError::InvalidArgument {
                field: "x-tenant-id".to_string(),
                message,
            },
            TenantError::Mismatch { expected, actual } => CoreError::TenantMismatch {
                expected: TenantId::from_uuid(expected),
                actual: TenantId::from_uuid(actual),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(TenantError::Missing.to_string(), "Tenant context missing");
        let err = TenantError::Mismatch {
            expected: Uuid::new_v4(),
            actual: Uuid::new_v4(),
        };
        assert_eq!(err.to_string(), "Tenant header does not match token claims");
    }

    #[test]
    fn test_mismatch_converts_to_core_tenant_mismatch() {
        let expected = Uuid::new_v4();
        let actual = Uuid::new_v4();
        let core: CoreError = TenantError::Mismatch { expected, actual }.into();

        match core {
            CoreError::TenantMismatch {
                expected: e,
                actual: a,
            } => {
                assert_eq!(*e.as_uuid(), expected);
                assert_eq!(*a.as_uuid(), actual);
            }
            other => panic!("wrong conversion: {other:?}"),
        }
    }
}

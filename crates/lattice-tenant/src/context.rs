//! The per-request identity attached to a call.

use lattice_auth::AccessClaims;
use lattice_core::{TenantId, UserId};
use uuid::Uuid;

/// Identity bound to a single RPC.
///
/// Inserted into request extensions by the auth middleware and read by
/// handlers. `validated` is true only when every field was derived from
/// verified token claims and no cross-check failed; handlers MUST treat an
/// unvalidated context as carrying no authority.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user_id: Option<Uuid>,
    pub tenant_id: Option<Uuid>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub validated: bool,
}

impl RequestContext {
    /// Build a validated context from verified access-token claims.
    #[must_use]
    pub fn from_claims(claims: &AccessClaims) -> Self {
        Self {
            user_id: claims.sub.parse().ok(),
            tenant_id: claims.tenant_id,
            email: claims.email.clone(),
            roles: claims.roles.clone(),
            validated: true,
        }
    }

    /// An empty, unvalidated context.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            tenant_id: None,
            email: None,
            roles: Vec::new(),
            validated: false,
        }
    }

    /// Strip the context of its authority after a failed cross-check.
    #[must_use]
    pub fn poisoned(mut self) -> Self {
        self.validated = false;
        self
    }

    /// The typed tenant id, when present.
    #[must_use]
    pub fn tenant(&self) -> Option<TenantId> {
        self.tenant_id.map(TenantId::from_uuid)
    }

    /// The typed user id, when present.
    #[must_use]
    pub fn user(&self) -> Option<UserId> {
        self.user_id.map(UserId::from_uuid)
    }

    /// The validated (user, tenant) pair, or `None` when the context has no
    /// authority. Handlers gate every authenticated operation on this.
    #[must_use]
    pub fn authority(&self) -> Option<(UserId, TenantId)> {
        if !self.validated {
            return None;
        }
        Some((self.user()?, self.tenant()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_claims_is_validated() {
        let tenant = TenantId::new();
        let user = Uuid::new_v4();
        let claims = AccessClaims::builder()
            .subject(user.to_string())
            .tenant_id(tenant)
            .email("u@x.io")
            .roles(vec!["admin"])
            .build();

        let ctx = RequestContext::from_claims(&claims);
        assert!(ctx.validated);
        assert_eq!(ctx.user_id, Some(user));
        assert_eq!(ctx.tenant(), Some(tenant));
        assert_eq!(ctx.email.as_deref(), Some("u@x.io"));
        assert!(ctx.authority().is_some());
    }

    #[test]
    fn test_poisoned_context_has_no_authority() {
        let claims = AccessClaims::builder()
            .subject(Uuid::new_v4().to_string())
            .tenant_id(TenantId::new())
            .build();

        let ctx = RequestContext::from_claims(&claims).poisoned();
        assert!(!ctx.validated);
        assert!(ctx.authority().is_none());
    }

    #[test]
    fn test_anonymous_has_no_authority() {
        assert!(RequestContext::anonymous().authority().is_none());
    }

    #[test]
    fn test_non_uuid_subject_yields_no_authority() {
        let claims = AccessClaims::builder()
            .subject("service-account")
            .tenant_id(TenantId::new())
            .build();

        let ctx = RequestContext::from_claims(&claims);
        assert!(ctx.validated);
        assert!(ctx.authority().is_none());
    }
}

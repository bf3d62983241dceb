//! Context extraction from request metadata.

use crate::context::RequestContext;
use crate::error::TenantError;
use crate::{EMAIL_HEADER, ROLES_HEADER, TENANT_HEADER, USER_HEADER};
use http::HeaderMap;
use uuid::Uuid;

/// Pull the bearer token out of the `authorization` header, if present.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// Cross-check a caller-supplied `x-tenant-id` header against the validated
/// context.
///
/// Absent or unparseable headers pass (the claim is authoritative); a
/// present, well-formed header that disagrees with the claim fails with
/// [`TenantError::Mismatch`], and the calling middleware must reject the
/// call with permission-denied before the handler runs.
pub fn cross_check_tenant_header(
    ctx: &RequestContext,
    headers: &HeaderMap,
) -> Result<(), TenantError> {
    let Some(raw) = headers.get(TENANT_HEADER) else {
        return Ok(());
    };
    let Ok(value) = raw.to_str() else {
        return Err(TenantError::InvalidFormat(
            "x-tenant-id is not valid UTF-8".to_string(),
        ));
    };

    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(());
    }

    let claimed: Uuid = trimmed
        .parse()
        .map_err(|_| TenantError::InvalidFormat(format!("'{trimmed}' is not a valid UUID")))?;

    match ctx.tenant_id {
        Some(tenant) if tenant == claimed => Ok(()),
        Some(tenant) => Err(TenantError::Mismatch {
            expected: tenant,
            actual: claimed,
        }),
        None => Err(TenantError::Mismatch {
            expected: Uuid::nil(),
            actual: claimed,
        }),
    }
}

/// Legacy extraction: read identity straight from metadata headers.
///
/// The returned context always carries `validated = false`.
#[must_use]
pub fn unsafe_from_headers(headers: &HeaderMap) -> RequestContext {
    let header_str = |name: &str| -> Option<String> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let roles = header_str(ROLES_HEADER)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    RequestContext {
        user_id: header_str(USER_HEADER).and_then(|s| s.parse().ok()),
        tenant_id: header_str(TENANT_HEADER).and_then(|s| s.parse().ok()),
        email: header_str(EMAIL_HEADER),
        roles,
        validated: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_auth::AccessClaims;
    use lattice_core::TenantId;

    fn headers_with(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                http::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        headers
    }

    fn validated_ctx(tenant: TenantId) -> RequestContext {
        let claims = AccessClaims::builder()
            .subject(Uuid::new_v4().to_string())
            .tenant_id(tenant)
            .build();
        RequestContext::from_claims(&claims)
    }

    #[test]
    fn test_bearer_token_present() {
        let headers = headers_with(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);

        let headers = headers_with(&[("authorization", "Basic dXNlcg==")]);
        assert_eq!(bearer_token(&headers), None);

        let headers = headers_with(&[("authorization", "Bearer ")]);
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_cross_check_passes_without_header() {
        let ctx = validated_ctx(TenantId::new());
        assert!(cross_check_tenant_header(&ctx, &HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_cross_check_passes_on_match() {
        let tenant = TenantId::new();
        let ctx = validated_ctx(tenant);
        let headers = headers_with(&[(TENANT_HEADER, &tenant.to_string())]);
        assert!(cross_check_tenant_header(&ctx, &headers).is_ok());
    }

    #[test]
    fn test_cross_check_fails_on_mismatch() {
        let claim_tenant = TenantId::new();
        let header_tenant = TenantId::new();
        let ctx = validated_ctx(claim_tenant);
        let headers = headers_with(&[(TENANT_HEADER, &header_tenant.to_string())]);

        match cross_check_tenant_header(&ctx, &headers) {
            Err(TenantError::Mismatch { expected, actual }) => {
                assert_eq!(expected, *claim_tenant.as_uuid());
                assert_eq!(actual, *header_tenant.as_uuid());
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_cross_check_fails_on_garbage_header() {
        let ctx = validated_ctx(TenantId::new());
        let headers = headers_with(&[(TENANT_HEADER, "not-a-uuid")]);
        assert!(matches!(
            cross_check_tenant_header(&ctx, &headers),
            Err(TenantError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unsafe_from_headers_is_never_validated() {
        let tenant = Uuid::new_v4();
        let user = Uuid::new_v4();
        let headers = headers_with(&[
            (TENANT_HEADER, &tenant.to_string()),
            (USER_HEADER, &user.to_string()),
            (EMAIL_HEADER, "u@x.io"),
            (ROLES_HEADER, "admin, auditor"),
        ]);

        let ctx = unsafe_from_headers(&headers);
        assert!(!ctx.validated);
        assert_eq!(ctx.tenant_id, Some(tenant));
        assert_eq!(ctx.user_id, Some(user));
        assert_eq!(ctx.email.as_deref(), Some("u@x.io"));
        assert_eq!(ctx.roles, vec!["admin", "auditor"]);
        // No authority despite complete headers.
        assert!(ctx.authority().is_none());
    }

    #[test]
    fn test_unsafe_from_headers_empty() {
        let ctx = unsafe_from_headers(&HeaderMap::new());
        assert!(!ctx.validated);
        assert!(ctx.tenant_id.is_none());
        assert!(ctx.roles.is_empty());
    }
}

//! Bearer-token authentication middleware.
//!
//! Runs before every protected handler: extracts the bearer token, validates
//! it (signature, issuer, expiry, jti blacklist), binds the resulting claims
//! to the call as a [`RequestContext`], and cross-checks any caller-supplied
//! `x-tenant-id` header against the claim. A mismatch fails the call with
//! permission-denied before the handler runs; handlers therefore receive an
//! already-bound, validated context.

use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use lattice_tenant::{bearer_token, cross_check_tenant_header, RequestContext, TenantError};

use crate::error::ApiAuthError;
use crate::state::AuthState;

/// Validated-mode authentication middleware.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiAuthError> {
    let token = bearer_token(request.headers()).ok_or(ApiAuthError::Unauthenticated)?;

    let claims = state.tokens.validate_access(token).await?;

    let ctx = RequestContext::from_claims(&claims);

    if let Err(e) = cross_check_tenant_header(&ctx, request.headers()) {
        if let TenantError::Mismatch { expected, actual } = &e {
            tracing::warn!(
                target: "security",
                user_id = ?ctx.user_id,
                token_tenant = %expected,
                header_tenant = %actual,
                "SECURITY ALERT: x-tenant-id header disagrees with token claims"
            );
        }
        return Err(ApiAuthError::from(lattice_core::CoreError::from(e)));
    }

    request.extensions_mut().insert(ctx);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

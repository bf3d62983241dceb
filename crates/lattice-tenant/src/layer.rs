//! Legacy unsafe-mode middleware.
//!
//! Attaches a [`RequestContext`] built from raw `x-*` headers to the request
//! extensions. The context always carries `validated = false`; routes that
//! require authority must sit behind the bearer-validating middleware in the
//! auth API crate instead.

use crate::extract::unsafe_from_headers;
use axum::{body::Body, extract::Request, middleware::Next, response::Response};

/// Axum middleware for the unsafe (legacy header) extraction mode.
pub async fn unsafe_context_middleware(mut request: Request<Body>, next: Next) -> Response {
    let ctx = unsafe_from_headers(request.headers());

    if ctx.tenant_id.is_some() {
        tracing::debug!(
            tenant_id = ?ctx.tenant_id,
            "Attached unvalidated legacy header context"
        );
    }

    request.extensions_mut().insert(ctx);
    next.run(request).await
}

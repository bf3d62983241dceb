//! # lattice-tenant
//!
//! Per-request identity for the lattice services.
//!
//! Every RPC that requires identity derives a [`RequestContext`] from the
//! bearer credential attached to the call. Two modes exist:
//!
//! - **Validated** (default): claims come from a cryptographically verified
//!   access token, and any caller-supplied `x-tenant-id` header is
//!   cross-checked against the claim. A mismatch poisons the context and the
//!   call fails with permission-denied before the handler runs.
//! - **Unsafe** (legacy): identity is read straight from `x-*` metadata
//!   headers. The resulting context always carries `validated = false` and
//!   handlers must treat it as having no authority.

pub mod context;
pub mod error;
pub mod extract;
pub mod layer;

pub use context::RequestContext;
pub use error::TenantError;
pub use extract::{bearer_token, cross_check_tenant_header, unsafe_from_headers};
pub use layer::unsafe_context_middleware;

/// Legacy metadata header carrying the caller-claimed tenant id.
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Legacy metadata header carrying the caller-claimed user id.
pub const USER_HEADER: &str = "x-user-id";

/// Legacy metadata header carrying the caller-claimed email.
pub const EMAIL_HEADER: &str = "x-user-email";

/// Legacy metadata header carrying comma-separated roles.
pub const ROLES_HEADER: &str = "x-user-roles";

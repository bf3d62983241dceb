//! # lattice-cache
//!
//! Typed facade over Redis for the fast, TTL-bounded state the core services
//! share: refresh-token bindings, the access-token blacklist, OTP codes and
//! rate counters, OAuth state nonces, and idempotency keys.
//!
//! Every operation is best-effort: callers must not rely on durability beyond
//! what Redis itself guarantees. Connection failures surface as
//! [`CacheError::Unavailable`].

pub mod client;
pub mod error;
pub mod keys;

pub use client::CacheClient;
pub use error::CacheError;

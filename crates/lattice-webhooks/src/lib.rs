//! # lattice-webhooks
//!
//! The webhook delivery engine: tenant-scoped registrations, SSRF-guarded
//! URL validation, HMAC-SHA256 payload signing, a durable delivery queue
//! with bounded exponential backoff, and a consecutive-failure circuit
//! breaker that disables misbehaving endpoints.

pub mod dispatcher;
pub mod error;
pub mod safe_url;
pub mod service;
pub mod signer;
pub mod worker;

pub use dispatcher::{retry_delay, should_retry, DeliveryDispatcher, DISABLE_THRESHOLD, MAX_RETRIES};
pub use error::WebhookError;
pub use safe_url::validate_url;
pub use service::{WebhookSecretMode, WebhookService};
pub use worker::WebhookWorker;

//! # lattice-email
//!
//! The email delivery queue: priority dispatch with bounded retry, soft and
//! hard bounce semantics, and a durable suppression list that hard-bounced
//! addresses land on permanently.
//!
//! The queue stops at "handed off to a transport adapter" — the
//! [`EmailTransport`](transport::EmailTransport) trait is the boundary, and
//! only a deterministic mock ships here; real providers are external
//! collaborators.

pub mod error;
pub mod queue;
pub mod transport;
pub mod worker;

pub use error::EmailError;
pub use queue::{email_retry_delay, should_retry_email, EmailQueueService, BOUNCE_ALERT_THRESHOLD, MAX_EMAIL_RETRIES};
pub use transport::{DeliveryOutcome, EmailTransport, MockTransport};
pub use worker::EmailWorker;

//! The transport boundary of the email queue.
//!
//! The queue hands a claimed message to an [`EmailTransport`] and maps the
//! outcome onto the state machine. Implementations wrap real providers
//! elsewhere; the deterministic [`MockTransport`] here records sends and
//! replays scripted outcomes for tests and non-production environments.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use lattice_db::models::EmailMessage;

/// Outcome of handing one message to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The provider accepted the message.
    Delivered,
    /// Transient failure (connection refused, greylisting, 4xx SMTP). The
    /// queue retries within its budget.
    SoftFailure(String),
    /// The address is permanently undeliverable. The queue suppresses it.
    HardBounce(String),
}

/// Trait for sending queued emails.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Attempt delivery of one message.
    async fn deliver(&self, message: &EmailMessage) -> DeliveryOutcome;
}

/// A send recorded by the mock transport.
#[derive(Debug, Clone)]
pub struct SentRecord {
    pub to_address: String,
    pub subject: String,
}

/// Deterministic in-memory transport.
///
/// Every delivery succeeds unless an outcome has been scripted for the
/// recipient address. All attempts are recorded for assertions.
#[derive(Default)]
pub struct MockTransport {
    sent: Mutex<Vec<SentRecord>>,
    scripted: Mutex<HashMap<String, DeliveryOutcome>>,
}

impl MockTransport {
    /// Create a mock transport that delivers everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for every future delivery to `address`.
    pub fn script_outcome(&self, address: &str, outcome: DeliveryOutcome) {
        self.scripted.lock().insert(address.to_string(), outcome);
    }

    /// All deliveries attempted so far, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().clone()
    }

    /// Number of deliveries attempted so far.
    #[must_use]
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl EmailTransport for MockTransport {
    async fn deliver(&self, message: &EmailMessage) -> DeliveryOutcome {
        self.sent.lock().push(SentRecord {
            to_address: message.to_address.clone(),
            subject: message.subject.clone(),
        });

        self.scripted
            .lock()
            .get(&message.to_address)
            .cloned()
            .unwrap_or(DeliveryOutcome::Delivered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn message_to(address: &str) -> EmailMessage {
        EmailMessage {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            to_address: address.to_string(),
            subject: "hello".to_string(),
            body_html: "<p>hi</p>".to_string(),
            body_text: None,
            template_id: None,
            status: "sending".to_string(),
            retry_count: 0,
            priority: 0,
            bounce_type: "none".to_string(),
            error_message: None,
            created_at: Utc::now(),
            scheduled_at: Utc::now(),
            sent_at: None,
        }
    }

    #[tokio::test]
    async fn test_mock_delivers_by_default() {
        let transport = MockTransport::new();
        let outcome = transport.deliver(&message_to("a@x.io")).await;

        assert_eq!(outcome, DeliveryOutcome::Delivered);
        assert_eq!(transport.sent_count(), 1);
        assert_eq!(transport.sent()[0].to_address, "a@x.io");
    }

    #[tokio::test]
    async fn test_mock_replays_scripted_outcome() {
        let transport = MockTransport::new();
        transport.script_outcome(
            "bounce@x.io",
            DeliveryOutcome::HardBounce("mailbox does not exist".to_string()),
        );

        let outcome = transport.deliver(&message_to("bounce@x.io")).await;
        assert!(matches!(outcome, DeliveryOutcome::HardBounce(_)));

        // Other addresses are unaffected.
        let outcome = transport.deliver(&message_to("fine@x.io")).await;
        assert_eq!(outcome, DeliveryOutcome::Delivered);
    }

    #[tokio::test]
    async fn test_mock_records_every_attempt() {
        let transport = MockTransport::new();
        transport.script_outcome("soft@x.io", DeliveryOutcome::SoftFailure("450".to_string()));

        transport.deliver(&message_to("soft@x.io")).await;
        transport.deliver(&message_to("soft@x.io")).await;

        assert_eq!(transport.sent_count(), 2);
    }
}

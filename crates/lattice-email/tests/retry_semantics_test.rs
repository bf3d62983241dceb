//! Email retry policy and transport-outcome mapping.

use std::sync::Arc;

use lattice_email::{
    email_retry_delay, should_retry_email, DeliveryOutcome, EmailTransport, MockTransport,
    BOUNCE_ALERT_THRESHOLD, MAX_EMAIL_RETRIES,
};

/// The retry table is 0 s, 1 s, 5 s, 30 s, capped at 30 s.
#[test]
fn test_email_backoff_table() {
    assert_eq!(email_retry_delay(0), 0);
    assert_eq!(email_retry_delay(1), 1);
    assert_eq!(email_retry_delay(2), 5);
    assert_eq!(email_retry_delay(3), 30);
    assert_eq!(email_retry_delay(4), 30);
}

/// Soft failures retry at most three times.
#[test]
fn test_email_retry_budget() {
    assert_eq!(MAX_EMAIL_RETRIES, 3);
    assert!(should_retry_email(0));
    assert!(should_retry_email(2));
    assert!(!should_retry_email(3));
}

/// Operators are alerted at a 5% bounce rate.
#[test]
fn test_bounce_alert_threshold() {
    assert!((BOUNCE_ALERT_THRESHOLD - 5.0).abs() < f64::EPSILON);
}

mod transport {
    use super::*;
    use chrono::Utc;
    use lattice_db::models::EmailMessage;
    use uuid::Uuid;

    fn claimed_message(to: &str) -> EmailMessage {
        EmailMessage {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            to_address: to.to_string(),
            subject: "subject".to_string(),
            body_html: "<p>body</p>".to_string(),
            body_text: Some("body".to_string()),
            template_id: None,
            status: "sending".to_string(),
            retry_count: 0,
            priority: 5,
            bounce_type: "none".to_string(),
            error_message: None,
            created_at: Utc::now(),
            scheduled_at: Utc::now(),
            sent_at: None,
        }
    }

    /// The mock transport delivers by default and replays scripted bounces,
    /// so fixtures can drive the hard-bounce suppression path.
    #[tokio::test]
    async fn test_scripted_outcomes() {
        let transport: Arc<dyn EmailTransport> = {
            let mock = MockTransport::new();
            mock.script_outcome(
                "a@x.io",
                DeliveryOutcome::HardBounce("user unknown".to_string()),
            );
            mock.script_outcome(
                "b@x.io",
                DeliveryOutcome::SoftFailure("greylisted".to_string()),
            );
            Arc::new(mock)
        };

        assert!(matches!(
            transport.deliver(&claimed_message("a@x.io")).await,
            DeliveryOutcome::HardBounce(_)
        ));
        assert!(matches!(
            transport.deliver(&claimed_message("b@x.io")).await,
            DeliveryOutcome::SoftFailure(_)
        ));
        assert_eq!(
            transport.deliver(&claimed_message("c@x.io")).await,
            DeliveryOutcome::Delivered
        );
    }
}

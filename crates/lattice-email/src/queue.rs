//! Email queue service.
//!
//! Enqueue refuses suppressed addresses outright; the claim/mark cycle
//! drives the state machine in `lattice_db::models::email_message`.

use crate::error::EmailError;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use lattice_db::models::{BounceType, CreateEmail, EmailMessage, EmailSuppression};

/// Maximum retry attempts per email after the initial send.
pub const MAX_EMAIL_RETRIES: i32 = 3;

/// Bounce-rate percentage at which operators are alerted.
pub const BOUNCE_ALERT_THRESHOLD: f64 = 5.0;

/// Backoff schedule in seconds, indexed by retry count.
const RETRY_SCHEDULE_SECS: [i64; 4] = [0, 1, 5, 30];

/// Decide whether a soft failure should be retried.
#[must_use]
pub fn should_retry_email(retry_count: i32) -> bool {
    retry_count < MAX_EMAIL_RETRIES
}

/// Backoff delay in seconds before attempt `retry_count`, capped at 30 s.
#[must_use]
pub fn email_retry_delay(retry_count: i32) -> i64 {
    let idx = retry_count.max(0) as usize;
    RETRY_SCHEDULE_SECS
        .get(idx)
        .copied()
        .unwrap_or(*RETRY_SCHEDULE_SECS.last().expect("schedule is non-empty"))
}

/// Timestamp of the next attempt for the given retry count.
#[must_use]
pub fn next_attempt_at(retry_count: i32) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(email_retry_delay(retry_count))
}

/// Input for [`EmailQueueService::enqueue`].
#[derive(Debug, Clone)]
pub struct EnqueueEmail {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub to_address: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: Option<String>,
    pub template_id: Option<String>,
    pub priority: i32,
}

/// Service for email queue operations.
#[derive(Clone)]
pub struct EmailQueueService {
    pool: PgPool,
}

impl EmailQueueService {
    /// Create a new email queue service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue an email for delivery.
    ///
    /// # Errors
    ///
    /// - `EmailError::Suppressed` when the recipient is on the suppression
    ///   list; no row is created.
    /// - `EmailError::Validation` when the priority is outside 0–10 or the
    ///   recipient is empty.
    pub async fn enqueue(&self, input: EnqueueEmail) -> Result<Uuid, EmailError> {
        if input.to_address.is_empty() {
            return Err(EmailError::Validation(
                "recipient address is required".to_string(),
            ));
        }
        if !(0..=10).contains(&input.priority) {
            return Err(EmailError::Validation(format!(
                "priority must be 0-10, got {}",
                input.priority
            )));
        }

        if EmailSuppression::exists(&self.pool, &input.to_address).await? {
            return Err(EmailError::Suppressed);
        }

        let message = EmailMessage::create(
            &self.pool,
            CreateEmail {
                tenant_id: input.tenant_id,
                user_id: input.user_id,
                to_address: input.to_address,
                subject: input.subject,
                body_html: input.body_html,
                body_text: input.body_text,
                template_id: input.template_id,
                priority: input.priority,
            },
        )
        .await?;

        tracing::info!(
            target: "email_queue",
            email_id = %message.id,
            tenant_id = %message.tenant_id,
            priority = message.priority,
            "Email queued"
        );

        Ok(message.id)
    }

    /// Atomically claim up to `batch_size` due emails, highest priority first.
    pub async fn claim_batch(&self, batch_size: i64) -> Result<Vec<EmailMessage>, EmailError> {
        Ok(EmailMessage::claim_batch(&self.pool, batch_size).await?)
    }

    /// Record a successful handoff to the transport.
    pub async fn mark_sent(&self, id: Uuid) -> Result<(), EmailError> {
        EmailMessage::mark_sent(&self.pool, id).await?;
        tracing::info!(target: "email_queue", email_id = %id, "Email sent");
        Ok(())
    }

    /// Record a failed attempt.
    ///
    /// A hard bounce goes terminal immediately: the message becomes
    /// `bounced` and the recipient is suppressed. A soft failure retries
    /// while the budget allows, then exhausts.
    pub async fn mark_failed(
        &self,
        message: &EmailMessage,
        error_message: &str,
        hard_bounce: bool,
    ) -> Result<(), EmailError> {
        if hard_bounce {
            EmailMessage::mark_bounced(&self.pool, message.id, error_message).await?;
            EmailSuppression::upsert(&self.pool, &message.to_address, error_message).await?;

            tracing::warn!(
                target: "email_queue",
                email_id = %message.id,
                to = %message.to_address,
                "Hard bounce; address suppressed"
            );
            return Ok(());
        }

        if should_retry_email(message.retry_count) {
            let new_retry_count = message.retry_count + 1;
            let scheduled_at = next_attempt_at(new_retry_count);

            EmailMessage::mark_retry(
                &self.pool,
                message.id,
                new_retry_count,
                scheduled_at,
                error_message,
            )
            .await?;

            tracing::info!(
                target: "email_queue",
                email_id = %message.id,
                retry_count = new_retry_count,
                "Email scheduled for retry"
            );
        } else {
            EmailMessage::mark_exhausted(&self.pool, message.id, error_message).await?;

            tracing::warn!(
                target: "email_queue",
                email_id = %message.id,
                "Email retries exhausted"
            );
        }

        Ok(())
    }

    /// Record a bounce reported by the transport or an async bounce webhook.
    ///
    /// Hard bounces suppress; soft bounces record the bounce type and defer
    /// to [`Self::mark_failed`] for retry semantics.
    pub async fn mark_bounced(
        &self,
        message: &EmailMessage,
        bounce_type: BounceType,
        error_message: &str,
    ) -> Result<(), EmailError> {
        match bounce_type {
            BounceType::Hard => self.mark_failed(message, error_message, true).await,
            BounceType::Soft => {
                EmailMessage::record_soft_bounce(&self.pool, message.id, error_message).await?;
                self.mark_failed(message, error_message, false).await
            }
            BounceType::None => Ok(()),
        }
    }

    /// Bounce rate in percent over the trailing window, optionally scoped to
    /// one tenant. Compare against [`BOUNCE_ALERT_THRESHOLD`].
    pub async fn bounce_rate(
        &self,
        tenant_id: Option<Uuid>,
        hours: i32,
    ) -> Result<f64, EmailError> {
        Ok(EmailMessage::bounce_rate(&self.pool, tenant_id, hours).await?)
    }

    /// Fetch the current state of a queued email within a tenant.
    pub async fn status(&self, tenant_id: Uuid, id: Uuid) -> Result<EmailMessage, EmailError> {
        EmailMessage::find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| EmailError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_schedule_matches_table() {
        assert_eq!(email_retry_delay(0), 0);
        assert_eq!(email_retry_delay(1), 1);
        assert_eq!(email_retry_delay(2), 5);
        assert_eq!(email_retry_delay(3), 30);
    }

    #[test]
    fn test_retry_delay_caps_at_30() {
        assert_eq!(email_retry_delay(4), 30);
        assert_eq!(email_retry_delay(50), 30);
    }

    #[test]
    fn test_should_retry_under_budget() {
        assert!(should_retry_email(0));
        assert!(should_retry_email(1));
        assert!(should_retry_email(2));
    }

    #[test]
    fn test_should_not_retry_at_budget() {
        assert!(!should_retry_email(3));
        assert!(!should_retry_email(4));
    }

    #[test]
    fn test_next_attempt_at_offsets_by_delay() {
        let next = next_attempt_at(2);
        let delta = next - Utc::now();
        assert!(delta.num_seconds() >= 3 && delta.num_seconds() <= 5);
    }

    #[test]
    fn test_alert_threshold() {
        assert!((BOUNCE_ALERT_THRESHOLD - 5.0).abs() < f64::EPSILON);
    }
}

//! Email queue database model.
//!
//! Status machine:
//!
//! ```text
//!  pending → sending → sent                          (happy path)
//!  pending → sending → retry → sending → …           (soft failure)
//!          … retry → sending → exhausted             (after max retries)
//!  pending → sending → bounced                       (hard bounce)
//! ```
//!
//! Terminal states: `sent`, `exhausted`, `bounced`. A `bounced` row always
//! carries bounce type `hard`; a suppressed address never reaches `sending`
//! because enqueue refuses it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Email status values stored in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStatus {
    Pending,
    Sending,
    Sent,
    Failed,
    Retry,
    Exhausted,
    Bounced,
}

impl EmailStatus {
    /// The string stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Pending => "pending",
            EmailStatus::Sending => "sending",
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
            EmailStatus::Retry => "retry",
            EmailStatus::Exhausted => "exhausted",
            EmailStatus::Bounced => "bounced",
        }
    }

    /// Parse a stored status string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(EmailStatus::Pending),
            "sending" => Some(EmailStatus::Sending),
            "sent" => Some(EmailStatus::Sent),
            "failed" => Some(EmailStatus::Failed),
            "retry" => Some(EmailStatus::Retry),
            "exhausted" => Some(EmailStatus::Exhausted),
            "bounced" => Some(EmailStatus::Bounced),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EmailStatus::Sent | EmailStatus::Exhausted | EmailStatus::Bounced
        )
    }
}

/// Bounce classification stored in the `bounce_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BounceType {
    None,
    Soft,
    Hard,
}

impl BounceType {
    /// The string stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BounceType::None => "none",
            BounceType::Soft => "soft",
            BounceType::Hard => "hard",
        }
    }

    /// Parse a stored bounce type string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(BounceType::None),
            "soft" => Some(BounceType::Soft),
            "hard" => Some(BounceType::Hard),
            _ => None,
        }
    }
}

/// Database entity for a queued email.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub to_address: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: Option<String>,
    pub template_id: Option<String>,
    pub status: String,
    pub retry_count: i32,
    /// Dispatch priority 0–10; higher is claimed first.
    pub priority: i32,
    pub bounce_type: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Input for enqueueing an email.
#[derive(Debug, Clone)]
pub struct CreateEmail {
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub to_address: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: Option<String>,
    pub template_id: Option<String>,
    pub priority: i32,
}

impl EmailMessage {
    /// Insert a new queued email in the `pending` state, scheduled now.
    pub async fn create(pool: &PgPool, input: CreateEmail) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO email_queue
                (tenant_id, user_id, to_address, subject, body_html, body_text,
                 template_id, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(input.tenant_id)
        .bind(input.user_id)
        .bind(&input.to_address)
        .bind(&input.subject)
        .bind(&input.body_html)
        .bind(&input.body_text)
        .bind(&input.template_id)
        .bind(input.priority)
        .fetch_one(pool)
        .await
    }

    /// Find a queued email by id within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM email_queue
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Atomically claim up to `batch_size` due emails.
    ///
    /// Highest priority first, then oldest `scheduled_at`; the same SKIP
    /// LOCKED discipline as webhook deliveries keeps claimers disjoint.
    pub async fn claim_batch(pool: &PgPool, batch_size: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE email_queue SET status = 'sending'
            WHERE id IN (
                SELECT id FROM email_queue
                WHERE status IN ('pending', 'retry')
                  AND scheduled_at <= NOW()
                ORDER BY priority DESC, scheduled_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(batch_size)
        .fetch_all(pool)
        .await
    }

    /// Mark an email as sent.
    pub async fn mark_sent(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_queue SET status = 'sent', sent_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Schedule a retry after a soft failure.
    pub async fn mark_retry(
        pool: &PgPool,
        id: Uuid,
        retry_count: i32,
        scheduled_at: DateTime<Utc>,
        error_message: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_queue
            SET status = 'retry', retry_count = $2, scheduled_at = $3, error_message = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(retry_count)
        .bind(scheduled_at)
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Mark an email as exhausted after its final failed attempt.
    pub async fn mark_exhausted(
        pool: &PgPool,
        id: Uuid,
        error_message: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_queue SET status = 'exhausted', error_message = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Mark an email as hard-bounced. A `bounced` row always carries the
    /// `hard` bounce type; suppression is the caller's next step.
    pub async fn mark_bounced(
        pool: &PgPool,
        id: Uuid,
        error_message: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_queue
            SET status = 'bounced', bounce_type = 'hard', error_message = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Record a soft bounce without changing the status; retry semantics are
    /// decided by the caller's failure path.
    pub async fn record_soft_bounce(
        pool: &PgPool,
        id: Uuid,
        error_message: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE email_queue SET bounce_type = 'soft', error_message = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Bounce rate in percent over the trailing window, optionally scoped to
    /// one tenant. `(bounced / total) * 100`; zero when the window is empty.
    pub async fn bounce_rate(
        pool: &PgPool,
        tenant_id: Option<Uuid>,
        hours: i32,
    ) -> Result<f64, sqlx::Error> {
        let row: (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'bounced'),
                COUNT(*)
            FROM email_queue
            WHERE ($1::uuid IS NULL OR tenant_id = $1)
              AND created_at >= NOW() - ($2::text || ' hours')::interval
            "#,
        )
        .bind(tenant_id)
        .bind(hours.to_string())
        .fetch_one(pool)
        .await?;

        let (bounced, total) = row;
        if total == 0 {
            return Ok(0.0);
        }
        Ok(bounced as f64 / total as f64 * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            EmailStatus::Pending,
            EmailStatus::Sending,
            EmailStatus::Sent,
            EmailStatus::Failed,
            EmailStatus::Retry,
            EmailStatus::Exhausted,
            EmailStatus::Bounced,
        ] {
            assert_eq!(EmailStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(EmailStatus::parse("unknown"), None);
    }

    #[test]
    fn test_terminal_states() {
        assert!(EmailStatus::Sent.is_terminal());
        assert!(EmailStatus::Exhausted.is_terminal());
        assert!(EmailStatus::Bounced.is_terminal());
        assert!(!EmailStatus::Pending.is_terminal());
        assert!(!EmailStatus::Retry.is_terminal());
    }

    #[test]
    fn test_bounce_type_round_trip() {
        for bt in [BounceType::None, BounceType::Soft, BounceType::Hard] {
            assert_eq!(BounceType::parse(bt.as_str()), Some(bt));
        }
    }
}

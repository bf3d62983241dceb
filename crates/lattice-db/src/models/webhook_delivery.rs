//! Webhook delivery database model.
//!
//! Records individual delivery attempts with status tracking, retry
//! scheduling, and the last HTTP result. The claim query is the concurrency
//! boundary: a single `UPDATE … WHERE id IN (SELECT … FOR UPDATE SKIP
//! LOCKED)` flips due rows to `sending` so two workers can never claim the
//! same row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Delivery status values stored in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDeliveryStatus {
    Pending,
    Sending,
    Delivered,
    Failed,
    Retry,
    Exhausted,
}

impl WebhookDeliveryStatus {
    /// The string stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookDeliveryStatus::Pending => "pending",
            WebhookDeliveryStatus::Sending => "sending",
            WebhookDeliveryStatus::Delivered => "delivered",
            WebhookDeliveryStatus::Failed => "failed",
            WebhookDeliveryStatus::Retry => "retry",
            WebhookDeliveryStatus::Exhausted => "exhausted",
        }
    }

    /// Parse a stored status string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(WebhookDeliveryStatus::Pending),
            "sending" => Some(WebhookDeliveryStatus::Sending),
            "delivered" => Some(WebhookDeliveryStatus::Delivered),
            "failed" => Some(WebhookDeliveryStatus::Failed),
            "retry" => Some(WebhookDeliveryStatus::Retry),
            "exhausted" => Some(WebhookDeliveryStatus::Exhausted),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WebhookDeliveryStatus::Delivered | WebhookDeliveryStatus::Exhausted
        )
    }
}

/// Database entity for a webhook delivery attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WebhookDelivery {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub webhook_id: Uuid,
    pub event_type: String,
    /// The exact bytes POSTed to the endpoint.
    pub payload: String,
    /// URL resolved at queue time.
    pub url: String,
    /// Hex HMAC-SHA256 of the payload, computed at queue time.
    pub signature: String,
    pub status: String,
    pub retry_count: i32,
    pub http_status: Option<i32>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Input for creating a new delivery record.
#[derive(Debug, Clone)]
pub struct CreateWebhookDelivery {
    pub tenant_id: Uuid,
    pub webhook_id: Uuid,
    pub event_type: String,
    pub payload: String,
    pub url: String,
    pub signature: String,
}

impl WebhookDelivery {
    /// Create a delivery record in the `pending` state, scheduled now.
    pub async fn create(pool: &PgPool, input: CreateWebhookDelivery) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO webhook_deliveries
                (tenant_id, webhook_id, event_type, payload, url, signature)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.tenant_id)
        .bind(input.webhook_id)
        .bind(&input.event_type)
        .bind(&input.payload)
        .bind(&input.url)
        .bind(&input.signature)
        .fetch_one(pool)
        .await
    }

    /// Find a delivery by id within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM webhook_deliveries
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Atomically claim up to `batch_size` due deliveries.
    ///
    /// Selects rows in `pending`/`retry` whose `scheduled_at` has passed,
    /// oldest first, flips them to `sending`, and returns exactly the rows
    /// this caller now owns.
    pub async fn claim_batch(pool: &PgPool, batch_size: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE webhook_deliveries SET status = 'sending'
            WHERE id IN (
                SELECT id FROM webhook_deliveries
                WHERE status IN ('pending', 'retry')
                  AND scheduled_at <= NOW()
                ORDER BY scheduled_at ASC
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

    /// Mark a delivery as delivered with the responding HTTP status.
    pub async fn mark_delivered(
        pool: &PgPool,
        id: Uuid,
        http_status: i32,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_deliveries
            SET status = 'delivered', http_status = $2, delivered_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(http_status)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Schedule a retry: bump the retry count and push `scheduled_at` forward.
    pub async fn mark_retry(
        pool: &PgPool,
        id: Uuid,
        retry_count: i32,
        scheduled_at: DateTime<Utc>,
        http_status: Option<i32>,
        error_message: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_deliveries
            SET status = 'retry', retry_count = $2, scheduled_at = $3,
                http_status = $4, error_message = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(retry_count)
        .bind(scheduled_at)
        .bind(http_status)
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Mark a delivery as exhausted after its final failed attempt.
    pub async fn mark_exhausted(
        pool: &PgPool,
        id: Uuid,
        http_status: Option<i32>,
        error_message: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_deliveries
            SET status = 'exhausted', http_status = $2, error_message = $3
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(http_status)
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

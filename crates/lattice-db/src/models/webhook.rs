//! Webhook registration database model.
//!
//! A disabled webhook accepts no new deliveries; the disable reason is
//! recorded when the consecutive-failure threshold trips it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Registration status values stored in the `status` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookStatus {
    Active,
    Disabled,
}

impl WebhookStatus {
    /// The string stored in the database.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookStatus::Active => "active",
            WebhookStatus::Disabled => "disabled",
        }
    }

    /// Parse a stored status string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(WebhookStatus::Active),
            "disabled" => Some(WebhookStatus::Disabled),
            _ => None,
        }
    }
}

/// Database entity for a webhook registration.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Webhook {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub url: String,
    pub event_types: Vec<String>,
    /// HMAC signing secret for this endpoint.
    pub secret: String,
    pub status: String,
    pub consecutive_failures: i32,
    pub disabled_reason: Option<String>,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new webhook registration.
#[derive(Debug, Clone)]
pub struct CreateWebhook {
    pub tenant_id: Uuid,
    pub url: String,
    pub event_types: Vec<String>,
    pub secret: String,
}

impl Webhook {
    /// Create a new registration in the `active` state.
    pub async fn create(pool: &PgPool, input: CreateWebhook) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO webhooks (tenant_id, url, event_types, secret)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(input.tenant_id)
        .bind(&input.url)
        .bind(&input.event_types)
        .bind(&input.secret)
        .fetch_one(pool)
        .await
    }

    /// Find a registration by id within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM webhooks
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// List registrations for a tenant, newest first.
    pub async fn list_by_tenant(
        pool: &PgPool,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM webhooks
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(tenant_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Increment the consecutive-failure counter and return the new value.
    pub async fn increment_failures(pool: &PgPool, id: Uuid) -> Result<i32, sqlx::Error> {
        let row: (i32,) = sqlx::query_as(
            r#"
            UPDATE webhooks
            SET consecutive_failures = consecutive_failures + 1
            WHERE id = $1
            RETURNING consecutive_failures
            "#,
        )
        .bind(id)
        .fetch_one(pool)
        .await?;

        Ok(row.0)
    }

    /// Reset the failure counter and stamp `last_triggered_at` on success.
    pub async fn record_success(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE webhooks
            SET consecutive_failures = 0, last_triggered_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Disable a webhook, recording the reason. No new deliveries are queued
    /// against a disabled registration.
    pub async fn disable(pool: &PgPool, id: Uuid, reason: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE webhooks
            SET status = 'disabled', disabled_reason = $2
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(reason)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// True when the registration accepts new deliveries.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == WebhookStatus::Active.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [WebhookStatus::Active, WebhookStatus::Disabled] {
            assert_eq!(WebhookStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(WebhookStatus::parse("nonsense"), None);
    }

    #[test]
    fn test_is_active() {
        let mut hook = Webhook {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            url: "https://example.com/h".to_string(),
            event_types: vec!["user.created".to_string()],
            secret: "whsec_test".to_string(),
            status: "active".to_string(),
            consecutive_failures: 0,
            disabled_reason: None,
            last_triggered_at: None,
            created_at: Utc::now(),
        };
        assert!(hook.is_active());

        hook.status = "disabled".to_string();
        assert!(!hook.is_active());
    }
}

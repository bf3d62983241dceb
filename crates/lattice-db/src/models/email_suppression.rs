//! Email suppression list database model.
//!
//! A suppressed address must never be contacted again. Inserts are
//! idempotent: re-suppressing refreshes the reason and timestamp.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// Database entity for a suppressed recipient address.
#[derive(Debug, Clone, FromRow)]
pub struct EmailSuppression {
    pub email_address: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl EmailSuppression {
    /// Upsert a suppression entry for an address.
    pub async fn upsert(
        pool: &PgPool,
        email_address: &str,
        reason: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO email_suppression (email_address, reason)
            VALUES ($1, $2)
            ON CONFLICT (email_address)
            DO UPDATE SET reason = EXCLUDED.reason, created_at = NOW()
            RETURNING *
            "#,
        )
        .bind(email_address)
        .bind(reason)
        .fetch_one(pool)
        .await
    }

    /// Check whether an address is suppressed.
    pub async fn exists(pool: &PgPool, email_address: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM email_suppression WHERE email_address = $1")
                .bind(email_address)
                .fetch_optional(pool)
                .await?;

        Ok(row.is_some())
    }
}

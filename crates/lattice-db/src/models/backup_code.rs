//! Backup code database model.
//!
//! Each code is stored only as a hash and may be consumed at most once:
//! consumption sets `used_at` inside the same transaction that validated it.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// Database entity for a single-use TOTP backup code.
#[derive(Debug, Clone, FromRow)]
pub struct BackupCode {
    pub id: Uuid,
    pub user_id: Uuid,
    pub code_hash: String,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl BackupCode {
    /// Insert a batch of hashed codes for a user.
    ///
    /// Callers run this inside the enrollment transaction so the codes and
    /// the TOTP secret commit together.
    pub async fn insert_many(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        code_hashes: &[String],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO backup_codes (user_id, code_hash)
            SELECT $1, hash FROM UNNEST($2::text[]) AS hash
            "#,
        )
        .bind(user_id)
        .bind(code_hashes)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Fetch all unused codes for a user.
    pub async fn find_unused(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM backup_codes
            WHERE user_id = $1 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Mark a code as used by its hash.
    ///
    /// The `used_at IS NULL` guard makes consumption single-shot even if two
    /// logins race on the same code; only one update reports a row.
    pub async fn mark_used(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        code_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE backup_codes SET used_at = NOW()
            WHERE user_id = $1 AND code_hash = $2 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(code_hash)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete every code for a user (regeneration and TOTP disable).
    pub async fn delete_for_user(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM backup_codes WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count remaining unused codes for a user.
    pub async fn count_unused(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM backup_codes
            WHERE user_id = $1 AND used_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(row.0)
    }
}

//! User account database model.
//!
//! A user with a NULL `password_hash` authenticates only through a federated
//! identity provider and must never be granted a session via password login.
//! Soft-deleted users (`deleted_at` set) are invisible to every lookup here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

/// Database entity for a user account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    pub password_hash: Option<String>,
    pub totp_secret: Option<String>,
    pub totp_enrolled_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user with a password hash.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO users (tenant_id, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(email)
        .bind(password_hash)
        .fetch_one(executor)
        .await
    }

    /// Create a federated-only user (NULL password hash).
    ///
    /// Used by the OAuth callback path on first sight of a provider identity.
    pub async fn create_federated(
        executor: impl PgExecutor<'_>,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO users (tenant_id, email, password_hash)
            VALUES ($1, $2, NULL)
            RETURNING *
            "#,
        )
        .bind(tenant_id)
        .bind(email)
        .fetch_one(executor)
        .await
    }

    /// Find a non-deleted user by email.
    pub async fn find_by_email(
        executor: impl PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    /// Find a non-deleted user by id.
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM users
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Store a TOTP secret and stamp the enrollment time.
    pub async fn set_totp_secret(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        secret: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET totp_secret = $2, totp_enrolled_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(secret)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Clear the TOTP secret and enrollment timestamp.
    pub async fn clear_totp_secret(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET totp_secret = NULL, totp_enrolled_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Soft-delete a user. The row stays for audit; every lookup here skips it.
    pub async fn soft_delete(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// True when the account authenticates only via a federated provider.
    #[must_use]
    pub fn is_federated_only(&self) -> bool {
        self.password_hash.is_none()
    }

    /// True when the account has a TOTP second factor enrolled.
    #[must_use]
    pub fn has_totp(&self) -> bool {
        self.totp_secret.is_some()
    }
}

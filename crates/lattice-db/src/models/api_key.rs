//! API key database model.
//!
//! The plaintext key material is returned exactly once at issuance; the table
//! retains only an Argon2id hash. A key is usable only while `revoked_at` is
//! NULL and the expiry is in the future.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Database entity for an API key.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub key_hash: String,
    pub name: String,
    /// Comma-joined scope list, e.g. `read:*,write:upload`.
    pub scopes: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new API key row.
#[derive(Debug, Clone)]
pub struct CreateApiKey {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub key_hash: String,
    pub name: String,
    pub scopes: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Insert a new API key row.
    pub async fn create(pool: &PgPool, input: CreateApiKey) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO api_keys (user_id, tenant_id, key_hash, name, scopes, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(input.tenant_id)
        .bind(&input.key_hash)
        .bind(&input.name)
        .bind(&input.scopes)
        .bind(input.expires_at)
        .fetch_one(pool)
        .await
    }

    /// Fetch every usable key: not revoked, and not past its expiry.
    ///
    /// Validation must verify the presented plaintext against each returned
    /// hash; a hash-prefix index would narrow this scan but the deny-by-default
    /// behavior is what matters.
    pub async fn find_usable(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM api_keys
            WHERE revoked_at IS NULL
              AND (expires_at IS NULL OR expires_at > NOW())
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Revoke a key owned by the given user and tenant.
    ///
    /// Returns the number of rows affected; zero means the key was absent,
    /// foreign, or already revoked.
    pub async fn revoke(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE api_keys SET revoked_at = NOW()
            WHERE id = $1 AND user_id = $2 AND tenant_id = $3 AND revoked_at IS NULL
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// List keys for a user (newest first). Hashes are included; callers
    /// building API responses must not expose them.
    pub async fn list_for_user(
        pool: &PgPool,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT * FROM api_keys
            WHERE tenant_id = $1 AND user_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Split the stored comma-joined scope list.
    #[must_use]
    pub fn scope_list(&self) -> Vec<&str> {
        if self.scopes.is_empty() {
            return Vec::new();
        }
        self.scopes.split(',').collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_with_scopes(scopes: &str) -> ApiKey {
        ApiKey {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            key_hash: String::new(),
            name: "test".to_string(),
            scopes: scopes.to_string(),
            expires_at: None,
            revoked_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_scope_list_splits_on_comma() {
        let key = key_with_scopes("read:*,write:upload");
        assert_eq!(key.scope_list(), vec!["read:*", "write:upload"]);
    }

    #[test]
    fn test_scope_list_empty() {
        let key = key_with_scopes("");
        assert!(key.scope_list().is_empty());
    }

    #[test]
    fn test_scope_list_preserves_whitespace() {
        // Whitespace is not trimmed; matching is literal.
        let key = key_with_scopes("read:a, write:b");
        assert_eq!(key.scope_list(), vec!["read:a", " write:b"]);
    }
}

//! OAuth account link database model.
//!
//! Maps a (provider, provider-side user id) pair to a local user. The pair is
//! unique; one user may hold several rows for different providers.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use super::user::User;

/// Database entity for a federated identity link.
#[derive(Debug, Clone, FromRow)]
pub struct OauthAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub provider: String,
    pub provider_user_id: String,
    pub created_at: DateTime<Utc>,
}

impl OauthAccount {
    /// Link a provider identity to a user.
    pub async fn link(
        executor: impl PgExecutor<'_>,
        user_id: Uuid,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO oauth_accounts (user_id, provider, provider_user_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(provider_user_id)
        .fetch_one(executor)
        .await
    }

    /// Resolve the non-deleted user linked to a provider identity, if any.
    pub async fn find_linked_user(
        executor: impl PgExecutor<'_>,
        provider: &str,
        provider_user_id: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT u.* FROM users u
            JOIN oauth_accounts oa ON u.id = oa.user_id
            WHERE oa.provider = $1
              AND oa.provider_user_id = $2
              AND u.deleted_at IS NULL
            "#,
        )
        .bind(provider)
        .bind(provider_user_id)
        .fetch_optional(executor)
        .await
    }
}

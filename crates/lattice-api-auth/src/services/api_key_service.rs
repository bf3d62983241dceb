//! API key issuance and validation with scope matching.
//!
//! Key material is `sk_<256-bit hex>`, returned exactly once at issuance;
//! the table retains only an Argon2id hash. Validation scans the usable
//! rows and verifies the presented plaintext against each hash — deny by
//! default is the invariant a faster index must preserve.

use chrono::{Duration, Utc};
use lattice_auth::PasswordHasher;
use rand::rngs::OsRng;
use rand::RngCore;
use sqlx::PgPool;
use uuid::Uuid;

use lattice_db::models::{ApiKey, CreateApiKey};

use crate::error::ApiAuthError;

/// Key lifetime: one year from issuance.
const KEY_VALIDITY_DAYS: i64 = 365;

/// Random bytes of key material (256 bits).
const KEY_MATERIAL_BYTES: usize = 32;

/// Match a requested scope against a granted scope list.
///
/// Deny by default. A grant satisfies the request when any of:
///
/// - it equals the request exactly (case-sensitive, no trimming),
/// - it ends with `*` and the request starts with the grant minus the `*`
///   (textual prefix; no separator requirement),
/// - it is the literal `*`, which matches any non-empty request.
///
/// Internal `*` characters are not wildcards, and an empty request never
/// matches.
#[must_use]
pub fn scope_match<S: AsRef<str>>(granted: &[S], requested: &str) -> bool {
    if requested.is_empty() {
        return false;
    }

    for grant in granted {
        let grant = grant.as_ref();

        if grant == requested {
            return true;
        }

        if let Some(prefix) = grant.strip_suffix('*') {
            if requested.starts_with(prefix) {
                return true;
            }
        }
    }

    false
}

/// Outcome of a successful API key validation.
#[derive(Debug, Clone)]
pub struct ValidatedApiKey {
    pub key_id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub scopes: Vec<String>,
}

/// Service for API key issuance and validation.
#[derive(Clone)]
pub struct ApiKeyService {
    pool: PgPool,
    hasher: PasswordHasher,
}

impl ApiKeyService {
    /// Create a new API key service.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hasher: PasswordHasher::new(),
        }
    }

    /// Issue a new key for the caller.
    ///
    /// Returns the row and the plaintext key. The plaintext exists only in
    /// this return value; the database keeps the hash.
    pub async fn create_api_key(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        name: &str,
        scopes: &[String],
    ) -> Result<(ApiKey, String), ApiAuthError> {
        if name.is_empty() {
            return Err(ApiAuthError::InvalidArgument(
                "Key name is required".to_string(),
            ));
        }

        let plaintext = generate_key_material();
        let key_hash = self
            .hasher
            .hash(&plaintext)
            .map_err(|e| ApiAuthError::Internal(format!("Key hashing failed: {e}")))?;

        let key = ApiKey::create(
            &self.pool,
            CreateApiKey {
                user_id,
                tenant_id,
                key_hash,
                name: name.to_string(),
                scopes: scopes.join(","),
                expires_at: Some(Utc::now() + Duration::days(KEY_VALIDITY_DAYS)),
            },
        )
        .await?;

        tracing::info!(key_id = %key.id, user_id = %user_id, "API key created");

        Ok((key, plaintext))
    }

    /// Validate a presented key against a requested scope.
    ///
    /// Returns `Ok(validated)` on success; `Err(Unauthenticated)` when no
    /// usable key matches; `Err(PermissionDenied)` naming the missing scope
    /// when the key is genuine but under-scoped.
    pub async fn validate_api_key(
        &self,
        plaintext: &str,
        requested_scope: &str,
    ) -> Result<ValidatedApiKey, ApiAuthError> {
        let candidates = ApiKey::find_usable(&self.pool).await?;

        let matched = candidates
            .into_iter()
            .find(|key| self.hasher.verify(plaintext, &key.key_hash));

        let Some(key) = matched else {
            return Err(ApiAuthError::Unauthenticated);
        };

        let scopes: Vec<String> = key.scope_list().iter().map(|s| s.to_string()).collect();

        if !scope_match(&scopes, requested_scope) {
            return Err(ApiAuthError::PermissionDenied(format!(
                "API key does not have required scope: {requested_scope}"
            )));
        }

        Ok(ValidatedApiKey {
            key_id: key.id,
            user_id: key.user_id,
            tenant_id: key.tenant_id,
            scopes,
        })
    }

    /// Revoke a key owned by the caller.
    ///
    /// # Errors
    ///
    /// `ApiAuthError::NotFound` when the key is absent, foreign, or already
    /// revoked.
    pub async fn revoke_api_key(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        key_id: Uuid,
    ) -> Result<(), ApiAuthError> {
        let affected = ApiKey::revoke(&self.pool, tenant_id, user_id, key_id).await?;

        if affected == 0 {
            return Err(ApiAuthError::NotFound("API key".to_string()));
        }

        tracing::info!(key_id = %key_id, user_id = %user_id, "API key revoked");
        Ok(())
    }
}

/// Generate `sk_`-prefixed key material from the OS CSPRNG.
fn generate_key_material() -> String {
    let mut bytes = [0u8; KEY_MATERIAL_BYTES];
    OsRng.fill_bytes(&mut bytes);
    format!("sk_{}", hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_material_shape() {
        let key = generate_key_material();
        assert!(key.starts_with("sk_"));
        assert_eq!(key.len(), 3 + 64);
        assert_ne!(key, generate_key_material());
    }

    // --- scope matching ---

    #[test]
    fn test_empty_grant_list_denies() {
        let granted: Vec<String> = Vec::new();
        assert!(!scope_match(&granted, "read:upload"));
    }

    #[test]
    fn test_empty_request_denies() {
        assert!(!scope_match(&["*"], ""));
        assert!(!scope_match(&["read:*"], ""));
    }

    #[test]
    fn test_exact_match() {
        assert!(scope_match(&["write:upload"], "write:upload"));
        assert!(!scope_match(&["write:upload"], "write:payment"));
    }

    #[test]
    fn test_exact_match_is_case_sensitive() {
        assert!(!scope_match(&["Read:Upload"], "read:upload"));
    }

    #[test]
    fn test_whitespace_is_not_trimmed() {
        assert!(!scope_match(&[" read:upload"], "read:upload"));
        assert!(!scope_match(&["read:upload"], "read:upload "));
    }

    #[test]
    fn test_trailing_wildcard_prefix() {
        assert!(scope_match(&["read:*"], "read:foo"));
        assert!(scope_match(&["read:*"], "read:anything"));
        assert!(!scope_match(&["read:*"], "write:foo"));
    }

    #[test]
    fn test_trailing_wildcard_requires_textual_prefix() {
        // "readfoo" does not start with "read:"
        assert!(!scope_match(&["read:*"], "readfoo"));
    }

    #[test]
    fn test_no_partial_prefix_without_wildcard() {
        assert!(!scope_match(&["read:upload"], "read:uploadfile"));
    }

    #[test]
    fn test_bare_star_matches_everything_nonempty() {
        assert!(scope_match(&["*"], "read:anything"));
        assert!(scope_match(&["*"], "x"));
        assert!(!scope_match(&["*"], ""));
    }

    #[test]
    fn test_internal_star_is_literal() {
        assert!(!scope_match(&["read:*:meta"], "read:foo:meta"));
        assert!(scope_match(&["read:*:meta"], "read:*:meta"));
    }

    #[test]
    fn test_any_grant_in_list_suffices() {
        let granted = ["read:*", "write:upload"];
        assert!(scope_match(&granted, "read:anything"));
        assert!(scope_match(&granted, "write:upload"));
        assert!(!scope_match(&granted, "write:payment"));
        assert!(!scope_match(&granted, "delete:upload"));
    }
}

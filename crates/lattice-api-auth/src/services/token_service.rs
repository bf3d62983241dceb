//! Token service: access-token minting and validation, opaque refresh
//! tokens, and the cache-resident bindings that make revocation instant.
//!
//! The access token is a 15-minute RS256 JWT carrying a 128-bit `jti`; its
//! revocation is a cache key (`blacklist:<jti>`) with the token's remaining
//! lifetime as TTL. The refresh token is opaque — `<user-id>:<256-bit hex>`
//! — and its security rests entirely on the single cache binding
//! `refresh:<user-id>`: at any instant at most one refresh token exists per
//! user.

use lattice_auth::{claims::AccessClaims, jwt, AuthError, ValidationConfig};
use lattice_cache::{keys, CacheClient};
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::Duration;
use uuid::Uuid;

use crate::error::ApiAuthError;

/// Access-token lifetime in seconds (15 minutes).
pub const ACCESS_TOKEN_VALIDITY_SECS: i64 = 900;

/// Random bytes in a refresh token (256 bits).
const REFRESH_TOKEN_BYTES: usize = 32;

/// Configuration for token generation and validation.
#[derive(Clone)]
pub struct TokenConfig {
    /// PEM-encoded RSA private key for signing access tokens.
    pub private_key_pem: Vec<u8>,
    /// PEM-encoded RSA public key for validating access tokens.
    pub public_key_pem: Vec<u8>,
    /// Token issuer (`iss` claim).
    pub issuer: String,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("private_key_pem", &"<redacted>")
            .field("public_key_pem", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

/// Service for access-token and refresh-token primitives.
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
    cache: CacheClient,
}

impl TokenService {
    /// Create a new token service.
    #[must_use]
    pub fn new(config: TokenConfig, cache: CacheClient) -> Self {
        Self { config, cache }
    }

    /// Mint a signed access token for a user.
    pub fn create_access_token(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        email: Option<String>,
        roles: Vec<String>,
    ) -> Result<String, ApiAuthError> {
        let mut builder = AccessClaims::builder()
            .subject(user_id.to_string())
            .tenant_uuid(tenant_id)
            .issuer(&self.config.issuer)
            .roles(roles)
            .expires_in_secs(ACCESS_TOKEN_VALIDITY_SECS);

        if let Some(email) = email {
            builder = builder.email(email);
        }

        let claims = builder.build();

        jwt::encode_token(&claims, &self.config.private_key_pem).map_err(|e| {
            tracing::error!("Failed to encode access token: {e}");
            ApiAuthError::Internal(format!("Token generation error: {e}"))
        })
    }

    /// Generate an opaque refresh token: `<user-id>:<256-bit hex>`.
    ///
    /// Generated from the OS CSPRNG; UUIDs are not used because they are not
    /// designed for cryptographic unguessability.
    #[must_use]
    pub fn generate_refresh_token(user_id: Uuid) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        format!("{user_id}:{}", hex::encode(bytes))
    }

    /// Parse a refresh token into its user id and random part.
    ///
    /// Returns `None` when the colon separator is missing or the user id is
    /// not a UUID.
    #[must_use]
    pub fn parse_refresh_token(token: &str) -> Option<(Uuid, &str)> {
        let (user_part, random_part) = token.split_once(':')?;
        let user_id: Uuid = user_part.parse().ok()?;
        Some((user_id, random_part))
    }

    /// Store the refresh binding for a user with the 30-day TTL, replacing
    /// any prior binding.
    pub async fn store_refresh_binding(
        &self,
        user_id: Uuid,
        refresh_token: &str,
    ) -> Result<(), ApiAuthError> {
        self.cache
            .set_with_ttl(
                &keys::refresh(&user_id.to_string()),
                refresh_token,
                keys::REFRESH_TTL,
            )
            .await?;
        Ok(())
    }

    /// Rotate the refresh binding: delete the old key, then insert the new
    /// token under the same key with a fresh TTL.
    ///
    /// The order matters: a crash between the two operations leaves the user
    /// logged out rather than holding two valid refresh tokens.
    pub async fn rotate_refresh_binding(
        &self,
        user_id: Uuid,
        new_refresh_token: &str,
    ) -> Result<(), ApiAuthError> {
        let key = keys::refresh(&user_id.to_string());
        self.cache.delete(&key).await?;
        self.cache
            .set_with_ttl(&key, new_refresh_token, keys::REFRESH_TTL)
            .await?;
        Ok(())
    }

    /// Load the stored refresh binding for a user.
    pub async fn load_refresh_binding(
        &self,
        user_id: Uuid,
    ) -> Result<Option<String>, ApiAuthError> {
        Ok(self.cache.get(&keys::refresh(&user_id.to_string())).await?)
    }

    /// Drop the refresh binding for a user. Used by logout and by reuse
    /// detection; deleting an absent binding succeeds.
    pub async fn revoke_refresh_binding(&self, user_id: Uuid) -> Result<(), ApiAuthError> {
        self.cache
            .delete(&keys::refresh(&user_id.to_string()))
            .await?;
        Ok(())
    }

    /// Validate an access token: signature, issuer, expiry, and the jti
    /// blacklist.
    ///
    /// Every validation failure collapses to `Unauthenticated` — callers
    /// learn that the bytes are not a token, never why.
    pub async fn validate_access(&self, token: &str) -> Result<AccessClaims, ApiAuthError> {
        let claims = self
            .decode(token)
            .map_err(|_| ApiAuthError::Unauthenticated)?;

        if self.cache.is_jti_blacklisted(&claims.jti).await? {
            tracing::debug!(jti = %claims.jti, "Rejected blacklisted access token");
            return Err(ApiAuthError::Unauthenticated);
        }

        Ok(claims)
    }

    /// Decode and verify an access token without consulting the blacklist.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, AuthError> {
        jwt::decode_token(
            token,
            &self.config.public_key_pem,
            &ValidationConfig::new(&self.config.issuer),
        )
    }

    /// Blacklist a presented access token for its remaining lifetime.
    ///
    /// An invalid or already-expired token is ignored: there is nothing left
    /// to revoke, and logout stays idempotent.
    pub async fn blacklist_access_token(&self, token: &str) -> Result<(), ApiAuthError> {
        let Ok(claims) = self.decode(token) else {
            return Ok(());
        };

        let remaining = claims.remaining_lifetime_secs();
        if claims.jti.is_empty() || remaining <= 0 {
            return Ok(());
        }

        self.cache
            .blacklist_jti(&claims.jti, Duration::from_secs(remaining as u64))
            .await?;

        tracing::info!(jti = %claims.jti, ttl_secs = remaining, "Access token blacklisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_shape() {
        let user_id = Uuid::new_v4();
        let token = TokenService::generate_refresh_token(user_id);

        let (parsed_user, random) = TokenService::parse_refresh_token(&token).unwrap();
        assert_eq!(parsed_user, user_id);
        assert_eq!(random.len(), 64);
        assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let user_id = Uuid::new_v4();
        assert_ne!(
            TokenService::generate_refresh_token(user_id),
            TokenService::generate_refresh_token(user_id)
        );
    }

    #[test]
    fn test_parse_rejects_missing_colon() {
        assert!(TokenService::parse_refresh_token("deadbeef").is_none());
        assert!(TokenService::parse_refresh_token("").is_none());
    }

    #[test]
    fn test_parse_rejects_non_uuid_user() {
        assert!(TokenService::parse_refresh_token("not-a-uuid:deadbeef").is_none());
    }

    #[test]
    fn test_parse_keeps_random_part_verbatim() {
        let user_id = Uuid::new_v4();
        let token = format!("{user_id}:abc:def");
        // Only the first colon splits; the rest belongs to the random part.
        let (_, random) = TokenService::parse_refresh_token(&token).unwrap();
        assert_eq!(random, "abc:def");
    }
}

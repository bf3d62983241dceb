//! OAuth account linking.
//!
//! The provider exchange is a collaborator behind [`OAuthProvider`]; this
//! service owns the CSRF state lifecycle (256-bit nonce, 600 s TTL,
//! consumed on first successful callback), the link-or-create decision, and
//! token issuance.

use async_trait::async_trait;
use rand::rngs::OsRng;
use rand::RngCore;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use lattice_cache::{keys, CacheClient};
use lattice_db::models::{OauthAccount, User};

use crate::error::ApiAuthError;
use crate::services::auth_service::{AuthService, TokenPair};

/// Providers the platform can link against.
const SUPPORTED_PROVIDERS: [&str; 3] = ["google", "github", "microsoft"];

/// State nonce bytes (256 bits).
const STATE_BYTES: usize = 32;

/// Identity reported by a provider after a successful code exchange.
#[derive(Debug, Clone)]
pub struct ProviderIdentity {
    pub provider_user_id: String,
    pub email: String,
}

/// External collaborator performing the provider-side exchange.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Build the provider authorization URL with the state embedded.
    fn authorization_url(&self, provider: &str, redirect_uri: &str, state: &str) -> String;

    /// Exchange an authorization code for the provider-side identity.
    async fn exchange_code(
        &self,
        provider: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<ProviderIdentity, ApiAuthError>;
}

/// Deterministic provider for tests and non-production environments.
///
/// Accepts any code and derives the provider-side identity from it, so
/// fixtures can steer link-vs-create without network access.
#[derive(Default)]
pub struct MockOAuthProvider;

impl MockOAuthProvider {
    /// Create a new mock provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OAuthProvider for MockOAuthProvider {
    fn authorization_url(&self, provider: &str, redirect_uri: &str, state: &str) -> String {
        match provider {
            "google" => format!(
                "https://accounts.google.com/o/oauth2/v2/auth?client_id=MOCK&redirect_uri={redirect_uri}&response_type=code&scope=email%20profile&state={state}"
            ),
            "github" => format!(
                "https://github.com/login/oauth/authorize?client_id=MOCK&redirect_uri={redirect_uri}&scope=user:email&state={state}"
            ),
            _ => format!(
                "https://login.microsoftonline.com/common/oauth2/v2.0/authorize?client_id=MOCK&redirect_uri={redirect_uri}&response_type=code&scope=openid%20email%20profile&state={state}"
            ),
        }
    }

    async fn exchange_code(
        &self,
        provider: &str,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<ProviderIdentity, ApiAuthError> {
        Ok(ProviderIdentity {
            provider_user_id: format!("oauth_{provider}_{code}"),
            email: format!("{code}@{provider}.example"),
        })
    }
}

/// Result of a completed OAuth callback.
#[derive(Debug)]
pub struct OAuthLogin {
    pub tokens: TokenPair,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub is_new_user: bool,
}

/// Service for the OAuth initiation/callback pair.
#[derive(Clone)]
pub struct OAuthService {
    pool: PgPool,
    cache: CacheClient,
    auth: AuthService,
    provider: Arc<dyn OAuthProvider>,
    /// Tenant that first-sight federated users are created under.
    default_tenant_id: Uuid,
}

impl OAuthService {
    /// Create a new OAuth service.
    #[must_use]
    pub fn new(
        pool: PgPool,
        cache: CacheClient,
        auth: AuthService,
        provider: Arc<dyn OAuthProvider>,
        default_tenant_id: Uuid,
    ) -> Self {
        Self {
            pool,
            cache,
            auth,
            provider,
            default_tenant_id,
        }
    }

    /// Begin an OAuth flow: mint a state nonce and return the authorization
    /// URL with the state embedded.
    pub async fn initiate(
        &self,
        provider: &str,
        redirect_uri: &str,
    ) -> Result<(String, String), ApiAuthError> {
        if !SUPPORTED_PROVIDERS.contains(&provider) {
            return Err(ApiAuthError::InvalidArgument(format!(
                "Unsupported OAuth provider: {provider}"
            )));
        }

        let state = generate_state();
        self.cache
            .set_with_ttl(&keys::oauth_state(&state), provider, keys::OAUTH_STATE_TTL)
            .await?;

        let url = self
            .provider
            .authorization_url(provider, redirect_uri, &state);

        Ok((url, state))
    }

    /// Complete an OAuth flow.
    ///
    /// The state must exist in the cache and carry the presented provider;
    /// it is consumed before the code exchange. An unknown (provider,
    /// provider-user-id) pair creates a federated-only user (NULL password
    /// hash) under the default tenant and links it.
    pub async fn callback(
        &self,
        provider: &str,
        state: &str,
        code: &str,
        redirect_uri: &str,
    ) -> Result<OAuthLogin, ApiAuthError> {
        let state_key = keys::oauth_state(state);
        let stored_provider = self.cache.get(&state_key).await?;

        match stored_provider.as_deref() {
            Some(stored) if stored == provider => {}
            _ => {
                tracing::warn!(
                    target: "security",
                    provider,
                    "Rejected OAuth callback with missing or mismatched state"
                );
                return Err(ApiAuthError::PermissionDenied(
                    "Invalid OAuth state parameter".to_string(),
                ));
            }
        }

        // Consumed on first successful verification.
        self.cache.delete(&state_key).await?;

        let identity = self
            .provider
            .exchange_code(provider, code, redirect_uri)
            .await?;

        let existing =
            OauthAccount::find_linked_user(&self.pool, provider, &identity.provider_user_id)
                .await?;

        let (user, is_new_user) = match existing {
            Some(user) => (user, false),
            None => {
                let mut tx = self.pool.begin().await?;
                let user =
                    User::create_federated(&mut *tx, self.default_tenant_id, &identity.email)
                        .await?;
                OauthAccount::link(&mut *tx, user.id, provider, &identity.provider_user_id)
                    .await?;
                tx.commit().await?;

                tracing::info!(
                    user_id = %user.id,
                    provider,
                    "Created federated user on first OAuth sight"
                );

                (user, true)
            }
        };

        let tokens = self.auth.issue_session(&user).await?;

        Ok(OAuthLogin {
            user_id: user.id,
            tenant_id: user.tenant_id,
            tokens,
            is_new_user,
        })
    }
}

/// Generate a 256-bit hex state nonce.
fn generate_state() -> String {
    let mut bytes = [0u8; STATE_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_256_bit_hex() {
        let state = generate_state();
        assert_eq!(state.len(), 64);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(state, generate_state());
    }

    #[test]
    fn test_mock_authorization_url_embeds_state() {
        let provider = MockOAuthProvider::new();
        let url = provider.authorization_url("google", "https://app.example/cb", "abc123");
        assert!(url.contains("state=abc123"));
        assert!(url.contains("accounts.google.com"));
    }

    #[tokio::test]
    async fn test_mock_exchange_is_deterministic() {
        let provider = MockOAuthProvider::new();
        let a = provider
            .exchange_code("github", "code-1", "https://app.example/cb")
            .await
            .unwrap();
        let b = provider
            .exchange_code("github", "code-1", "https://app.example/cb")
            .await
            .unwrap();

        assert_eq!(a.provider_user_id, b.provider_user_id);
        assert_eq!(a.provider_user_id, "oauth_github_code-1");
    }
}

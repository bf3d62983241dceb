//! Core login/logout/refresh flows.
//!
//! Login performs the full credential ladder: user lookup (soft-deleted
//! users are invisible), password verification with a neutral failure
//! message, TOTP with backup-code fallback, then token issuance with the
//! refresh binding stored under `refresh:<user-id>`.
//!
//! Refresh implements rotation with reuse detection: presenting a token
//! that differs from the stored binding is treated as theft — the binding
//! is destroyed, a security event is logged, and no session is issued.

use lattice_auth::{totp, PasswordHasher};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use lattice_db::models::{BackupCode, User};

use crate::error::ApiAuthError;
use crate::services::token_service::{TokenService, ACCESS_TOKEN_VALIDITY_SECS};

/// TOTP validation window (current period ± 1).
const TOTP_WINDOW: u8 = 1;

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

/// Service for the credential-to-session exchange.
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    tokens: TokenService,
    hasher: PasswordHasher,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub fn new(pool: PgPool, tokens: TokenService) -> Self {
        Self {
            pool,
            tokens,
            hasher: PasswordHasher::new(),
        }
    }

    /// Access to the underlying token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Authenticate with email + password (+ optional TOTP code) and issue a
    /// session.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        totp_code: Option<&str>,
    ) -> Result<TokenPair, ApiAuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(ApiAuthError::InvalidArgument(
                "Email and password required".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let user = User::find_by_email(&mut *tx, email)
            .await?
            .ok_or(ApiAuthError::InvalidCredentials)?;

        match &user.password_hash {
            // Federated-only account: the password path never grants a
            // session here. The OAuth callback issues tokens directly.
            None => return Err(ApiAuthError::OAuthOnlyAccount),
            Some(hash) => {
                if !self.hasher.verify(password, hash) {
                    // Same message as the unknown-email case.
                    return Err(ApiAuthError::InvalidCredentials);
                }
            }
        }

        if let Some(secret) = &user.totp_secret {
            let code = totp_code
                .filter(|c| !c.is_empty())
                .ok_or(ApiAuthError::TotpRequired)?;

            if !totp::validate(secret, code, TOTP_WINDOW) {
                // Fall back to the unused backup codes; the first match is
                // consumed inside this transaction so the code burn and the
                // login commit together.
                let codes = BackupCode::find_unused(&mut *tx, user.id).await?;
                let matched = codes
                    .iter()
                    .find(|c| totp::verify_backup_code(code, &c.code_hash));

                match matched {
                    Some(backup) => {
                        BackupCode::mark_used(&mut *tx, user.id, &backup.code_hash).await?;
                        tracing::info!(user_id = %user.id, "Login via backup code");
                    }
                    None => return Err(ApiAuthError::InvalidTotpCode),
                }
            }
        }

        let pair = self.issue_session(&user).await?;

        // The refresh binding is written before the commit: if the cache
        // write fails, the transaction (and any consumed backup code) rolls
        // back and the code stays unused.
        tx.commit().await?;

        tracing::info!(user_id = %user.id, tenant_id = %user.tenant_id, "Login succeeded");

        Ok(pair)
    }

    /// Invalidate a session.
    ///
    /// Deletes the refresh binding unconditionally, and blacklists the
    /// attached access token for its remaining lifetime so revocation is
    /// instant. Idempotent: an already-invalid refresh token still yields
    /// success.
    pub async fn logout(
        &self,
        refresh_token: &str,
        bearer_access_token: Option<&str>,
    ) -> Result<(), ApiAuthError> {
        let (user_id, _) = TokenService::parse_refresh_token(refresh_token).ok_or_else(|| {
            ApiAuthError::InvalidArgument("Invalid refresh token format".to_string())
        })?;

        self.tokens.revoke_refresh_binding(user_id).await?;

        if let Some(token) = bearer_access_token {
            self.tokens.blacklist_access_token(token).await?;
        }

        tracing::info!(user_id = %user_id, "Logout");
        Ok(())
    }

    /// Exchange a refresh token for a new session, rotating the binding.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiAuthError> {
        let (user_id, _) = TokenService::parse_refresh_token(refresh_token)
            .ok_or(ApiAuthError::Unauthenticated)?;

        let stored = self
            .tokens
            .load_refresh_binding(user_id)
            .await?
            .ok_or(ApiAuthError::Unauthenticated)?;

        if stored != refresh_token {
            // A different token is bound: the presented one was rotated out
            // and is being replayed. Revoke everything.
            tracing::warn!(
                target: "security",
                user_id = %user_id,
                "SECURITY ALERT: refresh token reuse detected; revoking all sessions"
            );
            self.tokens.revoke_refresh_binding(user_id).await?;
            return Err(ApiAuthError::TokenReuseDetected);
        }

        let user = match User::find_by_id(&self.pool, user_id).await? {
            Some(user) => user,
            None => {
                // Deleted since the binding was written; clean up and deny.
                self.tokens.revoke_refresh_binding(user_id).await?;
                return Err(ApiAuthError::Unauthenticated);
            }
        };

        let access_token = self.tokens.create_access_token(
            user.id,
            user.tenant_id,
            Some(user.email.clone()),
            Vec::new(),
        )?;
        let new_refresh_token = TokenService::generate_refresh_token(user.id);

        // Delete-then-insert: a crash between the two leaves the user logged
        // out, never double-valid.
        self.tokens
            .rotate_refresh_binding(user.id, &new_refresh_token)
            .await?;

        tracing::info!(user_id = %user.id, "Refresh token rotated");

        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh_token,
            expires_in: ACCESS_TOKEN_VALIDITY_SECS,
        })
    }

    /// Issue a session for an already-authenticated user (login and the
    /// OAuth callback path).
    pub async fn issue_session(&self, user: &User) -> Result<TokenPair, ApiAuthError> {
        let access_token = self.tokens.create_access_token(
            user.id,
            user.tenant_id,
            Some(user.email.clone()),
            Vec::new(),
        )?;
        let refresh_token = TokenService::generate_refresh_token(user.id);

        self.tokens
            .store_refresh_binding(user.id, &refresh_token)
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: ACCESS_TOKEN_VALIDITY_SECS,
        })
    }

    /// Report whether a presented access token is valid, with its claims.
    ///
    /// Never errors on bad input: the answer is uniformly "invalid" with no
    /// cause, so the endpoint is not a validation oracle.
    pub async fn validate_token(
        &self,
        token: &str,
    ) -> Option<(Uuid, Option<Uuid>, Vec<String>)> {
        let claims = self.tokens.validate_access(token).await.ok()?;
        let user_id: Uuid = claims.sub.parse().ok()?;
        Some((user_id, claims.tenant_id, claims.roles))
    }
}

//! Shared state for the auth API.

use crate::services::api_key_service::ApiKeyService;
use crate::services::auth_service::AuthService;
use crate::services::mfa_service::MfaService;
use crate::services::oauth_service::OAuthService;
use crate::services::otp_service::OtpService;
use crate::services::token_service::TokenService;

/// All auth-engine services, cloned into each handler.
#[derive(Clone)]
pub struct AuthState {
    pub auth: AuthService,
    pub tokens: TokenService,
    pub api_keys: ApiKeyService,
    pub mfa: MfaService,
    pub otp: OtpService,
    pub oauth: OAuthService,
}

//! # lattice-api-auth
//!
//! The authentication engine: credential-to-session exchange with instant
//! revocation, refresh rotation with reuse detection, API keys with scope
//! matching, TOTP enrollment with single-use backup codes, email OTP, and
//! OAuth account linking.
//!
//! Services hold the logic; the axum handlers in [`handlers`] are thin
//! adapters, and [`middleware`] binds the validated tenant context to every
//! protected call before a handler runs.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod router;
pub mod services;
pub mod state;

pub use error::{ApiAuthError, ProblemDetails};
pub use middleware::auth_middleware;
pub use router::auth_router;
pub use services::api_key_service::{scope_match, ApiKeyService, ValidatedApiKey};
pub use services::auth_service::{AuthService, TokenPair};
pub use services::mfa_service::{MfaService, TotpEnrollment};
pub use services::oauth_service::{
    MockOAuthProvider, OAuthLogin, OAuthProvider, OAuthService, ProviderIdentity,
};
pub use services::otp_service::{MockOtpMailer, OtpMailer, OtpService, SendOtpResult};
pub use services::token_service::{TokenConfig, TokenService};
pub use state::AuthState;

//! Router assembly for the auth API.

use axum::{
    middleware,
    routing::{delete, post},
    Router,
};

use crate::handlers::{api_keys, auth, mfa, oauth, otp};
use crate::middleware::auth_middleware;
use crate::state::AuthState;

/// Build the auth API router.
///
/// Session, OTP, OAuth, and validation endpoints are public (they establish
/// identity); key management and TOTP management require a validated
/// context and sit behind the bearer middleware.
pub fn auth_router(state: AuthState) -> Router {
    let public = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/validate", post(auth::validate_token))
        .route("/auth/api-keys/validate", post(api_keys::validate_api_key))
        .route("/auth/otp/send", post(otp::send_otp))
        .route("/auth/otp/verify", post(otp::verify_otp))
        .route("/auth/oauth/initiate", post(oauth::initiate_oauth))
        .route("/auth/oauth/callback", post(oauth::oauth_callback));

    let protected = Router::new()
        .route("/auth/api-keys", post(api_keys::create_api_key))
        .route("/auth/api-keys/:id", delete(api_keys::revoke_api_key))
        .route("/auth/totp/enroll", post(mfa::enroll_totp))
        .route("/auth/totp/verify", post(mfa::verify_totp))
        .route("/auth/totp/disable", post(mfa::disable_totp))
        .route("/auth/totp/backup-codes", post(mfa::regenerate_backup_codes))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    public.merge(protected).with_state(state)
}

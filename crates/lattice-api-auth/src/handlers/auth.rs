//! Session endpoints: login, logout, refresh, validate.

use axum::{extract::State, http::HeaderMap, Json};

use lattice_tenant::bearer_token;

use crate::error::ApiAuthError;
use crate::models::requests::{
    LoginRequest, LogoutRequest, RefreshRequest, SuccessResponse, TokenResponse,
    ValidateTokenRequest, ValidateTokenResponse,
};
use crate::state::AuthState;

/// POST /auth/login
///
/// Password (+ optional TOTP) login. Returns a token pair with
/// `expires_in` equal to the access-token lifetime.
pub async fn login(
    State(state): State<AuthState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiAuthError> {
    let pair = state
        .auth
        .login(
            &request.email,
            &request.password,
            request.totp_code.as_deref(),
        )
        .await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer",
        expires_in: pair.expires_in,
    }))
}

/// POST /auth/logout
///
/// Deletes the refresh binding and blacklists the attached access token.
/// Idempotent: an already-invalid refresh token still yields success.
pub async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<SuccessResponse>, ApiAuthError> {
    let bearer = bearer_token(&headers);

    state.auth.logout(&request.refresh_token, bearer).await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /auth/refresh
///
/// Rotates the refresh token. Reuse of a rotated-out token revokes all
/// sessions and fails with permission-denied.
pub async fn refresh(
    State(state): State<AuthState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiAuthError> {
    let pair = state.auth.refresh(&request.refresh_token).await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer",
        expires_in: pair.expires_in,
    }))
}

/// POST /auth/validate
///
/// Reports whether a presented access token is valid. Always 200; the body
/// says valid or not with no cause, so this is not a validation oracle.
pub async fn validate_token(
    State(state): State<AuthState>,
    Json(request): Json<ValidateTokenRequest>,
) -> Json<ValidateTokenResponse> {
    match state.auth.validate_token(&request.access_token).await {
        Some((user_id, tenant_id, roles)) => Json(ValidateTokenResponse {
            valid: true,
            user_id: Some(user_id),
            tenant_id,
            roles,
        }),
        None => Json(ValidateTokenResponse {
            valid: false,
            user_id: None,
            tenant_id: None,
            roles: Vec::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    // Handler tests require integration test setup
}

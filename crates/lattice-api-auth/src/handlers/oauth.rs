//! OAuth endpoints.

use axum::{extract::State, Json};

use crate::error::ApiAuthError;
use crate::models::requests::{
    InitiateOAuthRequest, InitiateOAuthResponse, OAuthCallbackRequest, OAuthCallbackResponse,
};
use crate::state::AuthState;

/// POST /auth/oauth/initiate
///
/// Mint a CSRF state nonce and return the provider authorization URL.
pub async fn initiate_oauth(
    State(state): State<AuthState>,
    Json(request): Json<InitiateOAuthRequest>,
) -> Result<Json<InitiateOAuthResponse>, ApiAuthError> {
    let (authorization_url, oauth_state) = state
        .oauth
        .initiate(&request.provider, &request.redirect_uri)
        .await?;

    Ok(Json(InitiateOAuthResponse {
        authorization_url,
        state: oauth_state,
    }))
}

/// POST /auth/oauth/callback
///
/// Verify and consume the state, exchange the code, link or create the
/// user, and issue a session.
pub async fn oauth_callback(
    State(state): State<AuthState>,
    Json(request): Json<OAuthCallbackRequest>,
) -> Result<Json<OAuthCallbackResponse>, ApiAuthError> {
    let login = state
        .oauth
        .callback(
            &request.provider,
            &request.state,
            &request.code,
            &request.redirect_uri,
        )
        .await?;

    Ok(Json(OAuthCallbackResponse {
        access_token: login.tokens.access_token,
        refresh_token: login.tokens.refresh_token,
        expires_in: login.tokens.expires_in,
        user_id: login.user_id,
        tenant_id: login.tenant_id,
        is_new_user: login.is_new_user,
    }))
}

#[cfg(test)]
mod tests {
    // Handler tests require integration test setup
}

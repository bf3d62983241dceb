//! API key endpoints.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use lattice_tenant::RequestContext;

use crate::error::ApiAuthError;
use crate::models::requests::{
    CreateApiKeyRequest, CreateApiKeyResponse, SuccessResponse, ValidateApiKeyRequest,
    ValidateApiKeyResponse,
};
use crate::state::AuthState;

/// POST /auth/api-keys
///
/// Issue a new key for the caller. The plaintext key appears only in this
/// response.
pub async fn create_api_key(
    State(state): State<AuthState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<CreateApiKeyRequest>,
) -> Result<Json<CreateApiKeyResponse>, ApiAuthError> {
    let (user_id, tenant_id) = ctx.authority().ok_or(ApiAuthError::Unauthenticated)?;

    let (key, plaintext) = state
        .api_keys
        .create_api_key(
            *user_id.as_uuid(),
            *tenant_id.as_uuid(),
            &request.name,
            &request.scopes,
        )
        .await?;

    Ok(Json(CreateApiKeyResponse {
        key_id: key.id,
        api_key: plaintext,
        name: key.name,
        expires_at: key.expires_at,
    }))
}

/// DELETE /auth/api-keys/:id
///
/// Revoke a key owned by the caller.
pub async fn revoke_api_key(
    State(state): State<AuthState>,
    Extension(ctx): Extension<RequestContext>,
    Path(key_id): Path<Uuid>,
) -> Result<Json<SuccessResponse>, ApiAuthError> {
    let (user_id, tenant_id) = ctx.authority().ok_or(ApiAuthError::Unauthenticated)?;

    state
        .api_keys
        .revoke_api_key(*user_id.as_uuid(), *tenant_id.as_uuid(), key_id)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /auth/api-keys/validate
///
/// Service-to-service validation of a presented key against a requested
/// scope. Always 200; the body reports validity and, on a scope denial,
/// names the missing scope.
pub async fn validate_api_key(
    State(state): State<AuthState>,
    Json(request): Json<ValidateApiKeyRequest>,
) -> Json<ValidateApiKeyResponse> {
    match state
        .api_keys
        .validate_api_key(&request.api_key, &request.requested_scope)
        .await
    {
        Ok(validated) => Json(ValidateApiKeyResponse {
            valid: true,
            message: "API key valid".to_string(),
            user_id: Some(validated.user_id),
            tenant_id: Some(validated.tenant_id),
            scopes: validated.scopes,
        }),
        Err(ApiAuthError::PermissionDenied(message)) => Json(ValidateApiKeyResponse {
            valid: false,
            message,
            user_id: None,
            tenant_id: None,
            scopes: Vec::new(),
        }),
        Err(_) => Json(ValidateApiKeyResponse {
            valid: false,
            message: "Invalid API key".to_string(),
            user_id: None,
            tenant_id: None,
            scopes: Vec::new(),
        }),
    }
}

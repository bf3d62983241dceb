//! TOTP endpoints.

use axum::{extract::State, Extension, Json};

use lattice_tenant::RequestContext;

use crate::error::ApiAuthError;
use crate::models::requests::{
    BackupCodesResponse, DisableTotpRequest, EnrollTotpResponse, SuccessResponse,
    VerifyTotpRequest, VerifyTotpResponse,
};
use crate::state::AuthState;

/// POST /auth/totp/enroll
///
/// Enroll the caller in TOTP. The secret and plaintext backup codes appear
/// only in this response.
pub async fn enroll_totp(
    State(state): State<AuthState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<EnrollTotpResponse>, ApiAuthError> {
    let (user_id, _) = ctx.authority().ok_or(ApiAuthError::Unauthenticated)?;

    let enrollment = state.mfa.enroll(*user_id.as_uuid()).await?;

    Ok(Json(EnrollTotpResponse {
        secret: enrollment.secret,
        provisioning_uri: enrollment.provisioning_uri,
        backup_codes: enrollment.backup_codes,
    }))
}

/// POST /auth/totp/verify
///
/// Verify a code against the caller's enrolled secret.
pub async fn verify_totp(
    State(state): State<AuthState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<VerifyTotpRequest>,
) -> Result<Json<VerifyTotpResponse>, ApiAuthError> {
    let (user_id, _) = ctx.authority().ok_or(ApiAuthError::Unauthenticated)?;

    let valid = state
        .mfa
        .verify(*user_id.as_uuid(), &request.totp_code)
        .await?;

    Ok(Json(VerifyTotpResponse { valid }))
}

/// POST /auth/totp/disable
///
/// Disable TOTP; requires re-verification of the caller's password.
pub async fn disable_totp(
    State(state): State<AuthState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<DisableTotpRequest>,
) -> Result<Json<SuccessResponse>, ApiAuthError> {
    let (user_id, _) = ctx.authority().ok_or(ApiAuthError::Unauthenticated)?;

    state
        .mfa
        .disable(*user_id.as_uuid(), &request.password)
        .await?;

    Ok(Json(SuccessResponse { success: true }))
}

/// POST /auth/totp/backup-codes
///
/// Replace all backup codes. The new plaintext codes appear only in this
/// response.
pub async fn regenerate_backup_codes(
    State(state): State<AuthState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<BackupCodesResponse>, ApiAuthError> {
    let (user_id, _) = ctx.authority().ok_or(ApiAuthError::Unauthenticated)?;

    let backup_codes = state
        .mfa
        .regenerate_backup_codes(*user_id.as_uuid())
        .await?;

    Ok(Json(BackupCodesResponse { backup_codes }))
}

#[cfg(test)]
mod tests {
    // Handler tests require integration test setup
}

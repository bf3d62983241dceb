//! Email OTP endpoints.

use axum::{extract::State, Json};

use crate::error::ApiAuthError;
use crate::models::requests::{
    SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse,
};
use crate::state::AuthState;

/// POST /auth/otp/send
///
/// Generate and send a 6-digit code. A rate-limited request reports
/// `success = false` without revealing whether the address exists.
pub async fn send_otp(
    State(state): State<AuthState>,
    Json(request): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, ApiAuthError> {
    let result = state.otp.send_otp(&request.email, &request.purpose).await?;

    Ok(Json(SendOtpResponse {
        success: result.sent,
        message: result.message,
        expires_at: result.expires_at,
    }))
}

/// POST /auth/otp/verify
///
/// Verify a code; an exact match consumes it.
pub async fn verify_otp(
    State(state): State<AuthState>,
    Json(request): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, ApiAuthError> {
    let valid = state
        .otp
        .verify_otp(&request.email, &request.otp_code, &request.purpose)
        .await?;

    Ok(Json(VerifyOtpResponse { valid }))
}

#[cfg(test)]
mod tests {
    // Handler tests require integration test setup
}

//! Email-mediated one-time codes.
//!
//! Codes live only in the cache (`otp:<email>:<purpose>`, 600 s) and are
//! consumed on first successful verification. Sends are limited to three
//! per address per minute; when the rate counter cannot be read because the
//! cache is down, the limiter deliberately fails open and logs — blocking
//! every login over a cache blip is the worse failure mode.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

use lattice_cache::{keys, CacheClient};

use crate::error::ApiAuthError;

/// Result of an OTP send request.
///
/// `sent = false` covers the rate-limited case without telling the caller
/// anything about whether the address exists.
#[derive(Debug, Clone)]
pub struct SendOtpResult {
    pub sent: bool,
    pub message: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Hands a generated code to the external mail transport.
#[async_trait]
pub trait OtpMailer: Send + Sync {
    /// Deliver a plaintext code to an address for a purpose.
    async fn send_code(&self, email: &str, code: &str, purpose: &str);
}

/// Recording mailer for tests and non-production environments.
#[derive(Default)]
pub struct MockOtpMailer {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl MockOtpMailer {
    /// Create a new recording mailer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every (email, code, purpose) handed to the transport, in order.
    #[must_use]
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl OtpMailer for MockOtpMailer {
    async fn send_code(&self, email: &str, code: &str, purpose: &str) {
        self.sent
            .lock()
            .push((email.to_string(), code.to_string(), purpose.to_string()));
    }
}

/// Service for sending and verifying email OTPs.
#[derive(Clone)]
pub struct OtpService {
    cache: CacheClient,
    mailer: Arc<dyn OtpMailer>,
}

impl OtpService {
    /// Create a new OTP service.
    #[must_use]
    pub fn new(cache: CacheClient, mailer: Arc<dyn OtpMailer>) -> Self {
        Self { cache, mailer }
    }

    /// Generate and send a 6-digit code.
    ///
    /// Rate limit: [`keys::OTP_RATE_MAX`] sends per address per
    /// [`keys::OTP_RATE_WINDOW`]. A rate-limited request reports
    /// `sent = false` without revealing whether the address exists.
    pub async fn send_otp(&self, email: &str, purpose: &str) -> Result<SendOtpResult, ApiAuthError> {
        if email.is_empty() {
            return Err(ApiAuthError::InvalidArgument(
                "Email is required".to_string(),
            ));
        }

        match self
            .cache
            .increment_with_ttl(&keys::otp_rate(email), keys::OTP_RATE_WINDOW)
            .await
        {
            Ok(count) if count > keys::OTP_RATE_MAX => {
                return Ok(SendOtpResult {
                    sent: false,
                    message: "Too many OTP requests. Please try again later.".to_string(),
                    expires_at: None,
                });
            }
            Ok(_) => {}
            Err(e) => {
                // Fail-open: the limiter is best-effort by design.
                tracing::warn!(error = %e, "OTP rate counter unavailable; allowing request");
            }
        }

        let code = generate_code();
        self.cache
            .set_with_ttl(&keys::otp(email, purpose), &code, keys::OTP_TTL)
            .await?;

        self.mailer.send_code(email, &code, purpose).await;

        let expires_at = Utc::now() + chrono::Duration::from_std(keys::OTP_TTL).expect("fits");

        tracing::info!(purpose, "OTP sent");

        Ok(SendOtpResult {
            sent: true,
            message: "OTP sent successfully".to_string(),
            expires_at: Some(expires_at),
        })
    }

    /// Verify a code; an exact match consumes it.
    pub async fn verify_otp(
        &self,
        email: &str,
        code: &str,
        purpose: &str,
    ) -> Result<bool, ApiAuthError> {
        let key = keys::otp(email, purpose);

        let Some(stored) = self.cache.get(&key).await? else {
            return Ok(false);
        };

        if stored != code {
            return Ok(false);
        }

        self.cache.delete(&key).await?;
        Ok(true)
    }
}

/// Generate a uniformly random 6-digit code.
fn generate_code() -> String {
    // Rejection-sample to keep the distribution uniform over 000000-999999.
    loop {
        let mut bytes = [0u8; 4];
        OsRng.fill_bytes(&mut bytes);
        let value = u32::from_be_bytes(bytes);
        if value < 4_000_000_000 {
            return format!("{:06}", value % 1_000_000);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.bytes().all(|b| b.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_mock_mailer_records() {
        let mailer = MockOtpMailer::new();
        mailer.send_code("u@x.io", "123456", "login").await;

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "u@x.io");
        assert_eq!(sent[0].1, "123456");
        assert_eq!(sent[0].2, "login");
    }
}

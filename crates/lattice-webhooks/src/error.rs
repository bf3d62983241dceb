//! Error types for the webhook engine.

use thiserror::Error;

/// Webhook operation errors.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook registration not found within the tenant.
    #[error("Webhook not found: {0}")]
    NotFound(String),

    /// The registration is disabled and accepts no new deliveries.
    #[error("Webhook is not active: {0}")]
    Disabled(String),

    /// The URL failed structural validation.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The URL points at a private or internal destination.
    #[error("SSRF protection rejected URL: {0}")]
    SsrfDetected(String),

    /// Delivery record not found.
    #[error("Delivery not found: {0}")]
    DeliveryNotFound(String),

    /// Database failure.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Internal failure (HTTP client construction etc.).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WebhookError {
    /// True for the two validation rejections callers surface as bad input.
    #[must_use]
    pub fn is_rejected_url(&self) -> bool {
        matches!(
            self,
            WebhookError::InvalidUrl(_) | WebhookError::SsrfDetected(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_rejected_url() {
        assert!(WebhookError::InvalidUrl("x".into()).is_rejected_url());
        assert!(WebhookError::SsrfDetected("x".into()).is_rejected_url());
        assert!(!WebhookError::NotFound("x".into()).is_rejected_url());
    }
}

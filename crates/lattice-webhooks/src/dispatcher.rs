//! Webhook delivery execution.
//!
//! Claims due deliveries, POSTs them with their precomputed signature,
//! and records the outcome: success resets the endpoint's failure streak,
//! failure schedules a bounded-backoff retry or exhausts the delivery, and
//! ten consecutive failures disable the registration entirely.

use crate::error::WebhookError;
use crate::safe_url::validate_url;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use sqlx::PgPool;

use lattice_db::models::{Webhook, WebhookDelivery};

/// Maximum retry attempts per delivery after the initial send.
pub const MAX_RETRIES: i32 = 5;

/// Consecutive-failure threshold that disables a webhook.
pub const DISABLE_THRESHOLD: i32 = 10;

/// Maximum redirects followed per request, each re-validated.
const MAX_REDIRECTS: usize = 2;

/// Per-request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Backoff schedule in seconds, indexed by retry count.
const RETRY_SCHEDULE_SECS: [i64; 6] = [0, 1, 5, 30, 300, 1800];

/// Decide whether a failed attempt should be retried.
///
/// Client errors are terminal except 429 (rate-limited); everything else
/// (5xx, connect errors, timeouts, DNS failures) retries while the count
/// allows.
#[must_use]
pub fn should_retry(retry_count: i32, http_status: Option<i32>) -> bool {
    if let Some(status) = http_status {
        if (400..500).contains(&status) && status != 429 {
            return false;
        }
    }

    retry_count < MAX_RETRIES
}

/// Backoff delay in seconds before attempt `retry_count`.
///
/// The schedule is 0, 1 s, 5 s, 30 s, 5 min, 30 min, capped at 30 min.
#[must_use]
pub fn retry_delay(retry_count: i32) -> i64 {
    let idx = retry_count.max(0) as usize;
    RETRY_SCHEDULE_SECS
        .get(idx)
        .copied()
        .unwrap_or(*RETRY_SCHEDULE_SECS.last().expect("schedule is non-empty"))
}

/// Timestamp of the next attempt for the given retry count.
#[must_use]
pub fn next_attempt_at(retry_count: i32) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(retry_delay(retry_count))
}

/// Executes claimed deliveries and records their outcomes.
#[derive(Clone)]
pub struct DeliveryDispatcher {
    pool: PgPool,
    http_client: Client,
}

impl DeliveryDispatcher {
    /// Create a dispatcher with a shared HTTP client.
    ///
    /// The client follows at most two redirects and re-validates every
    /// redirect target with the SSRF predicate before following it.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Internal` if the HTTP client cannot be built.
    pub fn new(pool: PgPool) -> Result<Self, WebhookError> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("lattice-webhooks/1.0")
            .redirect(reqwest::redirect::Policy::custom(|attempt| {
                if attempt.previous().len() > MAX_REDIRECTS {
                    attempt.error("too many redirects")
                } else if validate_url(attempt.url().as_str()).is_err() {
                    attempt.error("redirect target rejected by URL validation")
                } else {
                    attempt.follow()
                }
            }))
            .build()
            .map_err(|e| WebhookError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { pool, http_client })
    }

    /// Atomically claim up to `batch_size` due deliveries.
    pub async fn claim_batch(&self, batch_size: i64) -> Result<Vec<WebhookDelivery>, WebhookError> {
        Ok(WebhookDelivery::claim_batch(&self.pool, batch_size).await?)
    }

    /// Execute a single claimed delivery and record the outcome.
    pub async fn dispatch(&self, delivery: &WebhookDelivery) {
        let result = self
            .http_client
            .post(&delivery.url)
            .header("Content-Type", "application/json")
            .header(
                "X-Webhook-Signature",
                format!("sha256={}", delivery.signature),
            )
            .body(delivery.payload.clone())
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = i32::from(response.status().as_u16());
                if (200..300).contains(&status) {
                    self.handle_success(delivery, status).await;
                } else {
                    self.handle_failure(delivery, Some(status), &format!("HTTP {status}"))
                        .await;
                }
            }
            Err(e) => {
                let error_msg = if e.is_timeout() {
                    format!("Request timeout ({REQUEST_TIMEOUT_SECS}s)")
                } else if e.is_connect() {
                    format!("Connection failed: {e}")
                } else if e.is_redirect() {
                    format!("Redirect rejected: {e}")
                } else {
                    format!("Request error: {e}")
                };

                self.handle_failure(delivery, None, &error_msg).await;
            }
        }
    }

    /// Record a 2xx outcome: the delivery is done and the endpoint's failure
    /// streak resets.
    async fn handle_success(&self, delivery: &WebhookDelivery, http_status: i32) {
        tracing::info!(
            target: "webhook_delivery",
            delivery_id = %delivery.id,
            webhook_id = %delivery.webhook_id,
            http_status,
            "Webhook delivered"
        );

        if let Err(e) = WebhookDelivery::mark_delivered(&self.pool, delivery.id, http_status).await
        {
            tracing::error!(
                target: "webhook_delivery",
                delivery_id = %delivery.id,
                error = %e,
                "Failed to mark delivery as delivered"
            );
        }

        if let Err(e) = Webhook::record_success(&self.pool, delivery.webhook_id).await {
            tracing::error!(
                target: "webhook_delivery",
                webhook_id = %delivery.webhook_id,
                error = %e,
                "Failed to reset webhook failure counter"
            );
        }
    }

    /// Record a failed attempt: schedule a retry or exhaust the delivery,
    /// and disable the webhook once its failure streak reaches the threshold.
    async fn handle_failure(
        &self,
        delivery: &WebhookDelivery,
        http_status: Option<i32>,
        error_message: &str,
    ) {
        tracing::warn!(
            target: "webhook_delivery",
            delivery_id = %delivery.id,
            webhook_id = %delivery.webhook_id,
            retry_count = delivery.retry_count,
            http_status = ?http_status,
            error = %error_message,
            "Webhook delivery failed"
        );

        if should_retry(delivery.retry_count, http_status) {
            let new_retry_count = delivery.retry_count + 1;
            let scheduled_at = next_attempt_at(new_retry_count);

            if let Err(e) = WebhookDelivery::mark_retry(
                &self.pool,
                delivery.id,
                new_retry_count,
                scheduled_at,
                http_status,
                error_message,
            )
            .await
            {
                tracing::error!(
                    target: "webhook_delivery",
                    delivery_id = %delivery.id,
                    error = %e,
                    "Failed to schedule delivery retry"
                );
            }
        } else if let Err(e) =
            WebhookDelivery::mark_exhausted(&self.pool, delivery.id, http_status, error_message)
                .await
        {
            tracing::error!(
                target: "webhook_delivery",
                delivery_id = %delivery.id,
                error = %e,
                "Failed to mark delivery as exhausted"
            );
        }

        match Webhook::increment_failures(&self.pool, delivery.webhook_id).await {
            Ok(failures) if failures >= DISABLE_THRESHOLD => {
                let reason = format!("Too many consecutive failures ({failures})");
                tracing::warn!(
                    target: "webhook_delivery",
                    webhook_id = %delivery.webhook_id,
                    consecutive_failures = failures,
                    "Disabling webhook"
                );

                if let Err(e) = Webhook::disable(&self.pool, delivery.webhook_id, &reason).await {
                    tracing::error!(
                        target: "webhook_delivery",
                        webhook_id = %delivery.webhook_id,
                        error = %e,
                        "Failed to disable webhook"
                    );
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(
                    target: "webhook_delivery",
                    webhook_id = %delivery.webhook_id,
                    error = %e,
                    "Failed to increment webhook failure counter"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

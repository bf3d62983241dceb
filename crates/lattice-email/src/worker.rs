//! Background email dispatch worker.
//!
//! Claims due emails in priority order and hands each to the transport,
//! mapping the outcome onto the queue's state machine. The bounce rate is
//! sampled each cycle and logged loudly past the alert threshold.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::queue::{EmailQueueService, BOUNCE_ALERT_THRESHOLD};
use crate::transport::{DeliveryOutcome, EmailTransport};

/// Poll interval in seconds.
const POLL_INTERVAL_SECS: u64 = 5;

/// Rows claimed per poll cycle.
const CLAIM_BATCH_SIZE: i64 = 50;

/// Bounce-rate sampling window in hours.
const BOUNCE_WINDOW_HOURS: i32 = 24;

/// Background worker that drains the email queue through a transport.
pub struct EmailWorker {
    queue: EmailQueueService,
    transport: Arc<dyn EmailTransport>,
    cancellation_token: CancellationToken,
}

impl EmailWorker {
    /// Create a new email worker.
    pub fn new(
        queue: EmailQueueService,
        transport: Arc<dyn EmailTransport>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            queue,
            transport,
            cancellation_token,
        }
    }

    /// Run the worker until cancelled.
    pub async fn run(self) {
        tracing::info!(target: "email_queue", "Email dispatch worker started");

        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(POLL_INTERVAL_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!(target: "email_queue", "Email dispatch worker shutting down");
                    break;
                }
                _ = interval.tick() => {
                    self.process_due_emails().await;
                }
            }
        }

        tracing::info!(target: "email_queue", "Email dispatch worker stopped");
    }

    /// Claim and dispatch one batch.
    async fn process_due_emails(&self) {
        let messages = match self.queue.claim_batch(CLAIM_BATCH_SIZE).await {
            Ok(m) => m,
            Err(e) => {
                tracing::error!(
                    target: "email_queue",
                    error = %e,
                    "Failed to claim email batch"
                );
                return;
            }
        };

        if messages.is_empty() {
            return;
        }

        tracing::info!(
            target: "email_queue",
            count = messages.len(),
            "Processing claimed emails"
        );

        for message in &messages {
            let outcome = self.transport.deliver(message).await;

            let result = match outcome {
                DeliveryOutcome::Delivered => self.queue.mark_sent(message.id).await,
                DeliveryOutcome::SoftFailure(reason) => {
                    self.queue.mark_failed(message, &reason, false).await
                }
                DeliveryOutcome::HardBounce(reason) => {
                    self.queue.mark_failed(message, &reason, true).await
                }
            };

            if let Err(e) = result {
                tracing::error!(
                    target: "email_queue",
                    email_id = %message.id,
                    error = %e,
                    "Failed to record email outcome"
                );
            }
        }

        self.sample_bounce_rate().await;
    }

    /// Log the fleet-wide bounce rate; warn loudly past the threshold.
    async fn sample_bounce_rate(&self) {
        match self.queue.bounce_rate(None, BOUNCE_WINDOW_HOURS).await {
            Ok(rate) if rate >= BOUNCE_ALERT_THRESHOLD => {
                tracing::warn!(
                    target: "email_queue",
                    bounce_rate_pct = rate,
                    threshold_pct = BOUNCE_ALERT_THRESHOLD,
                    "Bounce rate above alert threshold"
                );
            }
            Ok(rate) => {
                tracing::debug!(target: "email_queue", bounce_rate_pct = rate, "Bounce rate sampled");
            }
            Err(e) => {
                tracing::error!(target: "email_queue", error = %e, "Failed to sample bounce rate");
            }
        }
    }
}

//! Background delivery worker.
//!
//! Polls the delivery queue for due rows, claims a bounded batch, and
//! dispatches each claimed delivery with bounded concurrency. Several worker
//! processes may run concurrently; the SKIP LOCKED claim keeps their batches
//! disjoint.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::DeliveryDispatcher;

/// Maximum concurrent dispatches per poll cycle.
const MAX_CONCURRENT_DISPATCHES: usize = 50;

/// Poll interval in seconds.
const POLL_INTERVAL_SECS: u64 = 5;

/// Rows claimed per poll cycle. Small batches bound the duration of any
/// single claim.
const CLAIM_BATCH_SIZE: i64 = 100;

/// Background worker that drains the webhook delivery queue.
pub struct WebhookWorker {
    dispatcher: DeliveryDispatcher,
    cancellation_token: CancellationToken,
}

impl WebhookWorker {
    /// Create a new webhook worker.
    pub fn new(dispatcher: DeliveryDispatcher, cancellation_token: CancellationToken) -> Self {
        Self {
            dispatcher,
            cancellation_token,
        }
    }

    /// Run the worker until cancelled.
    pub async fn run(self) {
        tracing::info!(target: "webhook_delivery", "Webhook delivery worker started");

        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(POLL_INTERVAL_SECS));
        // Don't burst on startup
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!(target: "webhook_delivery", "Webhook delivery worker shutting down");
                    break;
                }
                _ = interval.tick() => {
                    process_due_deliveries(&self.dispatcher).await;
                }
            }
        }

        tracing::info!(target: "webhook_delivery", "Webhook delivery worker stopped");
    }
}

/// Claim and dispatch due deliveries with bounded concurrency.
async fn process_due_deliveries(dispatcher: &DeliveryDispatcher) {
    let deliveries = match dispatcher.claim_batch(CLAIM_BATCH_SIZE).await {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(
                target: "webhook_delivery",
                error = %e,
                "Failed to claim delivery batch"
            );
            return;
        }
    };

    if deliveries.is_empty() {
        return;
    }

    tracing::info!(
        target: "webhook_delivery",
        count = deliveries.len(),
        "Processing claimed webhook deliveries"
    );

    let semaphore = Arc::new(Semaphore::new(MAX_CONCURRENT_DISPATCHES));
    let mut handles = Vec::with_capacity(deliveries.len());

    for delivery in deliveries {
        let sem = semaphore.clone();
        let dispatcher = dispatcher.clone();

        let handle = tokio::spawn(async move {
            let _permit = sem.acquire().await.expect("semaphore closed");
            dispatcher.dispatch(&delivery).await;
        });

        handles.push(handle);
    }

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(
                target: "webhook_delivery",
                error = %e,
                "Dispatch task panicked"
            );
        }
    }
}

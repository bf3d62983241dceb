//! Webhook registration and queueing service.
//!
//! Registration validates the endpoint URL up front and attaches the HMAC
//! secret; queueing re-validates, signs the payload, and persists a pending
//! delivery for the dispatch worker.

use crate::error::WebhookError;
use crate::safe_url::validate_url;
use crate::signer;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use lattice_db::models::{CreateWebhook, CreateWebhookDelivery, Webhook, WebhookDelivery};

/// How per-webhook signing secrets are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookSecretMode {
    /// 256-bit random secret from the OS CSPRNG. The only mode permitted in
    /// production.
    Random,
    /// Deterministic secret derived from (tenant, url). Non-production only;
    /// lets test fixtures recompute signatures without storing state.
    MockDeterministic,
}

/// Service for webhook registration and delivery queueing.
#[derive(Clone)]
pub struct WebhookService {
    pool: PgPool,
    secret_mode: WebhookSecretMode,
}

impl WebhookService {
    /// Create a new webhook service.
    #[must_use]
    pub fn new(pool: PgPool, secret_mode: WebhookSecretMode) -> Self {
        Self { pool, secret_mode }
    }

    /// Register a webhook for a tenant.
    ///
    /// The URL must pass [`validate_url`]; rejected URLs never reach the
    /// database.
    ///
    /// # Errors
    ///
    /// `WebhookError::InvalidUrl` / `WebhookError::SsrfDetected` on a
    /// rejected URL, `WebhookError::Database` on persistence failure.
    pub async fn register(
        &self,
        tenant_id: Uuid,
        url: &str,
        event_types: Vec<String>,
    ) -> Result<Webhook, WebhookError> {
        if let Err(e) = validate_url(url) {
            if matches!(e, WebhookError::SsrfDetected(_)) {
                tracing::warn!(
                    target: "security",
                    tenant_id = %tenant_id,
                    url,
                    "SSRF attempt blocked at webhook registration"
                );
            }
            return Err(e);
        }

        let secret = self.generate_secret(tenant_id, url);

        let webhook = Webhook::create(
            &self.pool,
            CreateWebhook {
                tenant_id,
                url: url.to_string(),
                event_types,
                secret,
            },
        )
        .await?;

        tracing::info!(
            target: "webhook_delivery",
            webhook_id = %webhook.id,
            tenant_id = %tenant_id,
            "Webhook registered"
        );

        Ok(webhook)
    }

    /// Queue a delivery of an event to a webhook.
    ///
    /// The webhook must belong to the tenant and be active; its URL is
    /// re-validated at queue time so a registration that predates a rule
    /// change cannot smuggle a blocked destination into the queue.
    ///
    /// Returns the delivery id.
    pub async fn queue(
        &self,
        tenant_id: Uuid,
        webhook_id: Uuid,
        event_type: &str,
        payload: &str,
    ) -> Result<Uuid, WebhookError> {
        let webhook = Webhook::find_by_id(&self.pool, tenant_id, webhook_id)
            .await?
            .ok_or_else(|| WebhookError::NotFound(webhook_id.to_string()))?;

        if !webhook.is_active() {
            return Err(WebhookError::Disabled(webhook_id.to_string()));
        }

        if let Err(e) = validate_url(&webhook.url) {
            if matches!(e, WebhookError::SsrfDetected(_)) {
                tracing::warn!(
                    target: "security",
                    tenant_id = %tenant_id,
                    webhook_id = %webhook_id,
                    url = %webhook.url,
                    "SSRF attempt blocked at delivery queueing"
                );
            }
            return Err(e);
        }

        let signature = signer::sign(payload.as_bytes(), &webhook.secret);

        let delivery = WebhookDelivery::create(
            &self.pool,
            CreateWebhookDelivery {
                tenant_id,
                webhook_id,
                event_type: event_type.to_string(),
                payload: payload.to_string(),
                url: webhook.url.clone(),
                signature,
            },
        )
        .await?;

        tracing::info!(
            target: "webhook_delivery",
            delivery_id = %delivery.id,
            webhook_id = %webhook_id,
            event_type,
            "Webhook delivery queued"
        );

        Ok(delivery.id)
    }

    /// Fetch the current state of a delivery within a tenant.
    pub async fn delivery_status(
        &self,
        tenant_id: Uuid,
        delivery_id: Uuid,
    ) -> Result<WebhookDelivery, WebhookError> {
        WebhookDelivery::find_by_id(&self.pool, tenant_id, delivery_id)
            .await?
            .ok_or_else(|| WebhookError::DeliveryNotFound(delivery_id.to_string()))
    }

    /// List a tenant's registrations.
    pub async fn list(
        &self,
        tenant_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Webhook>, WebhookError> {
        Ok(Webhook::list_by_tenant(&self.pool, tenant_id, limit, offset).await?)
    }

    /// Disable a registration on operator request.
    pub async fn disable(
        &self,
        tenant_id: Uuid,
        webhook_id: Uuid,
        reason: &str,
    ) -> Result<(), WebhookError> {
        // Tenant scoping: confirm ownership before flipping the row.
        let webhook = Webhook::find_by_id(&self.pool, tenant_id, webhook_id)
            .await?
            .ok_or_else(|| WebhookError::NotFound(webhook_id.to_string()))?;

        Webhook::disable(&self.pool, webhook.id, reason).await?;
        Ok(())
    }

    fn generate_secret(&self, tenant_id: Uuid, url: &str) -> String {
        match self.secret_mode {
            WebhookSecretMode::Random => {
                let mut bytes = [0u8; 32];
                OsRng.fill_bytes(&mut bytes);
                format!("whsec_{}", hex::encode(bytes))
            }
            WebhookSecretMode::MockDeterministic => {
                let digest = Sha256::digest(format!("{tenant_id}:{url}").as_bytes());
                format!("whsec_mock_{}", hex::encode(&digest[..16]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(mode: WebhookSecretMode) -> WebhookService {
        // Connecting lazily never touches the network until a query runs, so
        // secret generation is testable without a database.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        WebhookService::new(pool, mode)
    }

    #[tokio::test]
    async fn test_random_secrets_are_unique_and_prefixed() {
        let svc = service(WebhookSecretMode::Random);
        let tenant = Uuid::new_v4();

        let a = svc.generate_secret(tenant, "https://example.com/h");
        let b = svc.generate_secret(tenant, "https://example.com/h");

        assert!(a.starts_with("whsec_"));
        assert_eq!(a.len(), "whsec_".len() + 64);
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_mock_secrets_are_deterministic_per_tenant_and_url() {
        let svc = service(WebhookSecretMode::MockDeterministic);
        let tenant = Uuid::new_v4();

        let a = svc.generate_secret(tenant, "https://example.com/h");
        let b = svc.generate_secret(tenant, "https://example.com/h");
        let other_url = svc.generate_secret(tenant, "https://example.com/other");
        let other_tenant = svc.generate_secret(Uuid::new_v4(), "https://example.com/h");

        assert_eq!(a, b);
        assert!(a.starts_with("whsec_mock_"));
        assert_ne!(a, other_url);
        assert_ne!(a, other_tenant);
    }
}

//! Shared application state for platform endpoints.

use lattice_cache::CacheClient;
use lattice_db::DbPool;
use lattice_email::EmailQueueService;
use lattice_webhooks::WebhookService;

/// State for the non-auth platform endpoints (health, webhooks, email).
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub cache: CacheClient,
    pub webhooks: WebhookService,
    pub email: EmailQueueService,
}

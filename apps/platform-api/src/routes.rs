//! Platform endpoints for the webhook and email engines.
//!
//! These are service-facing operations; every route requires a validated
//! tenant context and is scoped to the caller's tenant.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lattice_email::EmailError;
use lattice_tenant::RequestContext;
use lattice_webhooks::WebhookError;

use crate::state::AppState;

/// Build the platform router (webhooks + email queue).
pub fn platform_router() -> Router<AppState> {
    Router::new()
        .route("/webhooks", post(register_webhook).get(list_webhooks))
        .route("/webhooks/:id/disable", post(disable_webhook))
        .route("/webhooks/:id/events", post(queue_event))
        .route("/webhooks/deliveries/:id", get(delivery_status))
        .route("/emails", post(enqueue_email))
        .route("/emails/bounce-rate", get(bounce_rate))
        .route("/emails/:id", get(email_status))
}

// ── error adapters ─────────────────────────────────────────────────────────

struct PlatformError(StatusCode, String);

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

impl From<WebhookError> for PlatformError {
    fn from(err: WebhookError) -> Self {
        let status = match &err {
            WebhookError::InvalidUrl(_) | WebhookError::SsrfDetected(_) => {
                StatusCode::BAD_REQUEST
            }
            WebhookError::Disabled(_) => StatusCode::PRECONDITION_FAILED,
            WebhookError::NotFound(_) | WebhookError::DeliveryNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            WebhookError::Database(_) | WebhookError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        PlatformError(status, err.to_string())
    }
}

impl From<EmailError> for PlatformError {
    fn from(err: EmailError) -> Self {
        let status = match &err {
            EmailError::Suppressed | EmailError::Validation(_) => StatusCode::BAD_REQUEST,
            EmailError::NotFound(_) => StatusCode::NOT_FOUND,
            EmailError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        PlatformError(status, err.to_string())
    }
}

fn require_tenant(ctx: &RequestContext) -> Result<(Uuid, Uuid), PlatformError> {
    ctx.authority()
        .map(|(user, tenant)| (*user.as_uuid(), *tenant.as_uuid()))
        .ok_or_else(|| PlatformError(StatusCode::UNAUTHORIZED, "Authentication required".into()))
}

// ── webhooks ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RegisterWebhookRequest {
    url: String,
    #[serde(default)]
    event_types: Vec<String>,
}

#[derive(Debug, Serialize)]
struct WebhookResponse {
    id: Uuid,
    url: String,
    event_types: Vec<String>,
    status: String,
    consecutive_failures: i32,
}

async fn register_webhook(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<RegisterWebhookRequest>,
) -> Result<Json<WebhookResponse>, PlatformError> {
    let (_, tenant_id) = require_tenant(&ctx)?;

    let webhook = state
        .webhooks
        .register(tenant_id, &request.url, request.event_types)
        .await?;

    Ok(Json(WebhookResponse {
        id: webhook.id,
        url: webhook.url,
        event_types: webhook.event_types,
        status: webhook.status,
        consecutive_failures: webhook.consecutive_failures,
    }))
}

async fn list_webhooks(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<Json<Vec<WebhookResponse>>, PlatformError> {
    let (_, tenant_id) = require_tenant(&ctx)?;

    let webhooks = state.webhooks.list(tenant_id, 100, 0).await?;

    Ok(Json(
        webhooks
            .into_iter()
            .map(|w| WebhookResponse {
                id: w.id,
                url: w.url,
                event_types: w.event_types,
                status: w.status,
                consecutive_failures: w.consecutive_failures,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
struct DisableWebhookRequest {
    reason: String,
}

async fn disable_webhook(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(webhook_id): Path<Uuid>,
    Json(request): Json<DisableWebhookRequest>,
) -> Result<StatusCode, PlatformError> {
    let (_, tenant_id) = require_tenant(&ctx)?;

    state
        .webhooks
        .disable(tenant_id, webhook_id, &request.reason)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct QueueEventRequest {
    event_type: String,
    /// Delivered byte-for-byte as the POST body.
    payload: String,
}

#[derive(Debug, Serialize)]
struct QueueEventResponse {
    delivery_id: Uuid,
}

async fn queue_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(webhook_id): Path<Uuid>,
    Json(request): Json<QueueEventRequest>,
) -> Result<Json<QueueEventResponse>, PlatformError> {
    let (_, tenant_id) = require_tenant(&ctx)?;

    let delivery_id = state
        .webhooks
        .queue(tenant_id, webhook_id, &request.event_type, &request.payload)
        .await?;

    Ok(Json(QueueEventResponse { delivery_id }))
}

#[derive(Debug, Serialize)]
struct DeliveryStatusResponse {
    id: Uuid,
    webhook_id: Uuid,
    event_type: String,
    status: String,
    retry_count: i32,
    http_status: Option<i32>,
    error_message: Option<String>,
}

async fn delivery_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(delivery_id): Path<Uuid>,
) -> Result<Json<DeliveryStatusResponse>, PlatformError> {
    let (_, tenant_id) = require_tenant(&ctx)?;

    let delivery = state.webhooks.delivery_status(tenant_id, delivery_id).await?;

    Ok(Json(DeliveryStatusResponse {
        id: delivery.id,
        webhook_id: delivery.webhook_id,
        event_type: delivery.event_type,
        status: delivery.status,
        retry_count: delivery.retry_count,
        http_status: delivery.http_status,
        error_message: delivery.error_message,
    }))
}

// ── email ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EnqueueEmailRequest {
    to: String,
    subject: String,
    body_html: String,
    #[serde(default)]
    body_text: Option<String>,
    #[serde(default)]
    template_id: Option<String>,
    #[serde(default)]
    priority: i32,
}

#[derive(Debug, Serialize)]
struct EnqueueEmailResponse {
    email_id: Uuid,
}

async fn enqueue_email(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(request): Json<EnqueueEmailRequest>,
) -> Result<Json<EnqueueEmailResponse>, PlatformError> {
    let (user_id, tenant_id) = require_tenant(&ctx)?;

    let email_id = state
        .email
        .enqueue(lattice_email::queue::EnqueueEmail {
            tenant_id,
            user_id,
            to_address: request.to,
            subject: request.subject,
            body_html: request.body_html,
            body_text: request.body_text,
            template_id: request.template_id,
            priority: request.priority,
        })
        .await?;

    Ok(Json(EnqueueEmailResponse { email_id }))
}

#[derive(Debug, Serialize)]
struct EmailStatusResponse {
    id: Uuid,
    status: String,
    retry_count: i32,
    bounce_type: String,
    error_message: Option<String>,
}

async fn email_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(email_id): Path<Uuid>,
) -> Result<Json<EmailStatusResponse>, PlatformError> {
    let (_, tenant_id) = require_tenant(&ctx)?;

    let message = state.email.status(tenant_id, email_id).await?;

    Ok(Json(EmailStatusResponse {
        id: message.id,
        status: message.status,
        retry_count: message.retry_count,
        bounce_type: message.bounce_type,
        error_message: message.error_message,
    }))
}

#[derive(Debug, Deserialize)]
struct BounceRateQuery {
    #[serde(default = "default_bounce_window")]
    hours: i32,
}

fn default_bounce_window() -> i32 {
    24
}

#[derive(Debug, Serialize)]
struct BounceRateResponse {
    bounce_rate_pct: f64,
    window_hours: i32,
    alert: bool,
}

async fn bounce_rate(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<BounceRateQuery>,
) -> Result<Json<BounceRateResponse>, PlatformError> {
    let (_, tenant_id) = require_tenant(&ctx)?;

    let rate = state
        .email
        .bounce_rate(Some(tenant_id), query.hours)
        .await?;

    Ok(Json(BounceRateResponse {
        bounce_rate_pct: rate,
        window_hours: query.hours,
        alert: rate >= lattice_email::BOUNCE_ALERT_THRESHOLD,
    }))
}

//! Health endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

use crate::state::AppState;

/// GET /healthz — liveness plus dependency checks.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut overall_healthy = true;

    let postgres_status = match sqlx::query("SELECT 1").execute(state.db.inner()).await {
        Ok(_) => serde_json::json!({ "status": "healthy" }),
        Err(e) => {
            overall_healthy = false;
            serde_json::json!({ "status": "unhealthy", "error": e.to_string() })
        }
    };

    let redis_status = match state.cache.get("healthz:probe").await {
        Ok(_) => serde_json::json!({ "status": "healthy" }),
        Err(e) => {
            overall_healthy = false;
            serde_json::json!({ "status": "unhealthy", "error": e.to_string() })
        }
    };

    let body = serde_json::json!({
        "status": if overall_healthy { "healthy" } else { "degraded" },
        "service": "platform-api",
        "timestamp": Utc::now().to_rfc3339(),
        "components": {
            "postgresql": postgres_status,
            "redis": redis_status,
        }
    });

    if overall_healthy {
        (StatusCode::OK, Json(body))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(body))
    }
}

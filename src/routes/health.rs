use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use std::time::SystemTime;

/// Global server start time for uptime calculation
static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> =
    once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME
        .elapsed()
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Health check endpoint (liveness)
/// Returns 200 if server is running
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "logsink",
        "time": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness check endpoint
/// Returns 200 once the event store answers, 503 while it does not
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> Response {
    match state.store.ping() {
        Ok(()) => Json(json!({
            "status": "ready",
            "service": "logsink",
            "time": chrono::Utc::now().to_rfc3339(),
            "uptime_seconds": uptime_seconds(),
            "components": {
                "api": "ready",
                "store": "ready",
            }
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "components": {
                        "api": "ready",
                        "store": "unavailable",
                    }
                })),
            )
                .into_response()
        }
    }
}

/// Prometheus metrics endpoint
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<Response> {
    match &state.metrics {
        Some(handle) => Ok(handle.render().into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "metrics disabled" })),
        )
            .into_response()),
    }
}

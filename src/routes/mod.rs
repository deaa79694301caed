//! API route handlers
//!
//! This module contains all HTTP endpoint implementations for the logsink
//! server. Routes are organized by functionality:
//!
//! - `health`: Health checks, readiness, and metrics
//! - `logs`: Log ingestion (single and batch) and filtered queries

pub mod health;
pub mod logs;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// API version and base info
///
/// Returns server information including version and available endpoints.
/// This is the root endpoint (GET /) and requires no authentication.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "logsink",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /logs",
            "GET /logs",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// 404 Not Found handler
///
/// Returns a standardized error response for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

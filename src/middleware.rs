use crate::error::ServerError;
use crate::state::ServerState;
use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

/// Credential and resolved identity for an authorized write request,
/// injected into request extensions for the handler.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Raw credential as presented, kept for the audit column.
    pub token: String,

    /// Service identity the credential resolves to.
    pub service: String,
}

/// Extract the credential from an `Authorization` header value.
///
/// Only the `Token <value>` scheme is recognized; anything else counts as
/// an absent credential, never an error.
pub fn token_from_header(value: &str) -> Option<&str> {
    let token = value.strip_prefix("Token ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Token authentication middleware for the write route.
///
/// An unresolved credential rejects the request before the body is ever
/// examined; no record of the batch is processed.
pub async fn token_auth(
    state: axum::extract::State<Arc<ServerState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let Some(token) = token_from_header(header) else {
        return Err(ServerError::InvalidToken);
    };
    let Some(service) = state.service_for_token(token) else {
        return Err(ServerError::InvalidToken);
    };

    let auth = AuthContext {
        token: token.to_string(),
        service: service.to_string(),
    };
    request.extensions_mut().insert(auth);

    Ok(next.run(request).await)
}

/// Request ID injection middleware
pub async fn request_id(mut request: Request, next: Next) -> Response {
    // Generate or extract request ID
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    // Add to request extensions for handlers to access
    request.extensions_mut().insert(request_id.clone());

    // Process request
    let mut response = next.run(request).await;

    // Add request ID to response headers
    response
        .headers_mut()
        .insert("x-request-id", request_id.parse().unwrap());

    response
}

/// Logging middleware
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    // Get request ID if available
    let request_id = request
        .extensions()
        .get::<String>()
        .cloned()
        .unwrap_or_default();

    tracing::info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        "Request started"
    );

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "Request completed"
    );

    response
}

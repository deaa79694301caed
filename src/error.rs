use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Request-level error taxonomy.
///
/// Record-level failures during ingestion never become a `ServerError`;
/// they are aggregated into the batch response by the ingestion pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Missing, malformed, or unknown credential. Halts the whole write
    /// before any record is examined.
    #[error("Invalid token")]
    InvalidToken,

    /// Invalid pagination or filter parameter, rejected before any query
    /// is built.
    #[error("{0}")]
    InvalidParameter(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Store failure on the read path. Surfaced generically; detail goes
    /// to the log, not the caller.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidToken => StatusCode::UNAUTHORIZED,
            ServerError::InvalidParameter(_) | ServerError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Store(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message exposed on the wire. Server faults collapse to a generic
    /// message so internals never leak to the caller.
    fn public_message(&self) -> String {
        match self {
            ServerError::Store(_) | ServerError::Internal(_) | ServerError::Config(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(ErrorResponse {
            error: self.public_message(),
        });
        (status, body).into_response()
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Config(format!("Invalid address: {err}"))
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        ServerError::Internal(format!("IO error: {err}"))
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_token_maps_to_401_with_exact_body_message() {
        let err = ServerError::InvalidToken;
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.public_message(), "Invalid token");
    }

    #[test]
    fn store_errors_do_not_leak_detail() {
        let err = ServerError::Store(StoreError::Database(
            rusqlite::Error::InvalidParameterName("secret internals".to_string()),
        ));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn parameter_errors_keep_their_description() {
        let err = ServerError::InvalidParameter("limit must be at least 1, got 0".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.public_message(), "limit must be at least 1, got 0");
    }
}

//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all API endpoints
//! - Middleware stack (auth, logging, compression, etc.)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id, token_auth};
use crate::routes::{api_info, not_found};
use crate::routes::{health, logs};
use crate::state::ServerState;
use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Build the Axum router with all routes and middleware
///
/// Reads and operational probes require no credential; the write route
/// carries the token middleware, so an unresolved credential is rejected
/// before the body is touched.
///
/// Public so the integration tests can drive the real router, middleware
/// included, without binding a socket.
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        .route("/logs", get(logs::query_logs))
        // Write route (service token required). Auth is the outermost
        // layer on this method router so it runs before the body limit.
        .route(
            "/logs",
            post(logs::ingest_logs)
                .layer(DefaultBodyLimit::max(state.config.max_body_size()))
                .layer(from_fn_with_state(state.clone(), token_auth)),
        )
        .fallback(not_found)
        .layer(TimeoutLayer::new(state.config.timeout()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the logsink HTTP server
///
/// Initializes structured logging and the metrics recorder, opens the
/// event store, binds the configured TCP address, and serves until
/// SIGTERM or Ctrl+C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .json()
        .init();

    // Create server state
    let mut state = ServerState::new(config)?;
    if state.config.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install metrics recorder")?;
        state.metrics = Some(handle);
    }
    let state = Arc::new(state);

    // Build router
    let app = build_router(state.clone());

    // Parse bind address
    let addr: SocketAddr = state.config.socket_addr()?;

    tracing::info!(
        "Starting logsink on {} with {} known service tokens",
        addr,
        state.config.tokens.len()
    );
    tracing::info!(
        "Timeout: {}s, Max body: {}MB, Store: {}",
        state.config.timeout_secs,
        state.config.max_body_size_mb,
        state.config.database_path
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}; is the port already in use?"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

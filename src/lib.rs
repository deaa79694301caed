//! logsink - telemetry log collection over HTTP
//!
//! This crate provides a small telemetry backend: producers push individual
//! or batched log records with a bearer credential identifying their service,
//! and consumers read them back filtered by service, severity, and time
//! ranges. It supports:
//!
//! - **Credentialed Ingestion**: static token-to-service identity table,
//!   single-record and batch writes with per-record outcome accounting
//! - **Filtered Queries**: dynamic, fully parameterized predicates with
//!   stable pagination under concurrent writers
//! - **Durable Store**: SQLite-backed event table with store-assigned ids
//! - **Health & Metrics**: liveness/readiness probes and Prometheus-compatible
//!   metrics
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use logsink::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     logsink::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! ## Public Endpoints (No Authentication)
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `GET /metrics` - Prometheus metrics
//! - `GET /logs` - Query stored records
//!
//! ## Credentialed Endpoints (Service Token Required)
//!
//! - `POST /logs` - Ingest a single record or a `{"logs": [...]}` batch
//!
//! A write carries `Authorization: Token <credential>`; an unresolved
//! credential yields 401 `{"error": "Invalid token"}` without touching the
//! store. Batch writes report `{accepted, failed, errors[]}` and succeed
//! overall as soon as any record was accepted.

pub mod config;
pub mod error;
pub mod middleware;
pub mod record;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use record::{LogRecord, NewLogRecord};
pub use server::{build_router, start_server};
pub use state::ServerState;
pub use store::{LogFilter, LogStore, StoreError};

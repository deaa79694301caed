use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::store::LogStore;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Event store (shared across requests)
    pub store: Arc<LogStore>,

    /// Prometheus render handle, present when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Create server state backed by the configured database path
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store = LogStore::open(&config.database_path)?;
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(store),
            metrics: None,
        })
    }

    /// Create server state over an in-memory store, used by tests
    pub fn in_memory(config: ServerConfig) -> ServerResult<Self> {
        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(LogStore::in_memory()?),
            metrics: None,
        })
    }

    /// Resolve a credential to its service identity
    pub fn service_for_token(&self, token: &str) -> Option<&str> {
        self.config.tokens.get(token).map(String::as_str)
    }
}

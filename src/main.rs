//! logsink - telemetry log collection server
//!
//! This binary serves the HTTP API for credentialed log ingestion and
//! filtered queries over the SQLite-backed event store.

use logsink::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Load configuration
    let config = ServerConfig::load()?;

    // Start server
    logsink::start_server(config).await?;

    Ok(())
}

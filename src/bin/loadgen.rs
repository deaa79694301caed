//! Synthetic traffic generator for the logsink API.
//!
//! Sends single or batched log writes with the development token table, or
//! reads back filtered pages, printing per-request outcomes. Useful for
//! smoke-testing a running server:
//!
//! ```text
//! loadgen --mode batch --service payment-service --batch-size 5
//! loadgen --mode get --service auth-service --limit 10
//! ```

use clap::{Parser, ValueEnum};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Send one record per iteration
    One,
    /// Send a batch of records per iteration
    Batch,
    /// Fetch a page of stored records
    Get,
}

#[derive(Debug, Parser)]
#[command(name = "loadgen", about = "Synthetic traffic generator for the logsink API")]
struct Cli {
    #[arg(long, value_enum, default_value = "one")]
    mode: Mode,

    /// Base URL of a running logsink server
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Service identity to emit or filter by
    #[arg(long, default_value = "api-service")]
    service: String,

    /// Severity filter for get mode ("all" disables)
    #[arg(long, default_value = "all")]
    severity: String,

    /// How many logs to fetch in get mode
    #[arg(long, default_value_t = 10)]
    limit: u32,

    #[arg(long)]
    timestamp_start: Option<String>,

    #[arg(long)]
    timestamp_end: Option<String>,

    #[arg(long)]
    received_at_start: Option<String>,

    #[arg(long)]
    received_at_end: Option<String>,

    /// Repeat count for write modes
    #[arg(long, default_value_t = 1)]
    repeat: u32,

    /// Records per batch in batch mode
    #[arg(long, default_value_t = 5)]
    batch_size: u32,

    /// Seconds between sends
    #[arg(long, default_value_t = 1.0)]
    sleep: f64,
}

/// Development credential table, mirroring the server's fallback. The
/// `admin` entry is deliberately unknown to the server and exercises the
/// 401 path.
fn token_for(service: &str) -> &'static str {
    match service {
        "auth-service" => "token123",
        "payment-service" => "token456",
        "api-service" => "token789",
        _ => "xXAdminXx",
    }
}

const SEVERITIES: [&str; 3] = ["INFO", "WARN", "ERROR"];

fn make_log(service: &str, seq: u32) -> Value {
    json!({
        "service": service,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "severity": SEVERITIES[seq as usize % SEVERITIES.len()],
        "message": format!("Log event from {service}"),
    })
}

async fn send_one(client: &Client, cli: &Cli, seq: u32) -> anyhow::Result<()> {
    let resp = client
        .post(format!("{}/logs", cli.url))
        .header("Authorization", format!("Token {}", token_for(&cli.service)))
        .json(&make_log(&cli.service, seq))
        .send()
        .await?;

    let status = resp.status();
    if status.is_success() {
        println!("[{}] ONE -> SUCCESS {status}", cli.service);
    } else {
        let body: Value = resp.json().await.unwrap_or_default();
        println!("[{}] ONE -> FAILED ({status}): {body}", cli.service);
    }
    Ok(())
}

async fn send_batch(client: &Client, cli: &Cli) -> anyhow::Result<()> {
    let logs: Vec<Value> = (0..cli.batch_size)
        .map(|i| make_log(&cli.service, i))
        .collect();

    let resp = client
        .post(format!("{}/logs", cli.url))
        .header("Authorization", format!("Token {}", token_for(&cli.service)))
        .json(&json!({ "logs": logs }))
        .send()
        .await?;

    let status = resp.status();
    if status.is_success() {
        println!("[{}] BATCH x{} -> SUCCESS {status}", cli.service, cli.batch_size);
    } else {
        let body: Value = resp.json().await.unwrap_or_default();
        println!("[{}] BATCH -> FAILED ({status}): {body}", cli.service);
    }
    Ok(())
}

async fn get_logs(client: &Client, cli: &Cli) -> anyhow::Result<()> {
    let mut params: Vec<(&str, String)> = Vec::new();
    if cli.service != "all" && !cli.service.is_empty() {
        params.push(("service", cli.service.clone()));
    }
    if cli.severity != "all" && !cli.severity.is_empty() {
        params.push(("severity", cli.severity.clone()));
    }
    for (name, value) in [
        ("timestamp_start", &cli.timestamp_start),
        ("timestamp_end", &cli.timestamp_end),
        ("received_at_start", &cli.received_at_start),
        ("received_at_end", &cli.received_at_end),
    ] {
        if let Some(value) = value {
            params.push((name, value.clone()));
        }
    }
    params.push(("limit", cli.limit.to_string()));

    let resp = client
        .get(format!("{}/logs", cli.url))
        .query(&params)
        .send()
        .await?;

    let status = resp.status();
    let body: Value = resp.json().await?;
    if !status.is_success() {
        println!("GET failed ({status}): {}", body["error"]);
        return Ok(());
    }

    println!("Retrieved {} logs", body["count"]);
    if let Some(results) = body["results"].as_array() {
        for record in results {
            println!(
                "  #{} [{}] {} {} (received {})",
                record["id"],
                record["severity"].as_str().unwrap_or("?"),
                record["service"].as_str().unwrap_or("?"),
                record["message"].as_str().unwrap_or("?"),
                record["received_at"].as_str().unwrap_or("?"),
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();

    if cli.mode == Mode::Get {
        return get_logs(&client, &cli).await;
    }

    for i in 0..cli.repeat {
        match cli.mode {
            Mode::Batch => send_batch(&client, &cli).await?,
            _ => send_one(&client, &cli, i).await?,
        }
        if i + 1 < cli.repeat {
            tokio::time::sleep(Duration::from_secs_f64(cli.sleep)).await;
        }
    }
    Ok(())
}

//! Webhook Manager runner binary.

use std::str::FromStr;
use std::sync::Arc;

use webhook_manager::ReqwestTransport;
use webhook_manager_server::{load_config, run};

const DEFAULT_CONFIG_PATH: &str = "webhook-manager.toml";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&path)?;

    // Initialize tracing
    let level = tracing::Level::from_str(&config.log_level.0).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    tracing::info!(
        config = %path,
        endpoints = config.endpoints.len(),
        deliveries = config.deliveries.len(),
        "Starting webhook manager"
    );

    let summary = run(&config, Arc::new(ReqwestTransport::new())).await?;

    tracing::info!(
        delivered = summary.delivered,
        failed = summary.failed,
        rejected = summary.rejected,
        "Run complete"
    );

    Ok(())
}

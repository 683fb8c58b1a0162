//! # Webhook Manager Runner
//!
//! Registers the endpoints declared in a TOML file, runs its deliveries in
//! order, and reports per-endpoint stats.

mod config;

pub use config::{
    ConfigError, DeliveryConfig, DispatchConfig, EndpointConfig, LogLevel, RateLimitConfig,
    RunnerConfig, load_config, parse_config,
};

use std::collections::HashMap;
use std::sync::Arc;

use webhook_manager::{
    DeliveryStats, EndpointData, Transport, WebhookManager, WebhookResult,
};

/// Outcome of one run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub delivered: usize,
    pub failed: usize,
    /// Deliveries rejected before anything was sent.
    pub rejected: usize,
    /// Stats per endpoint name.
    pub stats: HashMap<String, DeliveryStats>,
}

/// Runs a configuration against a transport.
///
/// Delivery failures are counted, not returned; only registration and
/// storage failures abort the run.
pub async fn run(config: &RunnerConfig, transport: Arc<dyn Transport>) -> WebhookResult<RunSummary> {
    let manager = WebhookManager::in_memory(config.webhook_config(), transport);

    let mut ids = HashMap::new();
    for entry in &config.endpoints {
        let endpoint = manager
            .register(&entry.owner_id, EndpointData::new(&entry.url).name(&entry.name))
            .await?;
        if entry.disabled {
            manager.registry().deactivate(&endpoint.id).await?;
        }
        ids.insert(entry.name.clone(), endpoint.id);
    }

    let mut summary = RunSummary::default();
    for delivery in &config.deliveries {
        // Validated by parse_config
        let Some(id) = ids.get(&delivery.endpoint) else {
            continue;
        };

        match manager.send(id, &delivery.message, &delivery.options).await {
            Ok(result) => {
                summary.delivered += 1;
                tracing::info!(
                    endpoint = %delivery.endpoint,
                    status = result.status_code,
                    elapsed_ms = result.elapsed_ms,
                    "Delivery succeeded"
                );
            }
            Err(e) if e.was_attempted() => {
                summary.failed += 1;
                tracing::warn!(endpoint = %delivery.endpoint, error = %e, "Delivery failed");
            }
            Err(e) => {
                summary.rejected += 1;
                tracing::warn!(endpoint = %delivery.endpoint, error = %e, "Delivery rejected");
            }
        }
    }

    for (name, id) in &ids {
        let stats = manager.stats(id).await?;
        tracing::info!(
            endpoint = %name,
            total = stats.total,
            successful = stats.successful,
            failed = stats.failed,
            success_rate = stats.success_rate,
            "Endpoint stats"
        );
        summary.stats.insert(name.clone(), stats);
    }

    Ok(summary)
}

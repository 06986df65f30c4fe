//! Glasspane - application health aggregator.

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glasspane::collector::Collector;
use glasspane::config::ServerConfig;
use glasspane::health::{HealthEvaluator, Thresholds};
use glasspane::incident::IncidentManager;
use glasspane::store::TelemetryStore;
use glasspane::summarizer::{ExternalSummarizer, SimulatedSummarizer, Summarizer};
use glasspane::web::{AppState, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("glasspane=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting Glasspane on port {}...", cfg.http_port);
    for target in &cfg.targets {
        tracing::info!("Monitoring {} at {}", target.id, target.base_url);
    }

    // Shared state
    let telemetry = TelemetryStore::new(cfg.snapshot_retention);
    let health = HealthEvaluator::new(Thresholds::default(), cfg.history_retention);
    let incidents = IncidentManager::new();

    let summarizer: Arc<dyn Summarizer> = match &cfg.ai_endpoint {
        Some(endpoint) => {
            tracing::info!("Using external analysis backend at {}", endpoint);
            Arc::new(ExternalSummarizer::new(
                endpoint.clone(),
                Duration::from_secs(cfg.ai_timeout_secs),
            ))
        }
        None => {
            tracing::info!("Using simulated analysis backend");
            Arc::new(SimulatedSummarizer)
        }
    };

    // Start per-target collection loops
    let collector = Collector::new(
        cfg.clone(),
        telemetry.clone(),
        health.clone(),
        incidents.clone(),
    );
    collector.start().await;

    // Start the aggregation API
    let server = Server::new(AppState {
        config: cfg,
        telemetry,
        health,
        incidents,
        summarizer,
    });
    server.start().await?;

    Ok(())
}

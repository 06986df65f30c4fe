//! Collector: one periodic probe loop per monitored target.
//!
//! Each loop probes its target, records the counter snapshot, re-evaluates
//! health, and opens an incident on a degradation transition. Loops are
//! independent; one target's failures never block another's collection.
//!
//! Recovery does not auto-resolve incidents; resolution is an explicit API
//! action.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::RwLock;

use crate::config::ServerConfig;
use crate::health::{is_degradation, HealthEvaluator};
use crate::incident::IncidentManager;
use crate::probe::run_probe;
use crate::store::{Target, TelemetryStore};

/// Orchestrates the per-target probe loops.
pub struct Collector {
    config: ServerConfig,
    telemetry: TelemetryStore,
    health: HealthEvaluator,
    incidents: IncidentManager,
    stop_chans: Arc<RwLock<HashMap<String, tokio::sync::broadcast::Sender<()>>>>,
}

impl Collector {
    pub fn new(
        config: ServerConfig,
        telemetry: TelemetryStore,
        health: HealthEvaluator,
        incidents: IncidentManager,
    ) -> Self {
        Self {
            config,
            telemetry,
            health,
            incidents,
            stop_chans: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Start a collection loop for every configured target.
    pub async fn start(&self) {
        let targets = self.config.targets.clone();
        tracing::info!("Starting collector with {} targets", targets.len());

        for target in targets {
            self.health.register(&target.id);
            self.add_target(target).await;
        }
    }

    /// Begin collecting for a target.
    pub async fn add_target(&self, target: Target) {
        let mut stop_chans = self.stop_chans.write().await;

        if stop_chans.contains_key(&target.id) {
            return; // Already running
        }

        let (stop_tx, _) = tokio::sync::broadcast::channel(1);
        stop_chans.insert(target.id.clone(), stop_tx.clone());
        drop(stop_chans);

        tracing::info!("Collector: adding target {}", target.id);

        let ctx = LoopContext {
            telemetry: self.telemetry.clone(),
            health: self.health.clone(),
            incidents: self.incidents.clone(),
            poll_interval: self.config.poll_interval(),
            probe_timeout: self.config.probe_timeout(),
        };
        let target_id = target.id.clone();
        let stop_chans = self.stop_chans.clone();

        tokio::spawn(async move {
            run_collect_loop(target, ctx, stop_tx.subscribe()).await;

            let mut chans = stop_chans.write().await;
            chans.remove(&target_id);
        });
    }

    /// Stop collecting for a target.
    pub async fn remove_target(&self, target_id: &str) {
        let mut stop_chans = self.stop_chans.write().await;

        if let Some(stop_tx) = stop_chans.remove(target_id) {
            let _ = stop_tx.send(());
            tracing::info!("Collector: removed target {}", target_id);
        }
    }
}

struct LoopContext {
    telemetry: TelemetryStore,
    health: HealthEvaluator,
    incidents: IncidentManager,
    poll_interval: Duration,
    probe_timeout: Duration,
}

/// Run the collection loop for a single target until stopped.
async fn run_collect_loop(
    target: Target,
    ctx: LoopContext,
    mut stop_rx: tokio::sync::broadcast::Receiver<()>,
) {
    let client = match reqwest::Client::builder().build() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Collector: cannot build HTTP client for {}: {}", target.id, e);
            return;
        }
    };

    let mut interval = tokio::time::interval(ctx.poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop_rx.recv() => {
                break;
            }
            _ = interval.tick() => {
                // Jitter to avoid thundering herd across targets
                let jitter = rand::thread_rng().gen_range(0..100u64);
                tokio::time::sleep(Duration::from_millis(jitter)).await;

                collect_once(&client, &target, &ctx).await;
            }
        }
    }
}

/// One probe-record-evaluate cycle. Probe failures are absorbed into the
/// health state and never abort the loop.
async fn collect_once(client: &reqwest::Client, target: &Target, ctx: &LoopContext) {
    let outcome = run_probe(client, &target.base_url, ctx.probe_timeout).await;

    if let Ok(snapshot) = &outcome {
        ctx.telemetry.record(&target.id, snapshot.clone());
    }

    let (previous, record) = ctx.health.evaluate(&target.id, &outcome);

    if is_degradation(previous, record.status) {
        ctx.incidents
            .create_from_health_transition(&target.id, previous, record.status);
    }
}

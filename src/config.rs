//! Configuration module for Glasspane.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

use crate::store::Target;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the aggregation API (default: 8000)
    pub http_port: u16,
    /// Seconds between collector probes of each target (default: 10)
    pub poll_interval_secs: u64,
    /// Per-probe HTTP timeout in seconds (default: 5)
    pub probe_timeout_secs: u64,
    /// Maximum counter snapshots retained per target (default: 100)
    pub snapshot_retention: usize,
    /// Maximum health-history samples retained per target (default: 4320)
    pub history_retention: usize,
    /// Availability target for SLA compliance (default: 99.9)
    pub sla_target: f64,
    /// Rolling SLA window in minutes (default: 43200, i.e. 30 days)
    pub sla_window_minutes: f64,
    /// Optional URL of an external analysis backend; simulated when unset
    pub ai_endpoint: Option<String>,
    /// Timeout for external analysis calls in seconds (default: 10)
    pub ai_timeout_secs: u64,
    /// Monitored targets, parsed from `GLASSPANE_TARGETS`
    pub targets: Vec<Target>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8000,
            poll_interval_secs: 10,
            probe_timeout_secs: 5,
            snapshot_retention: 100,
            history_retention: 4320,
            sla_target: 99.9,
            sla_window_minutes: 43200.0,
            ai_endpoint: None,
            ai_timeout_secs: 10,
            targets: vec![Target {
                id: "sample-app".to_string(),
                display_name: "Sample App".to_string(),
                base_url: "http://app:3000".to_string(),
            }],
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `GLASSPANE_HTTP_PORT`: API port (default: 8000)
    /// - `GLASSPANE_POLL_INTERVAL`: collector interval in seconds (default: 10)
    /// - `GLASSPANE_PROBE_TIMEOUT`: probe timeout in seconds (default: 5)
    /// - `GLASSPANE_SLA_TARGET`: availability target percentage (default: 99.9)
    /// - `GLASSPANE_AI_ENDPOINT`: external analysis URL (default: unset)
    /// - `GLASSPANE_TARGETS`: comma-separated `id=url` pairs
    ///   (default: `sample-app=http://app:3000`)
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Ok(port_str) = env::var("GLASSPANE_HTTP_PORT") {
            if let Ok(port) = port_str.parse() {
                cfg.http_port = port;
            }
        }

        if let Ok(s) = env::var("GLASSPANE_POLL_INTERVAL") {
            if let Ok(secs) = s.parse::<u64>() {
                if secs > 0 {
                    cfg.poll_interval_secs = secs;
                }
            }
        }

        if let Ok(s) = env::var("GLASSPANE_PROBE_TIMEOUT") {
            if let Ok(secs) = s.parse::<u64>() {
                if secs > 0 {
                    cfg.probe_timeout_secs = secs;
                }
            }
        }

        if let Ok(s) = env::var("GLASSPANE_SLA_TARGET") {
            if let Ok(target) = s.parse::<f64>() {
                cfg.sla_target = target;
            }
        }

        if let Ok(endpoint) = env::var("GLASSPANE_AI_ENDPOINT") {
            if !endpoint.is_empty() {
                cfg.ai_endpoint = Some(endpoint);
            }
        }

        if let Ok(spec) = env::var("GLASSPANE_TARGETS") {
            let targets = parse_targets(&spec);
            if !targets.is_empty() {
                cfg.targets = targets;
            }
        }

        cfg
    }

    /// Probe timeout as a [`Duration`].
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Poll interval in minutes, the downtime weight of one unhealthy sample.
    pub fn sample_minutes(&self) -> f64 {
        self.poll_interval_secs as f64 / 60.0
    }
}

/// Parse a `GLASSPANE_TARGETS` spec: comma-separated `id=url` pairs.
///
/// The display name is derived from the id (`sample-app` -> `Sample App`).
/// Malformed entries are skipped.
fn parse_targets(spec: &str) -> Vec<Target> {
    spec.split(',')
        .filter_map(|entry| {
            let (id, url) = entry.trim().split_once('=')?;
            let id = id.trim();
            let url = url.trim();
            if id.is_empty() || url.is_empty() {
                return None;
            }
            Some(Target {
                id: id.to_string(),
                display_name: display_name_for(id),
                base_url: url.trim_end_matches('/').to_string(),
            })
        })
        .collect()
}

fn display_name_for(id: &str) -> String {
    id.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

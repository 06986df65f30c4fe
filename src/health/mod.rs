//! Health evaluator: classifies probe outcomes into per-target health
//! records and keeps the bounded history the SLA calculator reads.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use chrono::Utc;

use crate::probe::ProbeError;
use crate::store::{CounterSnapshot, HealthRecord, HealthSample, HealthStatus};

/// Classification thresholds. Severity ordering is load-bearing: the
/// unhealthy error-rate bar is checked before the degraded one.
#[derive(Debug, Clone)]
pub struct Thresholds {
    /// Error rate at or above which a target is unhealthy (default 10%).
    pub unhealthy_error_rate: f64,
    /// Error rate at or above which a target is degraded (default 1%).
    pub degraded_error_rate: f64,
    /// Average response time above which a target is degraded, in ms.
    pub degraded_latency_ms: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            unhealthy_error_rate: 0.10,
            degraded_error_rate: 0.01,
            degraded_latency_ms: 1000.0,
        }
    }
}

/// Per-target health state plus a bounded FIFO history log per target.
///
/// History rings are target-keyed so one flapping target cannot evict
/// another target's downtime evidence; the retention budget applies to
/// each target independently, like the telemetry store.
#[derive(Clone)]
pub struct HealthEvaluator {
    records: Arc<RwLock<HashMap<String, HealthRecord>>>,
    history: Arc<RwLock<HashMap<String, VecDeque<HealthSample>>>>,
    thresholds: Thresholds,
    history_retention: usize,
}

impl HealthEvaluator {
    pub fn new(thresholds: Thresholds, history_retention: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            history: Arc::new(RwLock::new(HashMap::new())),
            thresholds,
            history_retention: history_retention.max(1),
        }
    }

    /// Register a target so it reports `unknown` before its first probe.
    pub fn register(&self, target_id: &str) {
        let mut records = self.records.write().unwrap();
        records
            .entry(target_id.to_string())
            .or_insert_with(|| HealthRecord::unknown(target_id));
    }

    /// Classify a probe outcome, update the target's record, append to the
    /// history log, and return the previous and new status.
    ///
    /// A failed probe is evidence of `unhealthy`, not an evaluator error.
    pub fn evaluate(
        &self,
        target_id: &str,
        outcome: &Result<CounterSnapshot, ProbeError>,
    ) -> (HealthStatus, HealthRecord) {
        let status = match outcome {
            Ok(snapshot) => classify(snapshot, &self.thresholds),
            Err(e) => {
                tracing::debug!("Probe failed for {}: {}", target_id, e);
                HealthStatus::Unhealthy
            }
        };

        let now = Utc::now();
        let record = HealthRecord {
            target_id: target_id.to_string(),
            status,
            last_checked_at: Some(now),
        };

        let previous = {
            let mut records = self.records.write().unwrap();
            records
                .insert(target_id.to_string(), record.clone())
                .map(|r| r.status)
                .unwrap_or(HealthStatus::Unknown)
        };

        {
            let mut history = self.history.write().unwrap();
            let ring = history.entry(target_id.to_string()).or_default();
            if ring.len() >= self.history_retention {
                ring.pop_front();
            }
            ring.push_back(HealthSample {
                target_id: target_id.to_string(),
                status,
                time: now,
            });
        }

        (previous, record)
    }

    /// Current record for a target; `unknown` if it was never registered.
    pub fn record(&self, target_id: &str) -> HealthRecord {
        let records = self.records.read().unwrap();
        records
            .get(target_id)
            .cloned()
            .unwrap_or_else(|| HealthRecord::unknown(target_id))
    }

    /// Health history, oldest first, optionally filtered by target.
    pub fn history(&self, target_id: Option<&str>) -> Vec<HealthSample> {
        let history = self.history.read().unwrap();
        match target_id {
            Some(id) => history
                .get(id)
                .map(|ring| ring.iter().cloned().collect())
                .unwrap_or_default(),
            None => {
                let mut merged: Vec<HealthSample> = history
                    .values()
                    .flat_map(|ring| ring.iter().cloned())
                    .collect();
                merged.sort_by_key(|s| s.time);
                merged
            }
        }
    }
}

/// Classify a snapshot against the thresholds.
///
/// Counter resets (a target restart) only shrink the cumulative rate, so
/// they need no special handling here beyond not assuming monotonicity.
fn classify(snapshot: &CounterSnapshot, thresholds: &Thresholds) -> HealthStatus {
    let error_rate = snapshot.error_rate();
    if error_rate >= thresholds.unhealthy_error_rate {
        HealthStatus::Unhealthy
    } else if error_rate >= thresholds.degraded_error_rate
        || snapshot.response_time_avg_ms > thresholds.degraded_latency_ms
    {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

/// Whether a status transition is a degradation that should open an
/// incident: any transition into `unhealthy`, or a first slip from
/// `healthy`/`unknown` into `degraded`.
pub fn is_degradation(from: HealthStatus, to: HealthStatus) -> bool {
    match to {
        HealthStatus::Unhealthy => from != HealthStatus::Unhealthy,
        HealthStatus::Degraded => {
            from == HealthStatus::Healthy || from == HealthStatus::Unknown
        }
        _ => false,
    }
}

//! In-memory telemetry counter store.
//!
//! Holds a bounded, append-only snapshot ring per target. Collector tasks
//! write while API handlers read, so all access goes through an internal
//! lock; callers never see the underlying map.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use super::models::CounterSnapshot;

/// Thread-safe counter store with FIFO retention per target.
#[derive(Clone)]
pub struct TelemetryStore {
    inner: Arc<RwLock<HashMap<String, VecDeque<CounterSnapshot>>>>,
    retention: usize,
}

impl TelemetryStore {
    /// Create a store that keeps at most `retention` snapshots per target.
    pub fn new(retention: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            retention: retention.max(1),
        }
    }

    /// Append a snapshot, evicting the oldest entry once at capacity.
    pub fn record(&self, target_id: &str, snapshot: CounterSnapshot) {
        let mut map = self.inner.write().unwrap();
        let ring = map.entry(target_id.to_string()).or_default();
        if ring.len() >= self.retention {
            ring.pop_front();
        }
        ring.push_back(snapshot);
    }

    /// Most recent snapshot for a target, if any has been recorded.
    pub fn latest(&self, target_id: &str) -> Option<CounterSnapshot> {
        let map = self.inner.read().unwrap();
        map.get(target_id).and_then(|ring| ring.back().cloned())
    }

    /// Last `n` snapshots for a target in chronological order.
    pub fn window(&self, target_id: &str, n: usize) -> Vec<CounterSnapshot> {
        let map = self.inner.read().unwrap();
        match map.get(target_id) {
            Some(ring) => {
                let skip = ring.len().saturating_sub(n);
                ring.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Snapshot count for a target.
    pub fn len(&self, target_id: &str) -> usize {
        let map = self.inner.read().unwrap();
        map.get(target_id).map_or(0, |ring| ring.len())
    }
}

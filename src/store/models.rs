//! Domain model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored service, created from configuration at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
}

/// One sampled reading of a target's cumulative counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Cumulative request count since target start.
    pub request_count: u64,
    /// Cumulative error count since target start.
    pub error_count: u64,
    /// Cumulative average response time as reported by the target, in ms.
    pub response_time_avg_ms: f64,
    /// Target uptime in seconds, as reported.
    pub uptime_seconds: u64,
}

impl CounterSnapshot {
    /// Error fraction over the target's lifetime, in `[0, 1]`.
    pub fn error_rate(&self) -> f64 {
        self.error_count as f64 / (self.request_count.max(1)) as f64
    }
}

/// Coarse health classification for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Unknown,
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Severity rank; higher is worse. `Unknown` ranks lowest.
    pub fn rank(self) -> u8 {
        match self {
            HealthStatus::Unknown => 0,
            HealthStatus::Healthy => 1,
            HealthStatus::Degraded => 2,
            HealthStatus::Unhealthy => 3,
        }
    }
}

/// Current health of a single target. Exactly one per target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRecord {
    pub target_id: String,
    pub status: HealthStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
}

impl HealthRecord {
    pub fn unknown(target_id: &str) -> Self {
        Self {
            target_id: target_id.to_string(),
            status: HealthStatus::Unknown,
            last_checked_at: None,
        }
    }
}

/// One health-history entry, consumed by the SLA calculator.
#[derive(Debug, Clone)]
pub struct HealthSample {
    pub target_id: String,
    pub status: HealthStatus,
    pub time: DateTime<Utc>,
}

/// Incident severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// Incident lifecycle state: `open` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Open,
    Resolved,
}

/// A tracked record of a detected or manually declared problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub ai_analysis: Option<String>,
    pub source_target_id: Option<String>,
}

/// Derived availability report. Recomputed on every read, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlaReport {
    pub availability_percentage: f64,
    pub uptime_percentage: f64,
    pub downtime_minutes: f64,
    pub sla_target: f64,
    pub mttr_minutes: f64,
    /// Currently open incidents, not total ever recorded.
    pub incident_count: usize,
    pub sla_met: bool,
    pub last_updated: DateTime<Utc>,
}

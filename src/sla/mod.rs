//! SLA calculator.
//!
//! Derives availability, downtime, and MTTR from the health-history log and
//! the incident list over a rolling window. Pure: no state of its own, the
//! report is recomputed on every read.
//!
//! Downtime convention: each `unhealthy` history sample contributes one
//! fixed poll interval of downtime (`sample_minutes`). Continuous probing
//! is not guaranteed, so interval reconstruction from sample gaps is not
//! attempted.

use chrono::{DateTime, Duration, Utc};

use crate::store::{HealthSample, HealthStatus, Incident, IncidentStatus, SlaReport};

/// Inputs that shape the report but not the raw data.
#[derive(Debug, Clone)]
pub struct SlaParams {
    /// Rolling window length in minutes (e.g. 43200 for 30 days).
    pub window_minutes: f64,
    /// Downtime contributed by one unhealthy sample, in minutes.
    pub sample_minutes: f64,
    /// Configured availability target, e.g. 99.9.
    pub sla_target: f64,
}

/// Compute the SLA report as of `now`.
///
/// `history` and `incidents` may be pre-filtered to a single target or
/// cover all targets; the calculator does not distinguish.
pub fn compute(
    params: &SlaParams,
    history: &[HealthSample],
    incidents: &[Incident],
    now: DateTime<Utc>,
) -> SlaReport {
    let window_start = now - minutes(params.window_minutes);

    let unhealthy_samples = history
        .iter()
        .filter(|s| s.time >= window_start && s.status == HealthStatus::Unhealthy)
        .count();

    let downtime_minutes =
        (unhealthy_samples as f64 * params.sample_minutes).min(params.window_minutes);

    let uptime_percentage = if params.window_minutes > 0.0 {
        100.0 * (params.window_minutes - downtime_minutes) / params.window_minutes
    } else {
        100.0
    };
    // No exclusion policy (scheduled maintenance etc.), so availability
    // equals uptime.
    let availability_percentage = uptime_percentage;

    let resolution_minutes: Vec<f64> = incidents
        .iter()
        .filter_map(|i| i.resolved_at.map(|r| (i, r)))
        .filter(|(_, resolved_at)| *resolved_at >= window_start)
        .map(|(i, resolved_at)| {
            (resolved_at - i.created_at).num_seconds().max(0) as f64 / 60.0
        })
        .collect();

    let mttr_minutes = if resolution_minutes.is_empty() {
        0.0
    } else {
        resolution_minutes.iter().sum::<f64>() / resolution_minutes.len() as f64
    };

    let incident_count = incidents
        .iter()
        .filter(|i| i.status == IncidentStatus::Open)
        .count();

    SlaReport {
        availability_percentage,
        uptime_percentage,
        downtime_minutes,
        sla_target: params.sla_target,
        mttr_minutes,
        incident_count,
        sla_met: availability_percentage >= params.sla_target,
        last_updated: now,
    }
}

fn minutes(m: f64) -> Duration {
    Duration::seconds((m * 60.0) as i64)
}

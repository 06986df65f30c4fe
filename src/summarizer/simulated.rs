//! Simulated summarizer.
//!
//! Deterministic: the narrative template is chosen by a stable hash of the
//! incident's severity and title, so retries and repeated UI triggers
//! produce identical text for the same incident.

use async_trait::async_trait;

use super::{Summarizer, SummarizerError};
use crate::store::{CounterSnapshot, Incident, Severity};

/// In-process stand-in for a real analysis backend.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSummarizer;

#[async_trait]
impl Summarizer for SimulatedSummarizer {
    async fn summarize(
        &self,
        incident: &Incident,
        telemetry: &[CounterSnapshot],
    ) -> Result<String, SummarizerError> {
        let narrative = match stable_hash(incident) % 3 {
            0 => format!(
                "Root cause analysis for '{}' indicates a potential service \
                 degradation. Recommend checking service dependencies and \
                 recent deployments. Estimated MTTR: {}.",
                incident.title,
                mttr_estimate(incident.severity)
            ),
            1 => format!(
                "The incident '{}' shows patterns consistent with resource \
                 exhaustion. Suggested actions: scale horizontally, check \
                 memory usage, review recent traffic spikes. Impact \
                 assessment: {} severity affecting ~20% of users.",
                incident.title,
                severity_word(incident.severity)
            ),
            _ => format!(
                "Analysis of '{}' suggests external dependency failure. \
                 Immediate action: implement circuit breaker pattern, monitor \
                 third-party SLAs. Preventive measures: add retry logic with \
                 exponential backoff.",
                incident.title
            ),
        };

        Ok(match telemetry_context(telemetry) {
            Some(context) => format!("{} {}", narrative, context),
            None => narrative,
        })
    }
}

/// Stable template selector over severity + title. Not a quality hash;
/// it only needs to be deterministic across calls and processes.
fn stable_hash(incident: &Incident) -> u64 {
    let mut h: u64 = match incident.severity {
        Severity::Low => 17,
        Severity::Medium => 19,
        Severity::High => 23,
    };
    for b in incident.title.bytes() {
        h = h.wrapping_mul(31).wrapping_add(b as u64);
    }
    h
}

fn mttr_estimate(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "15-30 minutes",
        Severity::Medium => "30-90 minutes",
        Severity::Low => "2-8 hours",
    }
}

fn severity_word(severity: Severity) -> &'static str {
    match severity {
        Severity::Low => "Low",
        Severity::Medium => "Medium",
        Severity::High => "High",
    }
}

/// One sentence of observed telemetry, when a window is available.
fn telemetry_context(telemetry: &[CounterSnapshot]) -> Option<String> {
    let latest = telemetry.last()?;
    Some(format!(
        "Observed telemetry at incident time: {:.1}% error rate, {:.0} ms \
         average response time.",
        latest.error_rate() * 100.0,
        latest.response_time_avg_ms
    ))
}

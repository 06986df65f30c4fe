//! AI summarizer capability.
//!
//! Produces a human-readable root-cause narrative for an incident given the
//! recent telemetry window. Analysis is best-effort enrichment: callers
//! fall back to [`fallback_narrative`] on any error, so no summarizer
//! failure ever reaches the dashboard.

mod external;
mod simulated;

pub use external::*;
pub use simulated::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::{CounterSnapshot, Incident};

/// Summarizer error types.
#[derive(Error, Debug)]
pub enum SummarizerError {
    #[error("analysis backend timed out")]
    Timeout,
    #[error("analysis backend error: {0}")]
    Backend(String),
}

/// Pluggable narrative generator, real or simulated.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        incident: &Incident,
        telemetry: &[CounterSnapshot],
    ) -> Result<String, SummarizerError>;
}

/// Generic templated narrative used when the summarizer fails.
pub fn fallback_narrative(incident: &Incident) -> String {
    format!(
        "Automated analysis for '{}' is unavailable. Recommended next steps: \
         investigate manually, check service logs around the incident start, \
         and review recent deployments.",
        incident.title
    )
}

//! Probe module for sampling monitored targets.
//!
//! A probe hits a target's `/health` endpoint and scrapes its `/metrics`
//! exposition into a [`CounterSnapshot`]. Probe failures are domain signal
//! (the target is unhealthy), never aggregator errors.

mod http;

pub use http::*;

use std::time::Duration;
use thiserror::Error;

/// Probe error types.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("health endpoint returned status {0}")]
    UnhealthyStatus(u16),
    #[error("malformed metrics exposition: {0}")]
    Exposition(String),
}

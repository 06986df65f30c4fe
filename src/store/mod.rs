//! Shared in-memory state: domain models and the telemetry counter store.

mod models;
mod telemetry;

pub use models::*;
pub use telemetry::*;

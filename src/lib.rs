//! Glasspane - a single pane of glass for application health.
//!
//! Polls monitored targets for counters, classifies health, tracks
//! incidents with best-effort AI narratives, and derives SLA figures for a
//! polling dashboard.

pub mod collector;
pub mod config;
pub mod health;
pub mod incident;
pub mod probe;
pub mod sla;
pub mod store;
pub mod summarizer;
pub mod web;

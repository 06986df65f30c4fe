//! HTTP request handlers.

use super::AppState;
use crate::incident::IncidentError;
use crate::sla::{self, SlaParams};
use crate::store::{CounterSnapshot, HealthRecord, HealthStatus, Incident, Severity};
use crate::summarizer::fallback_narrative;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Snapshots returned by `/metrics` when no limit is given.
const DEFAULT_METRICS_LIMIT: usize = 60;

// ============================================================================
// Root
// ============================================================================

pub async fn handle_root() -> impl IntoResponse {
    Json(json!({ "message": "Glasspane aggregation API is running" }))
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TargetHealth {
    pub id: String,
    pub display_name: String,
    pub base_url: String,
    pub status: HealthStatus,
    pub last_checked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub services: Vec<TargetHealth>,
}

pub async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let services: Vec<TargetHealth> = state
        .config
        .targets
        .iter()
        .map(|t| {
            let HealthRecord {
                status,
                last_checked_at,
                ..
            } = state.health.record(&t.id);
            TargetHealth {
                id: t.id.clone(),
                display_name: t.display_name.clone(),
                base_url: t.base_url.clone(),
                status,
                last_checked_at,
            }
        })
        .collect();

    let status = aggregate_status(&services);

    Json(HealthResponse {
        status,
        timestamp: Utc::now(),
        services,
    })
}

/// Worst per-target status wins; an empty target list reports unknown.
fn aggregate_status(services: &[TargetHealth]) -> HealthStatus {
    services
        .iter()
        .map(|s| s.status)
        .max_by_key(|s| s.rank())
        .unwrap_or(HealthStatus::Unknown)
}

// ============================================================================
// Metrics
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

pub async fn handle_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> impl IntoResponse {
    let limit = query.limit.unwrap_or(DEFAULT_METRICS_LIMIT).max(1);

    if let Some(target_id) = &query.target_id {
        if !state.config.targets.iter().any(|t| &t.id == target_id) {
            return (StatusCode::NOT_FOUND, "Target not found").into_response();
        }
        return Json(state.telemetry.window(target_id, limit)).into_response();
    }

    // No filter: merge every target's window chronologically, then apply
    // the limit to the merge so the response never exceeds `limit` entries
    // regardless of target count.
    let mut merged: Vec<CounterSnapshot> = state
        .config
        .targets
        .iter()
        .flat_map(|t| state.telemetry.window(&t.id, limit))
        .collect();
    merged.sort_by_key(|s| s.timestamp);
    if merged.len() > limit {
        merged.drain(..merged.len() - limit);
    }

    Json(merged).into_response()
}

// ============================================================================
// Incidents
// ============================================================================

pub async fn handle_list_incidents(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.incidents.list())
}

#[derive(Debug, Deserialize)]
pub struct CreateIncidentRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: String,
    #[serde(default)]
    pub source_target_id: Option<String>,
}

pub async fn handle_create_incident(
    State(state): State<AppState>,
    Json(req): Json<CreateIncidentRequest>,
) -> impl IntoResponse {
    if req.title.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Title must not be empty").into_response();
    }

    let severity = match parse_severity(&req.severity) {
        Some(s) => s,
        None => return (StatusCode::BAD_REQUEST, "Invalid severity").into_response(),
    };

    let incident = state.incidents.create(
        req.title.trim(),
        &req.description,
        severity,
        req.source_target_id.as_deref(),
    );

    (StatusCode::CREATED, Json(incident)).into_response()
}

fn parse_severity(s: &str) -> Option<Severity> {
    match s.to_ascii_lowercase().as_str() {
        "low" => Some(Severity::Low),
        "medium" => Some(Severity::Medium),
        "high" => Some(Severity::High),
        _ => None,
    }
}

pub async fn handle_analyze_incident(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    let incident = match state.incidents.get(id) {
        Ok(i) => i,
        Err(e) => return incident_error_response(e),
    };

    // Already analyzed: attach_analysis is a no-op, skip the summarizer.
    if incident.ai_analysis.is_some() {
        return Json(incident).into_response();
    }

    let window = incident
        .source_target_id
        .as_deref()
        .map(|t| state.telemetry.window(t, DEFAULT_METRICS_LIMIT))
        .unwrap_or_default();

    // Best-effort enrichment: a summarizer failure falls back to the
    // generic narrative, never to an error response.
    let narrative = match state.summarizer.summarize(&incident, &window).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Summarizer failed for incident {}: {}", id, e);
            fallback_narrative(&incident)
        }
    };

    match state.incidents.attach_analysis(id, &narrative) {
        Ok(updated) => Json(updated).into_response(),
        Err(e) => incident_error_response(e),
    }
}

pub async fn handle_resolve_incident(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> impl IntoResponse {
    match state.incidents.resolve(id) {
        Ok(incident) => Json(incident).into_response(),
        Err(e) => incident_error_response(e),
    }
}

fn incident_error_response(e: IncidentError) -> axum::response::Response {
    match e {
        IncidentError::NotFound(_) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    }
}

// ============================================================================
// Demo generation
// ============================================================================

pub async fn handle_generate_demo(State(state): State<AppState>) -> impl IntoResponse {
    let created: Vec<Incident> = state.incidents.generate_demo_batch();
    tracing::info!("Generated {} demo incidents", created.len());
    (StatusCode::CREATED, Json(created))
}

// ============================================================================
// SLA
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SlaQuery {
    #[serde(default)]
    pub target_id: Option<String>,
}

pub async fn handle_sla(
    State(state): State<AppState>,
    Query(query): Query<SlaQuery>,
) -> impl IntoResponse {
    if let Some(target_id) = &query.target_id {
        if !state.config.targets.iter().any(|t| &t.id == target_id) {
            return (StatusCode::NOT_FOUND, "Target not found").into_response();
        }
    }

    let params = SlaParams {
        window_minutes: state.config.sla_window_minutes,
        sample_minutes: state.config.sample_minutes(),
        sla_target: state.config.sla_target,
    };
    let history = state.health.history(query.target_id.as_deref());
    // A per-target report must only see that target's incidents, or its
    // MTTR and open-incident count would absorb the rest of the fleet.
    let incidents: Vec<Incident> = match query.target_id.as_deref() {
        Some(target_id) => state
            .incidents
            .list()
            .into_iter()
            .filter(|i| i.source_target_id.as_deref() == Some(target_id))
            .collect(),
        None => state.incidents.list(),
    };

    let report = sla::compute(&params, &history, &incidents, Utc::now());
    Json(report).into_response()
}

//! Integration tests for the Glasspane aggregation API.
//!
//! These tests verify the full request/response cycle through the HTTP API.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::Utc;
use serde_json::json;

use glasspane::config::ServerConfig;
use glasspane::health::{is_degradation, HealthEvaluator, Thresholds};
use glasspane::incident::IncidentManager;
use glasspane::store::{CounterSnapshot, TelemetryStore};
use glasspane::summarizer::SimulatedSummarizer;
use glasspane::web::{AppState, Server};

struct TestApp {
    server: TestServer,
    state: AppState,
}

fn create_test_app() -> TestApp {
    let mut config = ServerConfig::default();
    config.poll_interval_secs = 60; // One sample = one minute of downtime
    config.targets[0].id = "app".to_string();

    let state = AppState {
        config: config.clone(),
        telemetry: TelemetryStore::new(config.snapshot_retention),
        health: HealthEvaluator::new(Thresholds::default(), config.history_retention),
        incidents: IncidentManager::new(),
        summarizer: Arc::new(SimulatedSummarizer),
    };
    state.health.register("app");

    TestApp {
        server: TestServer::new(Server::routes(state.clone())).unwrap(),
        state,
    }
}

/// Like [`create_test_app`] but monitoring both `app` and `gateway`.
fn create_two_target_app() -> TestApp {
    let mut config = ServerConfig::default();
    config.poll_interval_secs = 60;
    config.targets[0].id = "app".to_string();
    config.targets.push(glasspane::store::Target {
        id: "gateway".to_string(),
        display_name: "Gateway".to_string(),
        base_url: "http://gateway:8080".to_string(),
    });

    let state = AppState {
        config: config.clone(),
        telemetry: TelemetryStore::new(config.snapshot_retention),
        health: HealthEvaluator::new(Thresholds::default(), config.history_retention),
        incidents: IncidentManager::new(),
        summarizer: Arc::new(SimulatedSummarizer),
    };
    state.health.register("app");
    state.health.register("gateway");

    TestApp {
        server: TestServer::new(Server::routes(state.clone())).unwrap(),
        state,
    }
}

fn snapshot(requests: u64, errors: u64) -> CounterSnapshot {
    CounterSnapshot {
        timestamp: Utc::now(),
        request_count: requests,
        error_count: errors,
        response_time_avg_ms: 25.0,
        uptime_seconds: 600,
    }
}

/// The collector's probe-record-evaluate step, driven with a canned
/// snapshot instead of a live target.
fn feed_snapshot(state: &AppState, snap: CounterSnapshot) {
    state.telemetry.record("app", snap.clone());
    let (previous, record) = state.health.evaluate("app", &Ok(snap));
    if is_degradation(previous, record.status) {
        state
            .incidents
            .create_from_health_transition("app", previous, record.status);
    }
}

#[tokio::test]
async fn test_root_banner() {
    let app = create_test_app();

    let response = app.server.get("/").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["message"].as_str().unwrap().contains("Glasspane"));
}

#[tokio::test]
async fn test_health_unknown_before_any_snapshot() {
    let app = create_test_app();

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "unknown");
    assert_eq!(body["services"][0]["id"], "app");
    assert_eq!(body["services"][0]["status"], "unknown");
}

#[tokio::test]
async fn test_health_reflects_recorded_telemetry() {
    let app = create_test_app();
    feed_snapshot(&app.state, snapshot(1000, 0));

    let response = app.server.get("/health").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_metrics_window() {
    let app = create_test_app();
    for i in 1..=5u64 {
        feed_snapshot(&app.state, snapshot(i * 100, 0));
    }

    let response = app.server.get("/metrics?target_id=app&limit=3").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let snaps = body.as_array().unwrap();
    assert_eq!(snaps.len(), 3);
    assert_eq!(snaps[0]["request_count"], 300);
    assert_eq!(snaps[2]["request_count"], 500);
}

#[tokio::test]
async fn test_metrics_unknown_target() {
    let app = create_test_app();

    let response = app.server.get("/metrics?target_id=nope").await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_incident_validation() {
    let app = create_test_app();

    app.server
        .post("/incidents")
        .json(&json!({ "title": "  ", "severity": "high" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/incidents")
        .json(&json!({ "title": "Outage", "severity": "catastrophic" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_and_list_incidents() {
    let app = create_test_app();

    let response = app
        .server
        .post("/incidents")
        .json(&json!({
            "title": "Database latency",
            "description": "p99 over budget",
            "severity": "medium"
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created: serde_json::Value = response.json();
    assert_eq!(created["status"], "open");
    assert!(created["ai_analysis"].is_null());

    let list: serde_json::Value = app.server.get("/incidents").await.json();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Database latency");
}

#[tokio::test]
async fn test_analyze_is_idempotent() {
    let app = create_test_app();
    let created: serde_json::Value = app
        .server
        .post("/incidents")
        .json(&json!({ "title": "Error Rate Spike", "severity": "high" }))
        .await
        .json();
    let id = created["id"].as_u64().unwrap();

    let first: serde_json::Value = app
        .server
        .post(&format!("/incidents/{}/analyze", id))
        .await
        .json();
    let analysis = first["ai_analysis"].as_str().unwrap().to_string();
    assert!(!analysis.is_empty());

    let second: serde_json::Value = app
        .server
        .post(&format!("/incidents/{}/analyze", id))
        .await
        .json();
    assert_eq!(second["ai_analysis"].as_str().unwrap(), analysis);
}

#[tokio::test]
async fn test_analyze_unknown_incident() {
    let app = create_test_app();

    app.server
        .post("/incidents/999/analyze")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_resolve_is_one_way() {
    let app = create_test_app();
    let created: serde_json::Value = app
        .server
        .post("/incidents")
        .json(&json!({ "title": "Outage", "severity": "high" }))
        .await
        .json();
    let id = created["id"].as_u64().unwrap();

    let resolved: serde_json::Value = app
        .server
        .post(&format!("/incidents/{}/resolve", id))
        .await
        .json();
    assert_eq!(resolved["status"], "resolved");
    let resolved_at = resolved["resolved_at"].as_str().unwrap().to_string();

    // Resolving again never reopens or re-stamps.
    let again: serde_json::Value = app
        .server
        .post(&format!("/incidents/{}/resolve", id))
        .await
        .json();
    assert_eq!(again["status"], "resolved");
    assert_eq!(again["resolved_at"].as_str().unwrap(), resolved_at);

    app.server
        .post("/incidents/12345/resolve")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_demo_generation_is_non_idempotent() {
    let app = create_test_app();

    let first = app.server.post("/demo/generate-incidents").await;
    first.assert_status(StatusCode::CREATED);
    let created: serde_json::Value = first.json();
    assert_eq!(created.as_array().unwrap().len(), 3);

    app.server.post("/demo/generate-incidents").await;

    let list: serde_json::Value = app.server.get("/incidents").await.json();
    assert_eq!(list.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_sla_clean_window() {
    let app = create_test_app();
    feed_snapshot(&app.state, snapshot(1000, 0));

    let response = app.server.get("/sla").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["availability_percentage"], 100.0);
    assert_eq!(body["downtime_minutes"], 0.0);
    assert_eq!(body["incident_count"], 0);
    assert_eq!(body["sla_met"], true);
}

#[tokio::test]
async fn test_sla_target_filter_scopes_incidents() {
    let app = create_two_target_app();

    // One open incident attributed to the gateway only.
    app.server
        .post("/incidents")
        .json(&json!({
            "title": "Gateway outage",
            "severity": "high",
            "source_target_id": "gateway"
        }))
        .await
        .assert_status(StatusCode::CREATED);

    // The other target's report must not absorb it.
    let for_app: serde_json::Value = app.server.get("/sla?target_id=app").await.json();
    assert_eq!(for_app["incident_count"], 0);
    assert_eq!(for_app["mttr_minutes"], 0.0);

    let for_gateway: serde_json::Value =
        app.server.get("/sla?target_id=gateway").await.json();
    assert_eq!(for_gateway["incident_count"], 1);

    // The fleet-wide report still counts everything.
    let fleet: serde_json::Value = app.server.get("/sla").await.json();
    assert_eq!(fleet["incident_count"], 1);

    app.server
        .get("/sla?target_id=nope")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_merged_metrics_respect_limit() {
    let app = create_two_target_app();
    for i in 1..=4u64 {
        app.state.telemetry.record("app", snapshot(i * 100, 0));
        app.state.telemetry.record("gateway", snapshot(i * 100 + 1, 0));
    }

    // Two targets with four snapshots each still cap at the limit, keeping
    // the most recent entries across the merge.
    let response = app.server.get("/metrics?limit=4").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let snaps = body.as_array().unwrap();
    assert_eq!(snaps.len(), 4);
    assert_eq!(snaps[2]["request_count"], 400);
    assert_eq!(snaps[3]["request_count"], 401);
}

#[tokio::test]
async fn test_end_to_end_degradation() {
    let app = create_test_app();

    // Target starts healthy, then reports a 20% error rate.
    feed_snapshot(&app.state, snapshot(1000, 0));
    feed_snapshot(&app.state, snapshot(1100, 220));

    // Health reflects the degradation.
    let health: serde_json::Value = app.server.get("/health").await.json();
    assert_eq!(health["status"], "unhealthy");

    // Exactly one auto-created open incident, attributed to the target.
    let list: serde_json::Value = app.server.get("/incidents").await.json();
    let incidents = list.as_array().unwrap();
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0]["status"], "open");
    assert_eq!(incidents[0]["source_target_id"], "app");
    let id = incidents[0]["id"].as_u64().unwrap();

    // Repeated unhealthy readings do not open duplicates.
    feed_snapshot(&app.state, snapshot(1200, 300));
    let list: serde_json::Value = app.server.get("/incidents").await.json();
    assert_eq!(list.as_array().unwrap().len(), 1);

    // Analysis attaches once and stays frozen.
    let first: serde_json::Value = app
        .server
        .post(&format!("/incidents/{}/analyze", id))
        .await
        .json();
    let analysis = first["ai_analysis"].as_str().unwrap().to_string();

    let second: serde_json::Value = app
        .server
        .post(&format!("/incidents/{}/analyze", id))
        .await
        .json();
    assert_eq!(second["ai_analysis"].as_str().unwrap(), analysis);

    // SLA sees the open incident and the unhealthy samples.
    let sla: serde_json::Value = app.server.get("/sla").await.json();
    assert!(sla["incident_count"].as_u64().unwrap() >= 1);
    assert!(sla["downtime_minutes"].as_f64().unwrap() > 0.0);
    assert!(sla["availability_percentage"].as_f64().unwrap() < 100.0);
}

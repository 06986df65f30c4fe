//! Web server module: the aggregation API.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::health::HealthEvaluator;
use crate::incident::IncidentManager;
use crate::store::TelemetryStore;
use crate::summarizer::Summarizer;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub telemetry: TelemetryStore,
    pub health: HealthEvaluator,
    pub incidents: IncidentManager,
    pub summarizer: Arc<dyn Summarizer>,
}

/// Aggregation API server.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes.
    pub fn routes(state: AppState) -> Router {
        // The dashboard is served from another origin and polls this API.
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

        Router::new()
            .route("/", get(handlers::handle_root))
            .route("/health", get(handlers::handle_health))
            .route("/metrics", get(handlers::handle_metrics))
            .route("/incidents", get(handlers::handle_list_incidents))
            .route("/incidents", post(handlers::handle_create_incident))
            .route("/incidents/{id}/analyze", post(handlers::handle_analyze_incident))
            .route("/incidents/{id}/resolve", post(handlers::handle_resolve_incident))
            .route("/demo/generate-incidents", post(handlers::handle_generate_demo))
            .route("/sla", get(handlers::handle_sla))
            .layer(cors)
            .layer(DefaultBodyLimit::max(64 * 1024)) // 64KB
            .with_state(state)
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = Self::routes(self.state.clone());

        tracing::info!("Aggregation API listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

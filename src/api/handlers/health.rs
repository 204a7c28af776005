//! Health check endpoint handlers.

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};

use crate::api::dto::{HealthResponse, HealthStatus};
use crate::state::AppState;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Basic health check
/// - `GET /health/live` - Liveness probe
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
}

/// Reports the version, the registered sites and how many tasks exist.
/// Degraded when no site adapters are registered.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let sites: Vec<String> = state
        .orchestrator
        .list_sites()
        .into_iter()
        .map(str::to_string)
        .collect();
    let status = if sites.is_empty() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    Json(HealthResponse {
        status,
        version: state.settings.application.version.clone(),
        timestamp: jiff::Timestamp::now().to_string(),
        sites,
        tasks: state.orchestrator.task_count(),
    })
}

pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

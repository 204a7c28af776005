//! Scrape submission, status polling and CSV download.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use uuid::Uuid;

use crate::api::dto::{ScrapeRequest, ScrapeResponse, SitesResponse};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::tasks::TaskView;
use crate::utils::ValidatedJson;

/// Routes mounted under `/api`.
pub fn scrape_routes() -> Router<AppState> {
    Router::new()
        .route("/scrape", post(start_scrape))
        .route("/status/{task_id}", get(task_status))
        .route("/download/{task_id}", get(download_results))
        .route("/sites", get(list_sites))
}

/// POST /api/scrape
async fn start_scrape(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ScrapeRequest>,
) -> AppResult<Json<ScrapeResponse>> {
    let company = req.company.trim();
    if company.is_empty() {
        return Err(AppError::Validation {
            field: "company".to_string(),
            reason: "Company name is required".to_string(),
        });
    }

    let task_id = state
        .orchestrator
        .submit(company, req.normalize_options())?;
    Ok(Json(ScrapeResponse::started(task_id)))
}

/// GET /api/status/{task_id}
async fn task_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Json<TaskView>> {
    let task_id = parse_task_id(&task_id)?;
    Ok(Json(state.orchestrator.query(task_id)?))
}

/// GET /api/download/{task_id}
async fn download_results(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> AppResult<Response> {
    let task_id = parse_task_id(&task_id)?;
    let export = state.orchestrator.materialize(task_id).await?;
    tracing::info!(%task_id, rows = export.rows, file = %export.file_name, "Serving export");

    let disposition = format!("attachment; filename=\"{}\"", export.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    )
        .into_response())
}

/// GET /api/sites
async fn list_sites(State(state): State<AppState>) -> Json<SitesResponse> {
    let sites = state
        .orchestrator
        .list_sites()
        .into_iter()
        .map(str::to_string)
        .collect();
    Json(SitesResponse { sites })
}

/// Malformed ids get the same answer as ids that were never issued.
fn parse_task_id(raw: &str) -> AppResult<Uuid> {
    raw.parse::<Uuid>().map_err(|_| AppError::NotFound {
        entity: "task".to_string(),
        field: "task_id".to_string(),
        value: raw.to_string(),
        message: format!("Invalid task ID: {raw}"),
    })
}

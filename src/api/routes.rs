//! Router configuration for the API.

use std::time::Duration;

use axum::{Router, http::StatusCode, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;

use crate::api::handlers;
use crate::api::middleware::{global_error_handler, logging_middleware, request_id_middleware};
use crate::state::AppState;

/// Creates the application router with all routes and middleware.
///
/// # Middleware Order
/// Last added runs first:
/// 1. Request ID
/// 2. CORS (permissive)
/// 3. Logging
/// 4. Compression
/// 5. Error normalization, which needs the request id and an uncompressed body
/// 6. Request timeout, answered with 408
///
/// # Routes
/// - `POST /api/scrape`
/// - `GET /api/status/{task_id}`
/// - `GET /api/download/{task_id}`
/// - `GET /api/sites`
/// - `GET /health`, `GET /health/live`
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.settings.server.request_timeout);

    Router::new()
        .nest("/api", handlers::scrape::scrape_routes())
        .merge(handlers::health::health_routes())
        .layer(timeout_layer(timeout))
        .layer(middleware::from_fn(global_error_handler))
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::api::middleware::REQUEST_ID_HEADER;
    use crate::config::Settings;
    use crate::scraper::testing::{FakeDriver, FakeSite, swiggy_page};
    use crate::scraper::{NormalizeOptions, PaginationPolicy, ScrapeOptions, SiteRegistry};
    use crate::tasks::{ExportOptions, TaskOrchestrator};

    fn app(site: FakeSite) -> Router {
        let options = ScrapeOptions {
            normalize: NormalizeOptions::default(),
            frame_timeout: Duration::from_millis(40),
            pagination: PaginationPolicy {
                settle_delay: Duration::from_millis(1),
                row_timeout: Duration::from_millis(40),
                poll_interval: Duration::from_millis(5),
                max_pages: 10,
            },
        };
        let orchestrator = TaskOrchestrator::new(
            SiteRegistry::with_defaults(),
            Arc::new(FakeDriver::new(site)),
            options,
            ExportOptions::default(),
        );
        create_router(AppState::with_orchestrator(Settings::default(), orchestrator))
    }

    fn two_page_swiggy() -> FakeSite {
        FakeSite::swiggy(vec![
            swiggy_page(&["SDE I", "SDE II", "SDE III"]),
            swiggy_page(&["Designer", "Analyst"]),
        ])
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn submit(app: &Router, company: &str) -> String {
        let response = send(app, post_json("/api/scrape", json!({ "company": company }))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "started");
        body["task_id"].as_str().unwrap().to_string()
    }

    async fn poll_until_done(app: &Router, task_id: &str) -> Value {
        for _ in 0..500 {
            let body = json_body(send(app, get(&format!("/api/status/{task_id}"))).await).await;
            if body["status"] != "running" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {task_id} never finished");
    }

    #[tokio::test]
    async fn test_scrape_status_and_download_flow() {
        let app = app(two_page_swiggy());
        let task_id = submit(&app, " Swiggy ").await;

        let status = poll_until_done(&app, &task_id).await;
        assert_eq!(status["status"], "completed");
        assert_eq!(status["progress"], 100);
        assert_eq!(status["record_count"], 5);
        assert_eq!(status["data"].as_array().unwrap().len(), 5);
        assert_eq!(status["data"][0]["title"], "SDE I");

        let response = send(&app, get(&format!("/api/download/{task_id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"jobs_"));
        assert!(disposition.ends_with(".csv\""));

        let csv = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&csv).lines().count(), 6);
    }

    #[tokio::test]
    async fn test_unsupported_site_lists_supported_ones() {
        let app = app(two_page_swiggy());
        let response = send(&app, post_json("/api/scrape", json!({ "company": "acme" }))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = json_body(response).await;
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["message"].as_str().unwrap().contains("Currently supported: swiggy, wipro"));
        assert_eq!(body["details"]["supported"], json!(["swiggy", "wipro"]));
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_blank_company_is_rejected() {
        let app = app(two_page_swiggy());
        for company in ["", "   "] {
            let response =
                send(&app, post_json("/api/scrape", json!({ "company": company }))).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_task_ids() {
        let app = app(two_page_swiggy());

        let response = send(&app, get("/api/status/not-a-uuid")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["message"], "Invalid task ID: not-a-uuid");

        let missing = uuid::Uuid::new_v4();
        let response = send(&app, get(&format!("/api/download/{missing}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await["message"],
            format!("Invalid task ID: {missing}")
        );
    }

    #[tokio::test]
    async fn test_download_of_failed_task_is_not_found() {
        let app = app(FakeSite::swiggy(Vec::new()).frame_never_loads());
        let task_id = submit(&app, "swiggy").await;

        let status = poll_until_done(&app, &task_id).await;
        assert_eq!(status["status"], "error");
        assert!(status.get("data").is_none());

        let response = send(&app, get(&format!("/api/download/{task_id}"))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(response).await["message"],
            format!("No data available for task {task_id}")
        );
    }

    #[tokio::test]
    async fn test_sites_and_health() {
        let app = app(two_page_swiggy());

        let body = json_body(send(&app, get("/api/sites")).await).await;
        assert_eq!(body["sites"], json!(["swiggy", "wipro"]));

        let response = send(&app, get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["tasks"], 0);

        let response = send(&app, get("/health/live")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_route_gets_json_error_and_request_id() {
        let app = app(two_page_swiggy());
        let response = send(
            &app,
            Request::get("/api/nope")
                .header(REQUEST_ID_HEADER, "req-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-7");
        let body = json_body(response).await;
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["request_id"], "req-7");
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_408() {
        let app = Router::new()
            .route(
                "/slow",
                axum::routing::get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "done"
                }),
            )
            .layer(timeout_layer(Duration::from_millis(20)));

        let response = send(&app, get("/slow")).await;
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}

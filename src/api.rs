//! HTTP surface: `POST /analyze` plus health and OpenAPI docs.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::analyzer::{AnalysisResult, ReviewAnalyzer};
use crate::product_url::VENDOR_MARKER;

pub struct AppState {
    pub analyzer: Arc<ReviewAnalyzer>,
    /// Cancelled on shutdown; each request gets a child token
    pub shutdown: CancellationToken,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Product detail page URL
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(analyze, health),
    components(schemas(AnalyzeRequest, AnalysisResult, HealthResponse)),
    tags((name = "analysis", description = "Review summary API"))
)]
pub struct ApiDoc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/analyze", post(analyze))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Summarize the reviews of one product.
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Summary payload, or an `error` field", body = AnalysisResult)
    ),
    tag = "analysis"
)]
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Json<AnalysisResult> {
    info!("📨 Received analyze request");

    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection);
            return Json(AnalysisResult::failure(format!(
                "Invalid request body: {}",
                rejection.body_text()
            )));
        }
    };

    let Some(url) = req.url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty()) else {
        return Json(AnalysisResult::failure("No URL provided"));
    };
    if !url.to_lowercase().contains(VENDOR_MARKER) {
        warn!("Rejected non-vendor URL: {}", url);
        return Json(AnalysisResult::failure("Please enter a valid Amazon URL"));
    }

    let analyzer = state.analyzer.clone();
    let result = run_cancellable(state.shutdown.child_token(), move |cancel| {
        analyzer.analyze_with_cancel(&url, cancel)
    })
    .await
    .unwrap_or_else(|e| {
        error!("🔥 Analysis task failed: {}", e);
        AnalysisResult::failure(format!("An error occurred: {}", e))
    });

    Json(result)
}

/// Runs `job` on the blocking pool, since the browser driver blocks.
/// If the returned future is dropped (client went away), `cancel` fires.
async fn run_cancellable<T, F>(cancel: CancellationToken, job: F) -> Result<T, JoinError>
where
    F: FnOnce(CancellationToken) -> T + Send + 'static,
    T: Send + 'static,
{
    let _abandon = cancel.clone().drop_guard();
    tokio::task::spawn_blocking(move || job(cancel)).await
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "analysis"
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::{Html, Json},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ApiError, AppState, HealthResponse, SearchStarted};
use crate::models::SearchJob;
use crate::utils::error::AppError;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct SearchRequest {
    #[serde(default)]
    #[validate(length(max = 255, message = "Part number must be at most 255 characters"))]
    pub part_number: String,
    #[serde(default)]
    pub websites: Vec<String>,
}

pub async fn start_search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchStarted>, ApiError> {
    let Json(request) = payload?;
    request.validate().map_err(AppError::from)?;

    let search_id = state.tracker.submit(&request.part_number, &request.websites).await?;
    tracing::info!(search_id = %search_id, "Search started");

    Ok(Json(SearchStarted::new(search_id)))
}

pub async fn search_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SearchJob>, ApiError> {
    let job = state.tracker.get_status(&id).await?;
    Ok(Json(job))
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.tracker.stats().await;
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: "socket-finder".to_string(),
        running_searches: stats.running_jobs,
        uptime_seconds: stats.uptime_seconds,
    })
}

/// Prometheus text exposition, when the recorder is installed.
pub async fn render_metrics(State(state): State<AppState>) -> Result<String, ApiError> {
    match &state.metrics {
        Some(handle) => Ok(handle.render()),
        None => Err(ApiError::not_found("Metrics are disabled")),
    }
}

pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

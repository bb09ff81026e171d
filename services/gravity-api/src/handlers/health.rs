//! Health, readiness and metrics handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub raster: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_time: Option<String>,
}

/// GET /health - Basic health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /ready - Readiness check (opens the raster if it is not open yet)
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let raster_status = match state.raster.acquire().await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {}", e),
    };
    let is_ready = raster_status == "ok";

    let response = ReadyResponse {
        ready: is_ready,
        raster: raster_status,
        travel_time: state.cells.as_ref().map(|_| "configured".to_string()),
    };

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response)).into_response()
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let mut body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let (hits, misses) = state
        .cells
        .as_ref()
        .map(|cells| cells.cache_stats())
        .unwrap_or((0, 0));
    body.push_str(&format!(
        "# HELP raster_open_attempts Raster open attempts\n# TYPE raster_open_attempts gauge\nraster_open_attempts {}\n",
        state.raster.open_attempts()
    ));
    body.push_str(&format!(
        "# HELP travel_time_cache_hits Travel-time cell cache hits\n# TYPE travel_time_cache_hits gauge\ntravel_time_cache_hits {}\n",
        hits
    ));
    body.push_str(&format!(
        "# HELP travel_time_cache_misses Travel-time cell cache misses\n# TYPE travel_time_cache_misses gauge\ntravel_time_cache_misses {}\n",
        misses
    ));

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

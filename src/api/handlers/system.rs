//! System endpoints: health check and relay occupancy.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::service::RelayStats;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `GET /relay/stats` — Connection and room occupancy.
#[utoipa::path(
    get,
    path = "/api/v1/relay/stats",
    tag = "System",
    summary = "Relay occupancy",
    description = "Returns the number of live connections and the member count of every non-empty room.",
    responses(
        (status = 200, description = "Current occupancy", body = RelayStats),
    )
)]
pub async fn stats_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.relay.stats().await)
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_handler))
}

/// Relay stats route, nested under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/relay/stats", get(stats_handler))
}

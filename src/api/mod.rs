//! HTTP layer: route handlers, DTOs and router composition.
//!
//! Resource endpoints are mounted under `/api/v1`; `/health`, `/poll` and
//! `/ws` sit at the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the router with every REST and polling endpoint.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
        .merge(handlers::poll::routes())
}

/// Builds the complete application: REST, polling, WebSocket, docs and
/// middleware, bound to `state`.
pub fn build_app(state: AppState) -> Router {
    let app = Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    app.layer(TimeoutLayer::with_status_code(
        StatusCode::REQUEST_TIMEOUT,
        state.config.request_timeout,
    ))
    .layer(TraceLayer::new_for_http())
    .layer(cors_layer(state.config.dashboard_origin.as_deref()))
    .with_state(state)
}

/// Restricts CORS to the dashboard origin when one is configured.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
        Err(e) => {
            tracing::warn!(error = %e, "invalid DASHBOARD_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

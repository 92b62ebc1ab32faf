//! Axum WebSocket upgrade handler.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /ws` — Upgrade HTTP connection to WebSocket.
///
/// Clients that cannot upgrade fall back to the `/poll` endpoints.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let relay = Arc::clone(&state.relay);

    ws.on_failed_upgrade(|e| tracing::debug!(error = %e, "ws upgrade failed"))
        .on_upgrade(move |socket| run_connection(socket, relay))
}

//! Long-polling transport: the fallback for clients whose WebSocket upgrade
//! fails.
//!
//! `POST /poll` opens a session, `GET /poll/{id}` waits for queued frames,
//! `POST /poll/{id}` sends one inbound frame and `DELETE /poll/{id}` closes
//! the session. Idle sessions are reaped by [`spawn_sweeper`].

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::task::JoinHandle;

use crate::api::dto::PollSessionResponse;
use crate::app_state::AppState;
use crate::domain::{ConnectionId, OutboundFrame, PollSessions};
use crate::error::{ErrorResponse, RelayError};
use crate::service::Relay;

fn parse_id(raw: &str) -> Result<ConnectionId, RelayError> {
    raw.parse()
        .map_err(|_| RelayError::InvalidPayload(format!("invalid connection id: {raw}")))
}

/// `POST /poll` — Open a polling session.
#[utoipa::path(
    post,
    path = "/poll",
    tag = "Polling",
    summary = "Open a long-polling session",
    description = "Registers a new connection with no rooms and returns its ID.",
    responses(
        (status = 201, description = "Session opened", body = PollSessionResponse),
    )
)]
pub async fn open_session(State(state): State<AppState>) -> impl IntoResponse {
    let (id, outbound) = state.relay.connect().await;
    state.poll_sessions.open(id, outbound).await;
    (
        StatusCode::CREATED,
        Json(PollSessionResponse {
            connection_id: id,
            poll_wait_secs: state.config.poll_wait.as_secs(),
        }),
    )
}

/// `GET /poll/{id}` — Wait for queued frames.
///
/// # Errors
///
/// Returns [`RelayError::ConnectionNotFound`] for unknown or closed
/// sessions.
#[utoipa::path(
    get,
    path = "/poll/{id}",
    tag = "Polling",
    summary = "Receive queued events",
    description = "Waits for the first queued frame, then returns up to the batch limit as a JSON array. An empty array means the wait timed out.",
    params(("id" = String, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Array of outbound frames"),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn poll_frames(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    let id = parse_id(&raw_id)?;
    let session = state.poll_sessions.get(id).await?;
    let frames = match session
        .poll(state.config.poll_wait, state.config.poll_batch_max)
        .await
    {
        Ok(frames) => frames,
        Err(e) => {
            state.poll_sessions.close(id).await;
            return Err(e);
        }
    };
    let body: Vec<&OutboundFrame> = frames.iter().map(|frame| &**frame).collect();
    let body = serde_json::to_value(body).map_err(|e| RelayError::Internal(e.to_string()))?;
    Ok(Json(body))
}

/// `POST /poll/{id}` — Send one inbound frame.
///
/// Always answers 204 for a known session, whether or not the frame was
/// valid.
///
/// # Errors
///
/// Returns [`RelayError::ConnectionNotFound`] for unknown sessions.
#[utoipa::path(
    post,
    path = "/poll/{id}",
    tag = "Polling",
    summary = "Send an inbound event",
    description = "Accepts one `{event, data}` frame. Malformed frames are dropped silently.",
    params(("id" = String, Path, description = "Connection ID")),
    request_body(content = String, content_type = "application/json"),
    responses(
        (status = 204, description = "Frame accepted"),
        (status = 404, description = "Unknown session", body = ErrorResponse),
    )
)]
pub async fn send_frame(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: String,
) -> Result<impl IntoResponse, RelayError> {
    let id = parse_id(&raw_id)?;
    let session = state.poll_sessions.get(id).await?;
    session.touch().await;
    state.relay.handle_text(id, &body).await;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /poll/{id}` — Close a polling session.
///
/// IDs that do not belong to an open polling session are ignored.
///
/// # Errors
///
/// Returns [`RelayError::InvalidPayload`] for an unparsable ID.
#[utoipa::path(
    delete,
    path = "/poll/{id}",
    tag = "Polling",
    summary = "Close a long-polling session",
    description = "Disconnects the polling session and removes it from every room. IDs of other transports are ignored. Idempotent.",
    params(("id" = String, Path, description = "Connection ID")),
    responses(
        (status = 204, description = "Session closed"),
    )
)]
pub async fn close_session(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<impl IntoResponse, RelayError> {
    let id = parse_id(&raw_id)?;
    // only polling connections are owned here; a WebSocket id is left alone
    if state.poll_sessions.close(id).await {
        state.relay.disconnect(id).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Disconnects every session idle for longer than `idle_timeout`. Returns
/// how many were reaped.
pub async fn sweep_idle(relay: &Relay, sessions: &PollSessions, idle_timeout: Duration) -> usize {
    let idle = sessions.idle(idle_timeout).await;
    for id in &idle {
        sessions.close(*id).await;
        relay.disconnect(*id).await;
        tracing::debug!(connection = %id, "reaped idle poll session");
    }
    idle.len()
}

/// Spawns the periodic idle-session sweeper.
#[must_use]
pub fn spawn_sweeper(state: &AppState) -> JoinHandle<()> {
    let relay = Arc::clone(&state.relay);
    let sessions = Arc::clone(&state.poll_sessions);
    let period = state.config.poll_sweep_interval;
    let idle_timeout = state.config.poll_idle_timeout;

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let reaped = sweep_idle(&relay, &sessions, idle_timeout).await;
            if reaped > 0 {
                tracing::info!(reaped, "poll sweeper removed idle sessions");
            }
        }
    })
}

/// Polling routes, mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/poll", post(open_session))
        .route(
            "/poll/{id}",
            get(poll_frames)
                .post(send_frame)
                .delete(close_session),
        )
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sweep_disconnects_idle_sessions_only() {
        let relay = Relay::new("dashboard", 8);
        let sessions = PollSessions::new();

        let (stale, stale_rx) = relay.connect().await;
        sessions.open(stale, stale_rx).await;
        let _ = relay.join(stale, "dashboard").await;

        tokio::time::advance(Duration::from_secs(50)).await;
        let (fresh, fresh_rx) = relay.connect().await;
        sessions.open(fresh, fresh_rx).await;
        tokio::time::advance(Duration::from_secs(20)).await;

        let reaped = sweep_idle(&relay, &sessions, Duration::from_secs(60)).await;
        assert_eq!(reaped, 1);
        assert!(!relay.registry().contains(stale).await);
        assert!(relay.registry().contains(fresh).await);
        assert!(relay.registry().room_members("dashboard").await.is_empty());
        assert_eq!(sessions.len().await, 1);
    }

    #[test]
    fn parse_id_rejects_garbage() {
        assert!(matches!(
            parse_id("nope"),
            Err(RelayError::InvalidPayload(_))
        ));
    }
}

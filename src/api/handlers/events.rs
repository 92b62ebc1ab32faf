//! Server-side emit endpoints.
//!
//! Lets backend processes (GPS ingestion, ticket workflows) push events into
//! the relay without holding a socket. Routing is identical to events sent
//! by connected clients.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::DeliveryResponse;
use crate::app_state::AppState;
use crate::domain::{DriverPosition, PropertyStatus};
use crate::error::{ErrorResponse, RelayError};

/// `POST /events/driver-position` — Forward a driver position to the
/// dashboard room.
///
/// # Errors
///
/// Returns [`RelayError::InvalidPayload`] for a malformed body.
#[utoipa::path(
    post,
    path = "/api/v1/events/driver-position",
    tag = "Events",
    summary = "Emit a driver position",
    description = "Forwards a `driver-position` event to every connection in the dashboard room.",
    request_body = DriverPosition,
    responses(
        (status = 202, description = "Event forwarded", body = DeliveryResponse),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
    )
)]
pub async fn emit_driver_position(
    State(state): State<AppState>,
    payload: Result<Json<DriverPosition>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let Json(position) = payload.map_err(|e| RelayError::InvalidPayload(e.body_text()))?;
    let delivery = state.relay.emit_driver_position(position).await?;
    Ok((StatusCode::ACCEPTED, Json(DeliveryResponse::from(delivery))))
}

/// `POST /events/property-status` — Broadcast a property status.
///
/// # Errors
///
/// Returns [`RelayError::InvalidPayload`] for a malformed body.
#[utoipa::path(
    post,
    path = "/api/v1/events/property-status",
    tag = "Events",
    summary = "Emit a property status",
    description = "Forwards a `property-status` event to every connected client.",
    request_body = PropertyStatus,
    responses(
        (status = 202, description = "Event forwarded", body = DeliveryResponse),
        (status = 400, description = "Malformed payload", body = ErrorResponse),
    )
)]
pub async fn emit_property_status(
    State(state): State<AppState>,
    payload: Result<Json<PropertyStatus>, JsonRejection>,
) -> Result<impl IntoResponse, RelayError> {
    let Json(status) = payload.map_err(|e| RelayError::InvalidPayload(e.body_text()))?;
    let delivery = state.relay.emit_property_status(status).await?;
    Ok((StatusCode::ACCEPTED, Json(DeliveryResponse::from(delivery))))
}

/// Event routes, nested under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events/driver-position", post(emit_driver_position))
        .route("/events/property-status", post(emit_property_status))
}

//! OpenAPI document for the HTTP surface.

use utoipa::OpenApi;

use super::dto::{DeliveryResponse, PollSessionResponse};
use super::handlers::{events, poll, system};
use crate::domain::{DriverPosition, PropertyStatus};
use crate::error::{ErrorBody, ErrorResponse};
use crate::service::RelayStats;

/// Generated OpenAPI document, served by Swagger UI when the
/// `swagger-ui` feature is enabled.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "snowfleet-relay",
        description = "Real-time event relay for the snow-removal fleet dashboard. The WebSocket endpoint lives at `/ws`."
    ),
    paths(
        system::health_handler,
        system::stats_handler,
        events::emit_driver_position,
        events::emit_property_status,
        poll::open_session,
        poll::poll_frames,
        poll::send_frame,
        poll::close_session,
    ),
    components(schemas(
        DriverPosition,
        PropertyStatus,
        DeliveryResponse,
        PollSessionResponse,
        RelayStats,
        ErrorResponse,
        ErrorBody,
    )),
    tags(
        (name = "System", description = "Health and occupancy"),
        (name = "Events", description = "Server-side event emission"),
        (name = "Polling", description = "Long-polling fallback transport"),
    )
)]
pub struct ApiDoc;

//! Request/response bodies for the relay endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{ConnectionId, Delivery};

/// Outcome of a server-side emit.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DeliveryResponse {
    /// Recipients whose queue accepted the event.
    pub delivered: usize,
    /// Recipients skipped because their queue was full or closed.
    pub dropped: usize,
}

impl From<Delivery> for DeliveryResponse {
    fn from(d: Delivery) -> Self {
        Self {
            delivered: d.delivered,
            dropped: d.dropped,
        }
    }
}

/// Response to opening a long-polling session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PollSessionResponse {
    /// Connection ID to use in subsequent `/poll/{id}` calls.
    #[schema(value_type = String, format = Uuid)]
    pub connection_id: ConnectionId,
    /// Server-side wait per `GET`, in seconds.
    pub poll_wait_secs: u64,
}

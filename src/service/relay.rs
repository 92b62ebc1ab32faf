//! Relay service: connection lifecycle, room commands and event fan-out.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use utoipa::ToSchema;

use crate::config::RelayConfig;
use crate::domain::{
    ConnectionId, Delivery, DriverPosition, EventKind, InboundCommand, Outbound, PropertyStatus,
    RelayEvent, RoomRegistry,
};
use crate::error::RelayError;

/// Snapshot of relay occupancy.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RelayStats {
    /// Registered connections across all transports.
    pub connections: usize,
    /// Member count per non-empty room.
    pub rooms: BTreeMap<String, usize>,
}

/// The event relay.
///
/// Constructed explicitly and shared as `Arc<Relay>`; there is no
/// process-wide instance. Every transport goes through the same
/// operations:
///
/// connect → (join | leave | publish)* → disconnect
///
/// `driver-position` events are routed to the dashboard room only.
/// `property-status` events are routed to every connection.
#[derive(Debug)]
pub struct Relay {
    registry: RoomRegistry,
    dashboard_room: String,
}

impl Relay {
    /// Creates a relay routing driver positions to `dashboard_room`.
    #[must_use]
    pub fn new(dashboard_room: impl Into<String>, queue_capacity: usize) -> Self {
        Self {
            registry: RoomRegistry::new(queue_capacity),
            dashboard_room: dashboard_room.into(),
        }
    }

    /// Creates a relay from loaded configuration.
    #[must_use]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(config.dashboard_room.clone(), config.outbound_queue_capacity)
    }

    /// Room that receives `driver-position` events.
    #[must_use]
    pub fn dashboard_room(&self) -> &str {
        &self.dashboard_room
    }

    /// Returns a reference to the inner [`RoomRegistry`].
    #[must_use]
    pub const fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// Registers a new connection with no rooms. The caller drains the
    /// returned receiver into its transport.
    pub async fn connect(&self) -> (ConnectionId, mpsc::Receiver<Outbound>) {
        let (id, rx) = self.registry.register().await;
        tracing::debug!(connection = %id, "client connected");
        (id, rx)
    }

    /// Adds `id` to `room`. Joining twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionNotFound`] if `id` is not
    /// connected.
    pub async fn join(&self, id: ConnectionId, room: &str) -> Result<(), RelayError> {
        if self.registry.join(id, room).await? {
            tracing::debug!(connection = %id, room, "joined room");
        }
        Ok(())
    }

    /// Removes `id` from `room`. Leaving a room never joined is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionNotFound`] if `id` is not
    /// connected.
    pub async fn leave(&self, id: ConnectionId, room: &str) -> Result<(), RelayError> {
        if self.registry.leave(id, room).await? {
            tracing::debug!(connection = %id, room, "left room");
        }
        Ok(())
    }

    /// Validates and forwards an event sent by connection `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::ConnectionNotFound`] if the sender is gone and
    /// [`RelayError::InvalidPayload`] if the payload is malformed for its
    /// kind. Either way nothing is forwarded.
    pub async fn publish(
        &self,
        id: ConnectionId,
        kind: EventKind,
        payload: serde_json::Value,
    ) -> Result<Delivery, RelayError> {
        if !self.registry.contains(id).await {
            return Err(RelayError::ConnectionNotFound(id));
        }
        let event = RelayEvent::from_payload(kind, payload)?;
        self.forward(event).await
    }

    /// Drops `id` and all its memberships. Other connections are not
    /// notified. Returns `false` if it was already gone.
    pub async fn disconnect(&self, id: ConnectionId) -> bool {
        let removed = self.registry.unregister(id).await;
        if removed {
            tracing::debug!(connection = %id, "client disconnected");
        }
        removed
    }

    /// Executes one parsed client command.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying operation.
    pub async fn dispatch(&self, id: ConnectionId, command: InboundCommand) -> Result<(), RelayError> {
        match command {
            InboundCommand::JoinRoom(room) => self.join(id, &room).await,
            InboundCommand::LeaveRoom(room) => self.leave(id, &room).await,
            InboundCommand::Publish(kind, payload) => {
                self.publish(id, kind, payload).await.map(|_| ())
            }
        }
    }

    /// Parses and dispatches a text frame from `id`.
    ///
    /// Errors are logged and swallowed: the sender never gets a reply.
    pub async fn handle_text(&self, id: ConnectionId, text: &str) {
        let result = match InboundCommand::parse(text) {
            Ok(command) => self.dispatch(id, command).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::debug!(connection = %id, error = %e, "dropped inbound frame");
        }
    }

    /// Forwards a driver position from a server-side caller.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidPayload`] for non-finite coordinates.
    pub async fn emit_driver_position(&self, position: DriverPosition) -> Result<Delivery, RelayError> {
        position.validate()?;
        self.forward(RelayEvent::DriverPosition(position)).await
    }

    /// Forwards a property status from a server-side caller.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the frame cannot be encoded.
    pub async fn emit_property_status(&self, status: PropertyStatus) -> Result<Delivery, RelayError> {
        self.forward(RelayEvent::PropertyStatus(status)).await
    }

    /// Current connection and room occupancy.
    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            connections: self.registry.connection_count().await,
            rooms: self.registry.room_sizes().await,
        }
    }

    async fn forward(&self, event: RelayEvent) -> Result<Delivery, RelayError> {
        let name = event.name();
        let scope = event.scope(&self.dashboard_room);
        let frame: Outbound = Arc::new(event.into_frame()?);
        let delivery = self.registry.deliver(scope, &frame).await;
        tracing::trace!(
            event = name,
            delivered = delivery.delivered,
            dropped = delivery.dropped,
            "event forwarded"
        );
        Ok(delivery)
    }
}

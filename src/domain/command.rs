//! Inbound frames and the commands they carry.
//!
//! Every transport delivers the same envelope:
//!
//! ```json
//! { "event": "join-room", "data": "dashboard" }
//! { "event": "driver-position-update", "data": { "driverId": "d1", ... } }
//! ```
//!
//! Room arguments may be a bare string or `{ "room": "..." }`.

use serde::Deserialize;

use super::relay_event::EventKind;
use crate::error::RelayError;

/// Raw inbound envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundFrame {
    /// Inbound event name.
    pub event: String,
    /// Event payload. Missing means `null`.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A parsed client command.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundCommand {
    /// `join-room`
    JoinRoom(String),
    /// `leave-room`
    LeaveRoom(String),
    /// `driver-position-update` / `property-status-update`, payload not yet
    /// validated.
    Publish(EventKind, serde_json::Value),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RoomArg {
    Bare(String),
    Object { room: String },
}

impl InboundCommand {
    /// Parses a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::MalformedFrame`] for invalid JSON and the
    /// errors of [`InboundCommand::from_frame`] otherwise.
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let frame: InboundFrame =
            serde_json::from_str(text).map_err(|e| RelayError::MalformedFrame(e.to_string()))?;
        Self::from_frame(frame)
    }

    /// Interprets an envelope.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::UnknownEvent`] for unhandled event names and
    /// [`RelayError::InvalidPayload`] for a missing or empty room name.
    pub fn from_frame(frame: InboundFrame) -> Result<Self, RelayError> {
        let kind = match frame.event.as_str() {
            "join-room" => return room_arg(frame.data).map(Self::JoinRoom),
            "leave-room" => return room_arg(frame.data).map(Self::LeaveRoom),
            name => EventKind::from_inbound_name(name),
        };
        match kind {
            Some(kind) => Ok(Self::Publish(kind, frame.data)),
            None => Err(RelayError::UnknownEvent(frame.event)),
        }
    }
}

fn room_arg(data: serde_json::Value) -> Result<String, RelayError> {
    let room = match serde_json::from_value(data) {
        Ok(RoomArg::Bare(room) | RoomArg::Object { room }) => room,
        Err(_) => return Err(RelayError::InvalidPayload("room must be a string".to_string())),
    };
    if room.is_empty() {
        return Err(RelayError::InvalidPayload("room must not be empty".to_string()));
    }
    Ok(room)
}

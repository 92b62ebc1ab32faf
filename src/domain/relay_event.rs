//! Events forwarded by the relay.
//!
//! Two payload shapes exist: [`DriverPosition`] and [`PropertyStatus`].
//! Inbound payloads arrive as loose JSON and are validated into a
//! [`RelayEvent`] by [`RelayEvent::from_payload`]. Validated events are
//! wrapped in an [`OutboundFrame`] once and the same frame is shared by
//! every recipient.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::RelayError;

/// A frame as queued for one recipient. Shared across the whole fan-out.
pub type Outbound = Arc<OutboundFrame>;

/// Latest known position of a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DriverPosition {
    /// Driver identifier.
    pub driver_id: String,
    /// WGS84 latitude in degrees.
    pub latitude: f64,
    /// WGS84 longitude in degrees.
    pub longitude: f64,
    /// Driver status (e.g. `"ON_ROUTE"`).
    pub status: String,
}

/// New status of a serviced property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyStatus {
    /// Property identifier.
    pub property_id: String,
    /// Property status (e.g. `"CLEARED"`).
    pub status: String,
}

impl DriverPosition {
    /// Checks that both coordinates are finite numbers.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidPayload`] on `NaN` or infinite
    /// coordinates.
    pub fn validate(&self) -> Result<(), RelayError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(RelayError::InvalidPayload(format!(
                "non-finite coordinates for driver {}",
                self.driver_id
            )));
        }
        Ok(())
    }
}

/// Inbound publish kinds a client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `driver-position-update`, re-emitted as `driver-position`.
    DriverPositionUpdate,
    /// `property-status-update`, re-emitted as `property-status`.
    PropertyStatusUpdate,
}

impl EventKind {
    /// Maps an inbound event name to its kind.
    #[must_use]
    pub fn from_inbound_name(name: &str) -> Option<Self> {
        match name {
            "driver-position-update" => Some(Self::DriverPositionUpdate),
            "property-status-update" => Some(Self::PropertyStatusUpdate),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DriverPositionUpdate => "driver-position-update",
            Self::PropertyStatusUpdate => "property-status-update",
        })
    }
}

/// Who an event is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Members of the named room only.
    Room(&'a str),
    /// Every connected connection.
    All,
}

/// A validated event ready for fan-out.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    /// Driver moved. Room-scoped.
    DriverPosition(DriverPosition),
    /// Property status changed. Broadcast-scoped.
    PropertyStatus(PropertyStatus),
}

impl RelayEvent {
    /// Validates a raw payload for the given kind.
    ///
    /// Every required field must be present with the right JSON type.
    /// Unknown extra fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidPayload`] when a field is missing or
    /// mistyped.
    pub fn from_payload(kind: EventKind, payload: serde_json::Value) -> Result<Self, RelayError> {
        let invalid = |e: serde_json::Error| RelayError::InvalidPayload(format!("{kind}: {e}"));
        match kind {
            EventKind::DriverPositionUpdate => {
                let position: DriverPosition = serde_json::from_value(payload).map_err(invalid)?;
                position.validate()?;
                Ok(Self::DriverPosition(position))
            }
            EventKind::PropertyStatusUpdate => serde_json::from_value(payload)
                .map(Self::PropertyStatus)
                .map_err(invalid),
        }
    }

    /// Outbound event name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DriverPosition(_) => "driver-position",
            Self::PropertyStatus(_) => "property-status",
        }
    }

    /// Routing scope. Driver positions go to `dashboard_room` only, property
    /// statuses go to everyone.
    #[must_use]
    pub fn scope<'a>(&self, dashboard_room: &'a str) -> Scope<'a> {
        match self {
            Self::DriverPosition(_) => Scope::Room(dashboard_room),
            Self::PropertyStatus(_) => Scope::All,
        }
    }

    /// Wraps the event into a timestamped frame.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if the payload cannot be encoded.
    pub fn into_frame(self) -> Result<OutboundFrame, RelayError> {
        let event = self.name();
        let data = match self {
            Self::DriverPosition(p) => serde_json::to_value(p),
            Self::PropertyStatus(p) => serde_json::to_value(p),
        }
        .map_err(|e| RelayError::Internal(e.to_string()))?;
        Ok(OutboundFrame {
            event,
            data,
            timestamp: Utc::now(),
        })
    }
}

/// Frame written to subscribed clients.
///
/// ```json
/// { "event": "driver-position", "data": { "driverId": "d1", ... }, "timestamp": "..." }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct OutboundFrame {
    /// Outbound event name.
    pub event: &'static str,
    /// Event payload, camelCase keys.
    pub data: serde_json::Value,
    /// Time the relay accepted the event.
    pub timestamp: DateTime<Utc>,
}

impl OutboundFrame {
    /// Encodes the frame as a JSON text message.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Internal`] if serialization fails.
    pub fn to_json(&self) -> Result<String, RelayError> {
        serde_json::to_string(self).map_err(|e| RelayError::Internal(e.to_string()))
    }
}

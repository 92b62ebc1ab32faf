//! Domain layer: connection identity, relay events, room membership and
//! polling sessions.
//!
//! Nothing here touches a socket. Transports hand the relay an outbound
//! queue receiver and the registry pushes frames into the matching
//! senders.

pub mod command;
pub mod connection_id;
pub mod poll_sessions;
pub mod relay_event;
pub mod room_registry;

pub use command::{InboundCommand, InboundFrame};
pub use connection_id::ConnectionId;
pub use poll_sessions::{PollSession, PollSessions};
pub use relay_event::{
    DriverPosition, EventKind, Outbound, OutboundFrame, PropertyStatus, RelayEvent, Scope,
};
pub use room_registry::{Delivery, RoomRegistry};

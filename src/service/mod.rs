//! Service layer: relay orchestration.
//!
//! [`Relay`] owns the [`super::domain::RoomRegistry`] and implements the
//! connection lifecycle and routing rules shared by every transport.

pub mod relay;

pub use relay::{Relay, RelayStats};

//! # snowfleet-relay
//!
//! Real-time event relay for the snow-removal fleet dashboard.
//!
//! Clients connect over WebSocket (or long-polling when the upgrade fails),
//! join named rooms and publish two kinds of events:
//!
//! - `driver-position-update` is re-emitted as `driver-position` to members
//!   of the `dashboard` room;
//! - `property-status-update` is re-emitted as `property-status` to every
//!   connected client.
//!
//! Delivery is best-effort and at-most-once. Nothing is persisted.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket, long-polling, server-side HTTP)
//!     │
//!     ├── WS Handler (ws/)
//!     ├── REST + Polling Handlers (api/)
//!     │
//!     ├── Relay (service/)
//!     │
//!     └── RoomRegistry + PollSessions (domain/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod ws;

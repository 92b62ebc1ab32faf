//! WebSocket transport.
//!
//! The endpoint at `/ws` is the primary transport: one socket per client,
//! JSON text frames in both directions.

pub mod connection;
pub mod handler;

//! Data Transfer Objects for REST request/response serialization.
//!
//! Event payloads themselves ([`crate::domain::DriverPosition`],
//! [`crate::domain::PropertyStatus`]) double as request bodies.

pub mod relay_dto;

pub use relay_dto::*;

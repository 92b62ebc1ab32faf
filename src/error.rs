//! Relay error types with HTTP status code mapping.
//!
//! [`RelayError`] is the central error type. Over HTTP each variant maps to
//! a status code and a structured JSON body. Over the socket transports
//! the same errors are logged and swallowed: a client that sends a bad
//! frame never gets a reply.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ConnectionId;

/// Structured JSON error response body.
///
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid payload: missing field `status`",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Relay error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request           |
/// | 2000–2999 | Not Found       | 404 Not Found             |
/// | 3000–3999 | Server          | 500 Internal Server Error |
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Event payload is missing a required field or has a mistyped one.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Inbound event name the relay does not handle.
    #[error("unknown event: {0}")]
    UnknownEvent(String),

    /// Inbound frame is not a valid JSON envelope.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// No live connection with the given ID.
    #[error("connection not found: {0}")]
    ConnectionNotFound(ConnectionId),

    /// Invalid startup configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidPayload(_) => 1001,
            Self::UnknownEvent(_) => 1002,
            Self::MalformedFrame(_) => 1003,
            Self::ConnectionNotFound(_) => 2001,
            Self::Internal(_) => 3000,
            Self::Config(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPayload(_) | Self::UnknownEvent(_) | Self::MalformedFrame(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ConnectionNotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

//! Response envelope and error conversion for the HTTP API.
//!
//! Every endpoint answers with `{ "response": "<message>" }`, success or not.
//! Ticket-code failures are part of the normal conversation with the caller
//! and keep status 200; only operational endpoints use error statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::codes::{FormatError, LookupError};

/// The `{ "response": ... }` body shared by all endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub response: String,
}

impl MessageResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Conflict error (409) - request does not apply in the current state
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Internal server error (500)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(MessageResponse::new(self.message))).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<FormatError> for ApiError {
    fn from(err: FormatError) -> Self {
        tracing::warn!(error = %err, "Ticket code request failed");
        ApiError::new(StatusCode::OK, err.user_message())
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::ReloadUnsupported => ApiError::conflict(err.to_string()),
            _ => {
                tracing::error!(error = %err, "Reason code table error");
                ApiError::internal(format!("Failed to load reason codes: {}", err))
            }
        }
    }
}

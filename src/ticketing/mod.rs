//! Helpdesk (ticketing) API integration.
//!
//! The formatter only needs one call from the helpdesk: the custom fields of a
//! single ticket. That call sits behind [`TicketingApi`] so the pipeline can run
//! against a fake in tests.

mod client;

pub use client::{basic_auth_header, TicketingClient};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Errors from the outbound helpdesk request.
#[derive(Debug, thiserror::Error)]
pub enum TicketingError {
    #[error("invalid ticketing URL: {0}")]
    InvalidUrl(String),
    #[error("ticketing request failed: {0}")]
    Transport(String),
    #[error("ticketing API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("ticketing API returned a non-JSON body: {0}")]
    InvalidBody(String),
}

#[async_trait]
pub trait TicketingApi: Send + Sync {
    /// Fetch the custom-field values attached to a ticket.
    async fn custom_fields(&self, ticket_id: &str) -> Result<CustomFieldsResponse, TicketingError>;
}

/// Body of `GET /api/tickets/{id}/custom-fields`.
///
/// `data` is `None` when the body has no `data` list at all.
#[derive(Debug, Clone, Default)]
pub struct CustomFieldsResponse {
    pub data: Option<Vec<CustomFieldValue>>,
}

impl CustomFieldsResponse {
    /// Build from an arbitrary JSON document. Entries that do not look like
    /// field values are dropped rather than failing the whole response.
    pub fn from_value(value: Value) -> Self {
        let data = match value {
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(entries)) => Some(
                    entries
                        .into_iter()
                        .filter_map(|entry| match serde_json::from_value(entry) {
                            Ok(entry) => Some(entry),
                            Err(e) => {
                                tracing::debug!(error = %e, "Skipping malformed custom field entry");
                                None
                            }
                        })
                        .collect(),
                ),
                _ => None,
            },
            _ => None,
        };
        Self { data }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldValue {
    #[serde(default)]
    pub field: Option<CustomFieldMeta>,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomFieldMeta {
    #[serde(default)]
    pub label: Option<String>,
}

impl CustomFieldValue {
    pub fn label(&self) -> Option<&str> {
        self.field.as_ref().and_then(|f| f.label.as_deref())
    }

    /// The value as text. Numbers and booleans use their JSON spelling;
    /// null, empty strings and structured values count as absent.
    pub fn text(&self) -> Option<String> {
        match &self.value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

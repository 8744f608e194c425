//! Transaction webhook.
//!
//! The payment provider posts a JSON document per transaction. The payload is
//! stored and forwarded by email; the caller always gets the same answer.

use axum::{body::Bytes, extract::State, Json};
use std::sync::Arc;

use super::error::MessageResponse;
use crate::db::insert_transaction;
use crate::AppState;

pub const WEBHOOK_REPLY: &str = "Hello!";

/// Compact JSON text of the body, or an empty string when it is not JSON.
pub fn payload_text(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => value.to_string(),
        Err(_) => String::new(),
    }
}

pub async fn transaction_webhook(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Json<MessageResponse> {
    let payload = payload_text(&body);

    match insert_transaction(&state.db, &payload).await {
        Ok(record) => {
            tracing::info!(id = %record.id, bytes = body.len(), "Transaction received");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to record transaction");
        }
    }

    let mailer = state.mailer.clone();
    state.background.spawn(async move {
        if let Err(e) = mailer.send_transaction_email(&payload).await {
            tracing::error!(error = %e, "Failed to send transaction email");
        }
    });

    Json(MessageResponse::new(WEBHOOK_REPLY))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_text() {
        assert_eq!(payload_text(br#"{ "amount": 10 }"#), r#"{"amount":10}"#);
        assert_eq!(payload_text(b""), "");
        assert_eq!(payload_text(b"amount=10"), "");
    }
}

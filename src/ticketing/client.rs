//! HTTP client for the helpdesk REST API.

use anyhow::Context;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Url;
use std::time::Duration;

use super::{CustomFieldsResponse, TicketingApi, TicketingError};
use crate::config::TicketingConfig;

/// Helpdesk API client authenticated with HTTP Basic credentials.
pub struct TicketingClient {
    base_url: String,
    authorization: String,
    client: reqwest::Client,
}

impl TicketingClient {
    pub fn new(config: &TicketingConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create ticketing HTTP client")?;

        Ok(Self {
            base_url: config.base_url.clone(),
            authorization: basic_auth_header(&config.username, &config.api_key),
            client,
        })
    }

    /// `{base_url}/api/tickets/{ticket_id}/custom-fields`, with the ticket id
    /// escaped as a single path segment.
    pub fn custom_fields_url(&self, ticket_id: &str) -> Result<Url, TicketingError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TicketingError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| TicketingError::InvalidUrl(self.base_url.clone()))?
            .pop_if_empty()
            .extend(["api", "tickets", ticket_id, "custom-fields"]);
        Ok(url)
    }
}

#[async_trait]
impl TicketingApi for TicketingClient {
    async fn custom_fields(&self, ticket_id: &str) -> Result<CustomFieldsResponse, TicketingError> {
        let url = self.custom_fields_url(ticket_id)?;

        tracing::info!(ticket_id = %ticket_id, "Fetching ticket custom fields");

        let response = self
            .client
            .get(url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| TicketingError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TicketingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TicketingError::Transport(e.to_string()))?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| TicketingError::InvalidBody(e.to_string()))?;

        Ok(CustomFieldsResponse::from_value(value))
    }
}

/// `Basic base64(username:api_key)`
pub fn basic_auth_header(username: &str, api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", username, api_key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, State},
        http::{header, HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn config(base_url: &str) -> TicketingConfig {
        TicketingConfig {
            base_url: base_url.to_string(),
            username: "ops@acme.test".to_string(),
            api_key: "k3y".to_string(),
            timeout_secs: 2,
            ..TicketingConfig::default()
        }
    }

    #[test]
    fn test_basic_auth_header() {
        assert_eq!(basic_auth_header("user", "key"), "Basic dXNlcjprZXk=");
        assert_eq!(
            basic_auth_header("Aladdin", "open sesame"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_custom_fields_url() {
        let client = TicketingClient::new(&config("https://acme.gorgias.com")).unwrap();
        assert_eq!(
            client.custom_fields_url("48213").unwrap().as_str(),
            "https://acme.gorgias.com/api/tickets/48213/custom-fields"
        );

        let client = TicketingClient::new(&config("https://acme.gorgias.com/")).unwrap();
        assert_eq!(
            client.custom_fields_url("48213").unwrap().as_str(),
            "https://acme.gorgias.com/api/tickets/48213/custom-fields"
        );
    }

    #[test]
    fn test_custom_fields_url_escapes_ticket_id() {
        let client = TicketingClient::new(&config("https://acme.gorgias.com")).unwrap();
        let url = client.custom_fields_url("12/../admin").unwrap();
        assert_eq!(
            url.as_str(),
            "https://acme.gorgias.com/api/tickets/12%2F..%2Fadmin/custom-fields"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let client = TicketingClient::new(&config("not a url")).unwrap();
        assert!(matches!(
            client.custom_fields_url("1"),
            Err(TicketingError::InvalidUrl(_))
        ));
    }

    type SeenHeaders = Arc<Mutex<Vec<(Option<String>, Option<String>)>>>;

    /// Local helpdesk stand-in. Ticket `404` answers 404, `garbled` answers a
    /// non-JSON 200, anything else gets a custom-fields document.
    async fn spawn_helpdesk() -> (String, SeenHeaders) {
        async fn custom_fields(
            State(seen): State<SeenHeaders>,
            Path(ticket_id): Path<String>,
            headers: HeaderMap,
        ) -> Response {
            let value_of = |name: header::HeaderName| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            seen.lock()
                .unwrap()
                .push((value_of(header::AUTHORIZATION), value_of(header::ACCEPT)));

            match ticket_id.as_str() {
                "404" => (StatusCode::NOT_FOUND, "Not Found").into_response(),
                "garbled" => (StatusCode::OK, "not json").into_response(),
                _ => Json(json!({
                    "data": [
                        { "field": { "label": "Replacement SKU" }, "value": "SKU-100" },
                        { "field": { "label": "Kit Group" }, "value": 4 }
                    ]
                }))
                .into_response(),
            }
        }

        let seen = SeenHeaders::default();
        let app = Router::new()
            .route("/api/tickets/:ticket_id/custom-fields", get(custom_fields))
            .with_state(seen.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), seen)
    }

    #[tokio::test]
    async fn test_custom_fields_sends_credentials_and_parses_data() {
        let (base_url, seen) = spawn_helpdesk().await;
        let client = TicketingClient::new(&config(&base_url)).unwrap();

        let response = client.custom_fields("48213").await.unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].label(), Some("Replacement SKU"));
        assert_eq!(data[0].text().as_deref(), Some("SKU-100"));
        assert_eq!(data[1].text().as_deref(), Some("4"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0].0.as_deref(),
            Some(basic_auth_header("ops@acme.test", "k3y").as_str())
        );
        assert_eq!(seen[0].1.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (base_url, _) = spawn_helpdesk().await;
        let client = TicketingClient::new(&config(&base_url)).unwrap();

        match client.custom_fields("404").await {
            Err(TicketingError::Status { status, body }) => {
                assert_eq!(status, 404);
                assert_eq!(body, "Not Found");
            }
            other => panic!("expected status error, got {:?}", other.map(|r| r.data)),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_invalid() {
        let (base_url, _) = spawn_helpdesk().await;
        let client = TicketingClient::new(&config(&base_url)).unwrap();

        assert!(matches!(
            client.custom_fields("garbled").await,
            Err(TicketingError::InvalidBody(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        // Port 1 on loopback refuses connections.
        let client = TicketingClient::new(&config("http://127.0.0.1:1")).unwrap();
        let result = client.custom_fields("1").await;
        assert!(matches!(result, Err(TicketingError::Transport(_))));
    }
}

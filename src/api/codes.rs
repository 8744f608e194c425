//! Ticket code endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use super::error::{ApiError, MessageResponse};
use crate::AppState;

/// Query parameters sent by the helpdesk macro.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct StringConcatQuery {
    pub ticket_num: Option<String>,
    pub representative: Option<String>,
}

impl StringConcatQuery {
    /// Pick the parameters out of the raw pairs. A repeated parameter keeps
    /// its first value; unknown parameters are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "ticketNum" => &mut query.ticket_num,
                "representative" => &mut query.representative,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Build the ticket code for `ticketNum` and `representative`.
pub async fn string_concat(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let query = StringConcatQuery::from_pairs(pairs);
    tracing::info!(
        ticket = ?query.ticket_num,
        representative = ?query.representative,
        "Ticket code requested"
    );

    let code = state
        .formatter
        .format(
            query.ticket_num.as_deref().unwrap_or_default(),
            query.representative.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(MessageResponse::new(code.into_string())))
}

/// Re-read the cached reason-code table from disk.
pub async fn reload_reason_codes(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let rows = state.formatter.reason_codes().reload().await?;
    Ok(Json(MessageResponse::new(format!(
        "Reloaded {} reason codes",
        rows
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_first_value_wins() {
        let query = StringConcatQuery::from_pairs(pairs(&[
            ("ticketNum", "1"),
            ("utm_source", "macro"),
            ("ticketNum", "2"),
            ("representative", "jdoe@x.com"),
            ("representative", "other@x.com"),
        ]));
        assert_eq!(query.ticket_num.as_deref(), Some("1"));
        assert_eq!(query.representative.as_deref(), Some("jdoe@x.com"));
    }

    #[test]
    fn test_query_missing_params() {
        assert_eq!(
            StringConcatQuery::from_pairs(Vec::new()),
            StringConcatQuery::default()
        );
    }
}

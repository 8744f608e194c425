//! Ticket code formatting.
//!
//! Turns a helpdesk ticket into the label used on replacement orders:
//!
//! ```text
//! SKU{sku}|KG{kit group}|RC{reason code}|DOC{previous doc}|REP{representative}|TIX{ticket}
//! ```
//!
//! The four values come from the ticket's custom fields. The reason is free
//! text on the ticket and is mapped to a short code through the reason-code
//! table; a reason with no matching row is used as-is.

mod lookup;
mod source;

pub use lookup::{LookupError, LookupRow, LookupTable};
pub use source::ReasonCodeSource;

use std::fmt;
use std::sync::Arc;

use crate::config::TicketingConfig;
use crate::ticketing::{CustomFieldValue, TicketingApi, TicketingError};

pub const SKU_LABEL: &str = "Replacement SKU";
pub const REASON_LABEL: &str = "Reason Codes";
pub const KIT_GROUP_LABEL: &str = "Kit Group";
pub const DOC_LABEL: &str = "Previous Doc#";

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("ticket number or representative email missing")]
    MissingInput,
    #[error("ticketing service unavailable: {0}")]
    UpstreamUnavailable(#[from] TicketingError),
    #[error("ticket is missing one or more required custom fields")]
    IncompleteTicketData,
    #[error("reason code table unavailable: {0}")]
    LookupUnavailable(#[from] LookupError),
}

impl FormatError {
    /// Message shown to whoever triggered the request.
    pub fn user_message(&self) -> &'static str {
        match self {
            FormatError::MissingInput => {
                "Please provide a ticket number and representative email."
            }
            FormatError::UpstreamUnavailable(_) => {
                "Invalid Ticket Number Provided. Please try again."
            }
            FormatError::IncompleteTicketData => {
                "There is missing info on the gorgias ticket. Please make sure the ticket has a \"Replacement SKU\", \"Reason Codes\", \"Kit Group\", and \"Previous Doc#\" field."
            }
            FormatError::LookupUnavailable(_) => {
                "Reason codes are unavailable right now. Please try again."
            }
        }
    }
}

/// The four custom fields the label is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketFields {
    pub sku: Option<String>,
    pub kit_group: Option<String>,
    pub reason_code: Option<String>,
    pub doc: Option<String>,
}

impl TicketFields {
    /// Single pass over the ticket's custom fields. Later entries with the
    /// same label overwrite earlier ones.
    pub fn extract(entries: &[CustomFieldValue]) -> Self {
        let mut fields = Self::default();
        for entry in entries {
            let Some(label) = entry.label() else {
                continue;
            };
            let slot = match label {
                SKU_LABEL => &mut fields.sku,
                REASON_LABEL => &mut fields.reason_code,
                KIT_GROUP_LABEL => &mut fields.kit_group,
                DOC_LABEL => &mut fields.doc,
                other => {
                    tracing::trace!(label = %other, "Ignoring custom field");
                    continue;
                }
            };
            let value = entry.text();
            tracing::debug!(label = %label, value = ?value, "Custom field");
            *slot = value;
        }
        fields
    }
}

/// A rendered ticket code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedCode(String);

impl FormattedCode {
    pub fn render(
        sku: &str,
        kit_group: &str,
        reason_code: &str,
        doc: &str,
        representative: &str,
        ticket_id: &str,
    ) -> Self {
        Self(format!(
            "SKU{}|KG{}|RC{}|DOC{}|REP{}|TIX{}",
            sku, kit_group, reason_code, doc, representative, ticket_id
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for FormattedCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How representative emails become the `REP` segment.
#[derive(Debug, Clone)]
pub struct RepresentativeRules {
    pub special_case_email: Option<String>,
    pub special_case_code: String,
}

impl RepresentativeRules {
    pub fn from_config(config: &TicketingConfig) -> Self {
        Self {
            special_case_email: config.special_case_email.clone(),
            special_case_code: config.special_case_code.clone(),
        }
    }

    /// The special-case address maps to its fixed code; everything else is
    /// the upper-cased local part.
    pub fn code_for(&self, email: &str) -> String {
        if self.special_case_email.as_deref() == Some(email) {
            return self.special_case_code.clone();
        }
        email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_uppercase()
    }
}

pub struct TicketCodeFormatter {
    ticketing: Arc<dyn TicketingApi>,
    reason_codes: Arc<ReasonCodeSource>,
    representatives: RepresentativeRules,
}

impl TicketCodeFormatter {
    pub fn new(
        ticketing: Arc<dyn TicketingApi>,
        reason_codes: Arc<ReasonCodeSource>,
        representatives: RepresentativeRules,
    ) -> Self {
        Self {
            ticketing,
            reason_codes,
            representatives,
        }
    }

    pub fn reason_codes(&self) -> &Arc<ReasonCodeSource> {
        &self.reason_codes
    }

    pub async fn format(
        &self,
        ticket_id: &str,
        representative_email: &str,
    ) -> Result<FormattedCode, FormatError> {
        let ticket_id = ticket_id.trim();
        let representative_email = representative_email.trim();
        if ticket_id.is_empty() || representative_email.is_empty() {
            return Err(FormatError::MissingInput);
        }

        let representative = self.representatives.code_for(representative_email);

        let response = self.ticketing.custom_fields(ticket_id).await?;
        let Some(entries) = response.data else {
            tracing::warn!(ticket_id = %ticket_id, "Ticket response has no data list");
            return Err(FormatError::IncompleteTicketData);
        };

        let fields = TicketFields::extract(&entries);

        let reason_code = match fields.reason_code {
            Some(raw) => {
                let table = self.reason_codes.current().await?;
                match table.resolve(&raw) {
                    Some(id) => Some(id.to_string()),
                    None => {
                        tracing::info!(reason = %raw, "No reason code row matched, using raw value");
                        Some(raw)
                    }
                }
            }
            None => None,
        };

        let (Some(sku), Some(kit_group), Some(reason_code), Some(doc)) =
            (fields.sku, fields.kit_group, reason_code, fields.doc)
        else {
            tracing::warn!(ticket_id = %ticket_id, "Ticket is missing required custom fields");
            return Err(FormatError::IncompleteTicketData);
        };

        let code = FormattedCode::render(
            &sku,
            &kit_group,
            &reason_code,
            &doc,
            &representative,
            ticket_id,
        );
        tracing::info!(ticket_id = %ticket_id, code = %code, "Ticket code generated");
        Ok(code)
    }
}

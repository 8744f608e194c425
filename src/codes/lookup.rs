//! Reason-code lookup table.
//!
//! The table is a CSV export of the helpdesk reason-code sheet. Only the
//! `RowReason` and `RowID` columns are read; row order is significant because
//! the first matching row wins.

use std::path::{Path, PathBuf};

const REASON_COLUMN: &str = "RowReason";
const ID_COLUMN: &str = "RowID";

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("failed to read reason codes from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse reason codes: {0}")]
    Csv(#[from] csv::Error),
    #[error("reason code table is missing the {0} column")]
    MissingColumn(&'static str),
    #[error("reason codes are read per request; there is no cached table to reload")]
    ReloadUnsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRow {
    pub reason: String,
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    rows: Vec<LookupRow>,
}

impl LookupTable {
    pub fn new(rows: Vec<LookupRow>) -> Self {
        Self { rows }
    }

    /// Convenience constructor from `(reason, id)` pairs.
    pub fn from_pairs<I, R, D>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, D)>,
        R: Into<String>,
        D: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(reason, id)| LookupRow {
                    reason: reason.into(),
                    id: id.into(),
                })
                .collect(),
        )
    }

    pub async fn load(path: &Path) -> Result<Self, LookupError> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| LookupError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let table = Self::from_csv(&text)?;
        tracing::debug!(path = %path.display(), rows = table.len(), "Loaded reason codes");
        Ok(table)
    }

    pub fn from_csv(text: &str) -> Result<Self, LookupError> {
        // Spreadsheet exports often start with a BOM
        let text = text.trim_start_matches('\u{FEFF}');

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(LookupError::MissingColumn(name))
        };
        let reason_idx = column(REASON_COLUMN)?;
        let id_idx = column(ID_COLUMN)?;

        let mut rows = Vec::new();
        for (line, result) in reader.records().enumerate() {
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!(row = line + 1, error = %e, "Skipping malformed reason code row");
                    continue;
                }
            };

            let reason = record.get(reason_idx).unwrap_or_default().trim();
            let id = record.get(id_idx).unwrap_or_default().trim();
            if reason.is_empty() || id.is_empty() {
                continue;
            }

            rows.push(LookupRow {
                reason: reason.to_string(),
                id: id.to_string(),
            });
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[LookupRow] {
        &self.rows
    }

    /// Map a free-text reason to its canonical code.
    ///
    /// A row matches when its reason contains `reason` or `reason` contains the
    /// row's reason. Rows are scanned in order and the first match wins.
    /// Returns `None` when nothing matches; callers decide whether the raw
    /// value passes through.
    pub fn resolve(&self, reason: &str) -> Option<&str> {
        if reason.is_empty() {
            return None;
        }
        self.rows
            .iter()
            .find(|row| {
                !row.reason.is_empty()
                    && (row.reason.contains(reason) || reason.contains(row.reason.as_str()))
            })
            .map(|row| row.id.as_str())
    }
}

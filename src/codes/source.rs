//! Reason-code table lifecycle: re-read per request, or cached until reloaded.

use arc_swap::ArcSwap;
use std::path::PathBuf;
use std::sync::Arc;

use super::lookup::{LookupError, LookupTable};
use crate::config::{ReasonCodesConfig, ReasonCodesMode};

/// Where the formatter gets its reason-code table from.
pub enum ReasonCodeSource {
    /// Re-read the file for every request.
    PerRequest(PathBuf),
    /// Keep one table in memory until it is explicitly reloaded.
    Cached {
        path: Option<PathBuf>,
        table: ArcSwap<LookupTable>,
    },
}

impl ReasonCodeSource {
    /// Build the source described by the config. Cached mode reads the file
    /// immediately so a broken table is caught at startup.
    pub async fn open(config: &ReasonCodesConfig) -> Result<Self, LookupError> {
        match config.mode {
            ReasonCodesMode::PerRequest => Ok(Self::PerRequest(config.path.clone())),
            ReasonCodesMode::Cached => {
                let table = LookupTable::load(&config.path).await?;
                tracing::info!(
                    path = %config.path.display(),
                    rows = table.len(),
                    "Reason codes cached"
                );
                Ok(Self::Cached {
                    path: Some(config.path.clone()),
                    table: ArcSwap::from_pointee(table),
                })
            }
        }
    }

    /// A fixed in-memory table with no backing file.
    pub fn fixed(table: LookupTable) -> Self {
        Self::Cached {
            path: None,
            table: ArcSwap::from_pointee(table),
        }
    }

    pub async fn current(&self) -> Result<Arc<LookupTable>, LookupError> {
        match self {
            Self::PerRequest(path) => LookupTable::load(path).await.map(Arc::new),
            Self::Cached { table, .. } => Ok(table.load_full()),
        }
    }

    /// Re-read the backing file into the cache and return the new row count.
    /// On failure the previous table stays in place.
    pub async fn reload(&self) -> Result<usize, LookupError> {
        match self {
            Self::PerRequest(_) => Err(LookupError::ReloadUnsupported),
            Self::Cached { path: None, table } => Ok(table.load().len()),
            Self::Cached {
                path: Some(path),
                table,
            } => {
                let fresh = LookupTable::load(path).await?;
                let rows = fresh.len();
                table.store(Arc::new(fresh));
                tracing::info!(path = %path.display(), rows, "Reason codes reloaded");
                Ok(rows)
            }
        }
    }

    #[cfg(test)]
    pub fn is_cached(&self) -> bool {
        matches!(self, Self::Cached { .. })
    }
}

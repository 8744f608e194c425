pub mod api;
pub mod cli;
pub mod codes;
pub mod config;
pub mod db;
pub mod notifications;
pub mod startup;
pub mod ticketing;

pub use db::DbPool;

use anyhow::{Context, Result};
use config::Config;
use std::sync::Arc;
use tokio_util::task::TaskTracker;

use crate::codes::{ReasonCodeSource, RepresentativeRules, TicketCodeFormatter};
use crate::notifications::TransactionMailer;
use crate::ticketing::TicketingClient;

pub struct AppState {
    pub db: DbPool,
    pub formatter: TicketCodeFormatter,
    pub mailer: TransactionMailer,
    /// Email sends still running; drained on shutdown
    pub background: TaskTracker,
}

impl AppState {
    pub fn new(db: DbPool, formatter: TicketCodeFormatter, mailer: TransactionMailer) -> Self {
        Self {
            db,
            formatter,
            mailer,
            background: TaskTracker::new(),
        }
    }

    /// Wire up the real collaborators described by the config.
    pub async fn from_config(config: Config, db: DbPool) -> Result<Self> {
        let ticketing = TicketingClient::new(&config.ticketing)?;
        let reason_codes = ReasonCodeSource::open(&config.reason_codes)
            .await
            .context("Failed to open reason code table")?;
        let formatter = TicketCodeFormatter::new(
            Arc::new(ticketing),
            Arc::new(reason_codes),
            RepresentativeRules::from_config(&config.ticketing),
        );
        let mailer = TransactionMailer::new(config.email.clone());

        Ok(Self::new(db, formatter, mailer))
    }
}

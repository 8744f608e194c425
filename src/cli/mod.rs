//! Command-line interface.
//!
//! With no subcommand the HTTP server starts. Subcommands:
//! - `check-config` - run the startup checks and print a config summary
//! - `format` - generate one ticket code and print it

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::startup::StartupCheckReport;
use crate::AppState;

#[derive(Parser, Debug)]
#[command(name = "ticket-codes")]
#[command(author, version, about = "Helpdesk ticket code and transaction webhook service", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "ticket-codes.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Start even if critical startup checks fail
    #[arg(long)]
    pub skip_checks: bool,

    #[arg(long, env = "TICKETING_BASE_URL")]
    pub ticketing_base_url: Option<String>,

    #[arg(long, env = "TICKETING_USERNAME")]
    pub ticketing_username: Option<String>,

    #[arg(long, env = "TICKETING_API_KEY", hide_env_values = true)]
    pub ticketing_api_key: Option<String>,

    /// Representative address that gets the special-case code
    #[arg(long, env = "SPECIAL_CASE_EMAIL")]
    pub special_case_email: Option<String>,

    #[arg(long, env = "REASON_CODES_PATH")]
    pub reason_codes_path: Option<PathBuf>,

    #[arg(long, env = "SMTP_USERNAME")]
    pub smtp_username: Option<String>,

    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub smtp_password: Option<String>,

    #[arg(long, env = "EMAIL_SENDER")]
    pub email_sender: Option<String>,

    #[arg(long, env = "EMAIL_RECIPIENT")]
    pub email_recipient: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and run startup checks
    CheckConfig,

    /// Generate the code for a single ticket
    Format {
        /// Ticket number
        #[arg(long)]
        ticket: String,

        /// Representative email
        #[arg(long)]
        representative: String,
    },
}

impl Cli {
    /// Flags and environment variables win over the config file.
    pub fn apply_overrides(&self, config: &mut Config) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }
        fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *target = value.clone();
            }
        }

        set(&mut config.ticketing.base_url, &self.ticketing_base_url);
        set(&mut config.ticketing.username, &self.ticketing_username);
        set(&mut config.ticketing.api_key, &self.ticketing_api_key);
        set_opt(&mut config.ticketing.special_case_email, &self.special_case_email);
        set(&mut config.reason_codes.path, &self.reason_codes_path);
        set_opt(&mut config.email.smtp_username, &self.smtp_username);
        set_opt(&mut config.email.smtp_password, &self.smtp_password);
        set_opt(&mut config.email.from_address, &self.email_sender);
        set_opt(&mut config.email.recipient, &self.email_recipient);
    }
}

/// Print the check report and a config summary with secrets masked.
pub fn print_check_report(config: &Config, report: &StartupCheckReport) {
    println!("Configuration");
    println!("  ticketing.base_url     {}", config.ticketing.base_url);
    println!("  ticketing.username     {}", config.ticketing.username);
    println!("  ticketing.api_key      {}", mask(&config.ticketing.api_key));
    println!(
        "  special_case_email     {}",
        config.ticketing.special_case_email.as_deref().unwrap_or("-")
    );
    println!("  reason_codes.path      {}", config.reason_codes.path.display());
    println!("  reason_codes.mode      {:?}", config.reason_codes.mode);
    println!(
        "  email.smtp_host        {}",
        config.email.smtp_host.as_deref().unwrap_or("-")
    );
    println!();

    for check in &report.checks {
        let status = match (check.passed, check.critical) {
            (true, _) => "ok",
            (false, true) => "FAIL",
            (false, false) => "warn",
        };
        println!("  [{:>4}] {:<14} {}", status, check.name, check.message);
    }
    println!();
    println!("{}", report.summary);
}

/// Run the formatter once and print the same message the HTTP endpoint returns.
pub async fn run_format(state: &AppState, ticket: &str, representative: &str) -> Result<()> {
    match state.formatter.format(ticket, representative).await {
        Ok(code) => println!("{}", code),
        Err(e) => {
            tracing::debug!(error = %e, "Format failed");
            println!("{}", e.user_message());
            anyhow::bail!(e);
        }
    }
    Ok(())
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        "-".to_string()
    } else if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", secret.chars().take(4).collect::<String>())
    }
}

//! Startup self-checks.
//!
//! Run before the server accepts requests and by `check-config`:
//! - ticketing credentials and base URL are present
//! - the reason-code table can be read
//! - the data directory is writable
//! - the database answers
//! - SMTP is configured (non-critical, the webhook still records rows)

use tracing::{error, info, warn};

use crate::codes::LookupTable;
use crate::config::Config;
use crate::DbPool;

/// Result of a single startup check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    /// Failure should abort startup
    pub critical: bool,
    pub message: String,
}

impl CheckResult {
    pub fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            critical: false,
            message: message.into(),
        }
    }

    pub fn fail(name: &'static str, message: impl Into<String>, critical: bool) -> Self {
        Self {
            name,
            passed: false,
            critical,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StartupCheckReport {
    pub checks: Vec<CheckResult>,
    pub all_critical_passed: bool,
    pub summary: String,
}

impl StartupCheckReport {
    pub fn new(checks: Vec<CheckResult>) -> Self {
        let all_critical_passed = checks.iter().filter(|c| c.critical).all(|c| c.passed);
        let passed = checks.iter().filter(|c| c.passed).count();
        let total = checks.len();

        let summary = if passed == total {
            format!("All {} startup checks passed", total)
        } else if all_critical_passed {
            format!("{}/{} checks passed (warnings only)", passed, total)
        } else {
            let critical = checks.iter().filter(|c| c.critical && !c.passed).count();
            format!(
                "{}/{} checks passed ({} critical failures)",
                passed, total, critical
            )
        };

        Self {
            checks,
            all_critical_passed,
            summary,
        }
    }
}

/// Run all startup checks. `db` is optional so the config can be checked
/// without opening the database.
pub async fn run_startup_checks(config: &Config, db: Option<&DbPool>) -> StartupCheckReport {
    info!("Running startup self-checks...");

    let mut checks = vec![
        check_ticketing(config),
        check_reason_codes(config).await,
        check_data_dir(config),
    ];
    if let Some(db) = db {
        checks.push(check_database(db).await);
    }
    checks.push(check_email(config));

    let report = StartupCheckReport::new(checks);

    for check in &report.checks {
        if check.passed {
            info!(check = %check.name, message = %check.message, "Startup check PASSED");
        } else if check.critical {
            error!(check = %check.name, message = %check.message, "Startup check FAILED (CRITICAL)");
        } else {
            warn!(check = %check.name, message = %check.message, "Startup check FAILED (non-critical)");
        }
    }

    info!(summary = %report.summary, "Startup checks completed");
    report
}

fn check_ticketing(config: &Config) -> CheckResult {
    let problems = config.validate();
    if problems.is_empty() {
        CheckResult::pass("ticketing", format!("Using {}", config.ticketing.base_url))
    } else {
        CheckResult::fail("ticketing", problems.join("; "), true)
    }
}

async fn check_reason_codes(config: &Config) -> CheckResult {
    let path = &config.reason_codes.path;
    match LookupTable::load(path).await {
        Ok(table) if table.is_empty() => CheckResult::fail(
            "reason_codes",
            format!("{} has no usable rows", path.display()),
            false,
        ),
        Ok(table) => CheckResult::pass(
            "reason_codes",
            format!("{} reason codes in {}", table.len(), path.display()),
        ),
        Err(e) => CheckResult::fail("reason_codes", e.to_string(), true),
    }
}

fn check_data_dir(config: &Config) -> CheckResult {
    let dir = &config.server.data_dir;
    if let Err(e) = std::fs::create_dir_all(dir) {
        return CheckResult::fail(
            "data_dir",
            format!("Cannot create {}: {}", dir.display(), e),
            true,
        );
    }

    let probe = dir.join(".write_check");
    match std::fs::write(&probe, b"ok") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            CheckResult::pass("data_dir", format!("{} is writable", dir.display()))
        }
        Err(e) => CheckResult::fail(
            "data_dir",
            format!("{} is not writable: {}", dir.display(), e),
            true,
        ),
    }
}

async fn check_database(db: &DbPool) -> CheckResult {
    match sqlx::query("SELECT COUNT(*) FROM transactions").fetch_one(db).await {
        Ok(_) => CheckResult::pass("database", "Database connection successful"),
        Err(e) => CheckResult::fail("database", format!("Database query failed: {}", e), true),
    }
}

fn check_email(config: &Config) -> CheckResult {
    if config.email.is_configured() {
        CheckResult::pass("email", "SMTP configured")
    } else {
        CheckResult::fail(
            "email",
            "SMTP host, sender or recipient missing; transaction emails are disabled",
            false,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonCodesConfig, TicketingConfig};

    fn config_in(dir: &std::path::Path) -> Config {
        let path = dir.join("reasonCodes.csv");
        std::fs::write(&path, "RowReason,RowID\nWrong item,12\n").unwrap();
        let mut config = Config {
            ticketing: TicketingConfig {
                base_url: "https://acme.gorgias.com".to_string(),
                username: "ops@acme.test".to_string(),
                api_key: "secret".to_string(),
                ..TicketingConfig::default()
            },
            reason_codes: ReasonCodesConfig {
                path,
                ..ReasonCodesConfig::default()
            },
            ..Config::default()
        };
        config.server.data_dir = dir.join("data");
        config
    }

    #[test]
    fn test_report_summary() {
        let report = StartupCheckReport::new(vec![
            CheckResult::pass("a", "ok"),
            CheckResult::fail("b", "warn", false),
        ]);
        assert!(report.all_critical_passed);
        assert_eq!(report.summary, "1/2 checks passed (warnings only)");

        let report = StartupCheckReport::new(vec![
            CheckResult::pass("a", "ok"),
            CheckResult::fail("b", "broken", true),
        ]);
        assert!(!report.all_critical_passed);
        assert_eq!(report.summary, "1/2 checks passed (1 critical failures)");
    }

    #[tokio::test]
    async fn test_checks_pass_with_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let db = crate::db::init_in_memory().await.unwrap();

        let report = run_startup_checks(&config, Some(&db)).await;
        assert!(report.all_critical_passed, "{:?}", report.checks);
        // Email is not configured in tests
        assert_eq!(report.checks.iter().filter(|c| !c.passed).count(), 1);
    }

    #[tokio::test]
    async fn test_missing_table_is_critical() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.reason_codes.path = dir.path().join("missing.csv");

        let report = run_startup_checks(&config, None).await;
        assert!(!report.all_critical_passed);
        let check = report
            .checks
            .iter()
            .find(|c| c.name == "reason_codes")
            .unwrap();
        assert!(!check.passed);
    }
}

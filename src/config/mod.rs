use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ticketing: TicketingConfig,
    #[serde(default)]
    pub reason_codes: ReasonCodesConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7071
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Credentials and tenant details for the helpdesk API.
#[derive(Debug, Clone, Deserialize)]
pub struct TicketingConfig {
    /// Base URL of the helpdesk account, e.g. `https://acme.gorgias.com`
    #[serde(default)]
    pub base_url: String,
    /// Username half of the HTTP Basic credentials
    #[serde(default)]
    pub username: String,
    /// API key half of the HTTP Basic credentials
    #[serde(default)]
    pub api_key: String,
    /// Representative address that maps to `special_case_code` instead of its local part
    pub special_case_email: Option<String>,
    #[serde(default = "default_special_case_code")]
    pub special_case_code: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            api_key: String::new(),
            special_case_email: None,
            special_case_code: default_special_case_code(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_special_case_code() -> String {
    "GRACE".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReasonCodesConfig {
    /// CSV export of the reason-code sheet (needs `RowReason` and `RowID` columns)
    #[serde(default = "default_reason_codes_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub mode: ReasonCodesMode,
}

impl Default for ReasonCodesConfig {
    fn default() -> Self {
        Self {
            path: default_reason_codes_path(),
            mode: ReasonCodesMode::default(),
        }
    }
}

fn default_reason_codes_path() -> PathBuf {
    PathBuf::from("./public/reasonCodes.csv")
}

/// When the reason-code table is read from disk.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCodesMode {
    /// Read the file on every request
    #[default]
    PerRequest,
    /// Read once at startup, refresh through the reload endpoint
    Cached,
}

/// SMTP settings for transaction emails.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Use an implicit TLS relay (default: true)
    #[serde(default = "default_smtp_tls")]
    pub smtp_tls: bool,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: Option<String>,
    pub recipient: Option<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_tls: default_smtp_tls(),
            smtp_username: None,
            smtp_password: None,
            from_address: None,
            recipient: None,
        }
    }
}

fn default_smtp_port() -> u16 {
    465
}

fn default_smtp_tls() -> bool {
    true
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        self.smtp_host.is_some() && self.from_address.is_some() && self.recipient.is_some()
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| "Failed to parse configuration file")
    }

    /// Problems that would make every ticket request fail.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.ticketing.base_url.trim().is_empty() {
            problems.push("ticketing.base_url is not set".to_string());
        } else if !self.ticketing.base_url.starts_with("http://")
            && !self.ticketing.base_url.starts_with("https://")
        {
            problems.push("ticketing.base_url must start with http:// or https://".to_string());
        }
        if self.ticketing.username.trim().is_empty() {
            problems.push("ticketing.username is not set".to_string());
        }
        if self.ticketing.api_key.trim().is_empty() {
            problems.push("ticketing.api_key is not set".to_string());
        }
        if self.ticketing.special_case_code.trim().is_empty() {
            problems.push("ticketing.special_case_code must not be empty".to_string());
        }
        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 7071);
        assert_eq!(config.ticketing.special_case_code, "GRACE");
        assert_eq!(config.reason_codes.mode, ReasonCodesMode::PerRequest);
        assert!(!config.email.is_configured());
    }

    #[test]
    fn test_parse_partial_file() {
        let config = Config::parse(
            r#"
            [ticketing]
            base_url = "https://acme.gorgias.com"
            username = "ops@acme.test"
            api_key = "secret"
            special_case_email = "gverrochi@acme.test"

            [reason_codes]
            mode = "cached"
            "#,
        )
        .unwrap();

        assert_eq!(config.ticketing.base_url, "https://acme.gorgias.com");
        assert_eq!(
            config.ticketing.special_case_email.as_deref(),
            Some("gverrochi@acme.test")
        );
        assert_eq!(config.ticketing.timeout_secs, 30);
        assert_eq!(config.reason_codes.mode, ReasonCodesMode::Cached);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validate_reports_missing_credentials() {
        let problems = Config::default().validate();
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("api_key")));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load(Path::new("/nonexistent/ticket-codes.toml")).unwrap();
        assert_eq!(config.logging.level, "info");
    }
}

//! Configuration Loader
//!
//! Loads and validates keeper configuration from TOML files matching the
//! keeper.toml structure.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::retention::{RetentionPolicy, DEFAULT_KEEP, DEFAULT_SNAPSHOT_PATTERN};

/// Main configuration structure matching keeper.toml
#[derive(Debug, Clone, Deserialize)]
pub struct KeeperConfig {
    pub telegram: TelegramSection,
    pub service: ServiceSection,
    pub storage: StorageSection,
    #[serde(default)]
    pub sweep: SweepSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub alerts: AlertsSection,
}

/// Telegram credentials for the supervised bot and for keeper alerts
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSection {
    /// Bot API token (NEVER commit a real token; prefer the env var)
    #[serde(default)]
    pub bot_token: String,
    /// Destination channel/chat identifier
    pub chat_id: String,
    /// Optional forum topic (message thread) within the chat
    #[serde(default)]
    pub thread_id: Option<i64>,
}

impl TelegramSection {
    /// Get the bot token with environment variable fallback.
    /// Checks the config value first, then TELEGRAM_BOT_TOKEN.
    pub fn get_bot_token(&self) -> Option<String> {
        if !self.bot_token.is_empty() {
            return Some(self.bot_token.clone());
        }
        std::env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|t| !t.is_empty())
    }
}

/// Supervised service configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    /// systemd unit name (without the .service suffix)
    pub unit: String,
    /// Command line the unit executes
    pub exec_start: String,
    /// Working directory for the bot process
    pub working_dir: String,
    /// User the unit runs as
    #[serde(default = "default_user")]
    pub user: String,
    /// Seconds to wait after a start request before verifying liveness
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
}

fn default_user() -> String {
    "root".to_string()
}

fn default_grace_period() -> u64 {
    5
}

/// Snapshot storage configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSection {
    /// Directory the bot writes its analysis snapshots into
    pub data_dir: String,
    /// Filename pattern identifying snapshot files
    #[serde(default = "default_snapshot_pattern")]
    pub snapshot_pattern: String,
    /// Number of most-recent snapshots to keep
    #[serde(default = "default_keep")]
    pub keep: usize,
}

fn default_snapshot_pattern() -> String {
    DEFAULT_SNAPSHOT_PATTERN.to_string()
}

fn default_keep() -> usize {
    DEFAULT_KEEP
}

impl StorageSection {
    /// Data directory with ~ expanded
    pub fn resolved_data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).to_string())
    }

    /// Retention policy described by this section
    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.snapshot_pattern.clone(), self.keep)
    }
}

/// Temp-file sweep configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SweepSection {
    /// Patterns removed unconditionally from the storage directory
    #[serde(default = "default_sweep_patterns")]
    pub patterns: Vec<String>,
}

fn default_sweep_patterns() -> Vec<String> {
    vec!["*.tmp".to_string(), "*.bak".to_string()]
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            patterns: default_sweep_patterns(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Persistent run log path (keeper actions, timestamped)
    pub run_log: String,
}

impl LoggingSection {
    /// Run log path with ~ expanded
    pub fn resolved_run_log(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.run_log).to_string())
    }
}

/// Alerts configuration section (optional)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertsSection {
    /// Send a Telegram alert when a restart fails verification
    #[serde(default)]
    pub enabled: bool,
    /// Also send a short note after a successful restart
    #[serde(default)]
    pub notify_on_success: bool,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<KeeperConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: KeeperConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl KeeperConfig {
    /// Validate all configuration parameters.
    ///
    /// Credential checks run here so a missing token or channel id fails
    /// before any service action is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.telegram.get_bot_token().is_none() {
            return Err(ConfigError::ValidationError(
                "bot_token is empty and TELEGRAM_BOT_TOKEN is not set".to_string(),
            ));
        }

        if self.telegram.chat_id.is_empty() {
            return Err(ConfigError::ValidationError(
                "chat_id cannot be empty".to_string(),
            ));
        }

        if self.service.unit.is_empty() {
            return Err(ConfigError::ValidationError(
                "unit cannot be empty".to_string(),
            ));
        }

        if self.service.exec_start.is_empty() {
            return Err(ConfigError::ValidationError(
                "exec_start cannot be empty".to_string(),
            ));
        }

        if self.service.working_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "working_dir cannot be empty".to_string(),
            ));
        }

        if self.service.grace_period_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "grace_period_secs must be > 0, got {}",
                self.service.grace_period_secs
            )));
        }

        if self.storage.data_dir.is_empty() {
            return Err(ConfigError::ValidationError(
                "data_dir cannot be empty".to_string(),
            ));
        }

        if let Err(e) = glob::Pattern::new(&self.storage.snapshot_pattern) {
            return Err(ConfigError::ValidationError(format!(
                "snapshot_pattern '{}' is not a valid glob: {}",
                self.storage.snapshot_pattern, e
            )));
        }

        for pattern in &self.sweep.patterns {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(ConfigError::ValidationError(format!(
                    "sweep pattern '{}' is not a valid glob: {}",
                    pattern, e
                )));
            }
        }

        if self.logging.run_log.is_empty() {
            return Err(ConfigError::ValidationError(
                "run_log cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[telegram]
bot_token = "123456:TEST-TOKEN"
chat_id = "-1001234567890"
thread_id = 42

[service]
unit = "solab-bot"
exec_start = "/opt/solab/venv/bin/python /opt/solab/main.py"
working_dir = "/opt/solab"
user = "solab"
grace_period_secs = 5

[storage]
data_dir = "/opt/solab/data"
snapshot_pattern = "toptraded_*"
keep = 2

[sweep]
patterns = ["*.tmp", "*.bak"]

[logging]
run_log = "/var/log/solab/keeper.log"

[alerts]
enabled = true
notify_on_success = false
"#
        .to_string()
    }

    fn load_from_str(content: &str) -> Result<KeeperConfig, ConfigError> {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        load_config(file.path())
    }

    #[test]
    fn test_load_valid_config() {
        let config = load_from_str(&create_valid_config()).unwrap();

        assert_eq!(config.service.unit, "solab-bot");
        assert_eq!(config.service.grace_period_secs, 5);
        assert_eq!(config.storage.keep, 2);
        assert_eq!(config.storage.snapshot_pattern, "toptraded_*");
        assert_eq!(config.telegram.thread_id, Some(42));
        assert!(config.alerts.enabled);
        assert!(!config.alerts.notify_on_success);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/keeper.toml");
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_defaults_applied() {
        let config = load_from_str(
            r#"
[telegram]
bot_token = "123456:TEST-TOKEN"
chat_id = "-100123"

[service]
unit = "solab-bot"
exec_start = "/opt/solab/venv/bin/python /opt/solab/main.py"
working_dir = "/opt/solab"

[storage]
data_dir = "/opt/solab/data"

[logging]
run_log = "/var/log/solab/keeper.log"
"#,
        )
        .unwrap();

        assert_eq!(config.service.user, "root");
        assert_eq!(config.service.grace_period_secs, 5);
        assert_eq!(config.storage.snapshot_pattern, "toptraded_*");
        assert_eq!(config.storage.keep, 2);
        assert_eq!(config.sweep.patterns, vec!["*.tmp", "*.bak"]);
        assert!(!config.alerts.enabled);
        assert_eq!(config.telegram.thread_id, None);
    }

    #[test]
    fn test_missing_credential_fails_validation() {
        // Relies on TELEGRAM_BOT_TOKEN being unset in the test environment
        std::env::remove_var("TELEGRAM_BOT_TOKEN");
        let result = load_from_str(
            r#"
[telegram]
chat_id = "-100123"

[service]
unit = "solab-bot"
exec_start = "/opt/solab/venv/bin/python /opt/solab/main.py"
working_dir = "/opt/solab"

[storage]
data_dir = "/opt/solab/data"

[logging]
run_log = "/var/log/solab/keeper.log"
"#,
        );

        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_zero_grace_period_fails_validation() {
        let content =
            create_valid_config().replace("grace_period_secs = 5", "grace_period_secs = 0");
        let result = load_from_str(&content);

        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_sweep_pattern_fails_validation() {
        let content = create_valid_config().replace(
            r#"patterns = ["*.tmp", "*.bak"]"#,
            r#"patterns = ["*.tmp", "broken["]"#,
        );
        let result = load_from_str(&content);

        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_retention_policy_from_storage_section() {
        let config = load_from_str(&create_valid_config()).unwrap();
        let policy = config.storage.retention_policy();

        assert_eq!(policy.pattern, "toptraded_*");
        assert_eq!(policy.keep, 2);
    }

    #[test]
    fn test_empty_chat_id_fails_validation() {
        let content =
            create_valid_config().replace(r#"chat_id = "-1001234567890""#, r#"chat_id = """#);
        let result = load_from_str(&content);

        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }
}

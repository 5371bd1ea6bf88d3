//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/daystreak/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/daystreak/` (~/.config/daystreak/)
//! - Data: `$XDG_DATA_HOME/daystreak/` (~/.local/share/daystreak/)
//! - State/Logs: `$XDG_STATE_HOME/daystreak/` (~/.local/state/daystreak/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Remote statistics tier (optional)
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Sync queue behavior
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// Remote statistics API configuration
///
/// When enabled with an API key, the session counts as authenticated and
/// statistics are fetched from and pushed to `{server_url}/api/statistics`.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Enable/disable the remote tier
    #[serde(default)]
    pub enabled: bool,

    /// Server base URL (e.g., `https://tasks.example.com`)
    pub server_url: Option<String>,

    /// Bearer token for the statistics API
    pub api_key: Option<String>,

    /// HTTP request timeout in seconds
    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,

    /// Max retry attempts for transient failures within one request
    #[serde(default = "default_remote_max_retries")]
    pub max_retries: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server_url: None,
            api_key: None,
            timeout_secs: default_remote_timeout(),
            max_retries: default_remote_max_retries(),
        }
    }
}

impl RemoteConfig {
    /// Check if the remote tier is enabled and has credentials
    pub fn is_ready(&self) -> bool {
        self.enabled && self.server_url.is_some() && self.api_key.is_some()
    }

    /// Validate configuration, returning error message if invalid
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        match self.server_url.as_deref() {
            None => {
                return Err(Error::Config(
                    "remote.server_url is required when remote is enabled".to_string(),
                ))
            }
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                return Err(Error::Config(format!(
                    "remote.server_url must be an http(s) URL, got {:?}",
                    url
                )))
            }
            Some(_) => {}
        }
        if self.api_key.is_none() {
            return Err(Error::Config(
                "remote.api_key is required when remote is enabled".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "remote.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_remote_timeout() -> u64 {
    30
}

fn default_remote_max_retries() -> usize {
    2
}

/// Sync queue configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SyncConfig {
    /// Re-enqueue the retry token when a queue drain fails.
    ///
    /// Off by default: a failed drain drops the token (at-most-once retry).
    #[serde(default)]
    pub requeue_on_drain_failure: bool,
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.remote.validate()?;
        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/daystreak/config.toml` (~/.config/daystreak/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("daystreak").join("config.toml")
    }

    /// Returns the data directory path (for the local tier database)
    ///
    /// `$XDG_DATA_HOME/daystreak/` (~/.local/share/daystreak/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("daystreak")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/daystreak/` (~/.local/state/daystreak/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("daystreak")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/daystreak/daystreak.db`
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("daystreak.db")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/daystreak/daystreak.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("daystreak.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.remote.enabled);
        assert!(!config.sync.requeue_on_drain_failure);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[logging]
level = "debug"

[sync]
requeue_on_drain_failure = true
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.max_files, 5);
        assert!(config.sync.requeue_on_drain_failure);
        assert!(!config.remote.is_ready());
    }

    #[test]
    fn test_remote_config_defaults() {
        let config = RemoteConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_retries, 2);
        assert!(!config.is_ready());
    }

    #[test]
    fn test_remote_config_validation() {
        // Disabled config is always valid
        let config = RemoteConfig::default();
        assert!(config.validate().is_ok());

        // Enabled without credentials should fail
        let config = RemoteConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        // Non-http URL should fail
        let config = RemoteConfig {
            enabled: true,
            server_url: Some("ftp://tasks.example.com".to_string()),
            api_key: Some("token".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        // Enabled with all credentials should pass
        let config = RemoteConfig {
            enabled: true,
            server_url: Some("https://tasks.example.com".to_string()),
            api_key: Some("token".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert!(config.is_ready());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[remote]
enabled = true
server_url = "https://tasks.example.com"
api_key = "token"
max_retries = 0
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert!(config.remote.is_ready());
        assert_eq!(config.remote.max_retries, 0);
    }

    #[test]
    fn test_load_from_rejects_invalid_remote() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[remote]\nenabled = true\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_paths() {
        assert!(Config::config_path().ends_with("daystreak/config.toml"));
        assert!(Config::database_path().ends_with("daystreak/daystreak.db"));
        assert!(Config::log_path().ends_with("daystreak/daystreak.log"));
    }
}

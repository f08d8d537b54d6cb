//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ApiConfig;
use crate::session::FileTokenStore;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Signup service connection
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Token file; defaults to the platform data directory
    pub token_path: Option<String>,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout(),
            token_path: None,
        }
    }
}

impl ClientConfig {
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.api_url.clone(),
            request_timeout_ms: self.request_timeout_secs * 1000,
        }
    }

    pub fn token_path(&self) -> PathBuf {
        self.token_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(FileTokenStore::default_path)
    }
}

/// Transient notification settings
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_dismiss_after")]
    pub dismiss_after_secs: u64,
}

fn default_dismiss_after() -> u64 {
    5
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            dismiss_after_secs: default_dismiss_after(),
        }
    }
}

impl NotificationConfig {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_secs(self.dismiss_after_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|error| ConfigError::Parse {
            path: path.to_path_buf(),
            error,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Candidate config file locations, most specific first
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("signup-desk").join("config.toml")),
            Some(PathBuf::from("./signup-desk.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        for path in Self::default_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SIGNUP_DESK_API_URL") {
            self.client.api_url = url;
        }
        if let Ok(path) = std::env::var("SIGNUP_DESK_TOKEN_PATH") {
            self.client.token_path = Some(path);
        }

        if let Ok(level) = std::env::var("SIGNUP_DESK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SIGNUP_DESK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# signup-desk configuration
#
# Environment variables override these settings:
# - SIGNUP_DESK_API_URL
# - SIGNUP_DESK_TOKEN_PATH
# - SIGNUP_DESK_LOG_LEVEL
# - SIGNUP_DESK_LOG_FORMAT

[client]
# Base URL of the activity signup service
api_url = "http://localhost:8000"

# Request timeout in seconds
request_timeout_secs = 30

# Where the login token is kept (default: platform data directory)
# token_path = "~/.local/share/signup-desk/token"

[notifications]
# How long a status message stays visible (seconds)
dismiss_after_secs = 5

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty or json
format = "pretty"
"#
    .to_string()
}

//! Configuration management for Shopfront.
//!
//! This module handles loading, saving, and managing Shopfront configuration.
//!
//! ## Configuration File Locations
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/shopfront/config.toml` |
//! | macOS | `~/Library/Application Support/com.shopfront.Shopfront/config.toml` |
//! | Windows | `%APPDATA%\Shopfront\Shopfront\config\config.toml` |
//!
//! ## Example
//!
//! ```rust,ignore
//! use shopfront_core::config::Config;
//!
//! let config = Config::load()?;
//! println!("API: {}", config.api.base_url);
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration struct for Shopfront.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storefront API settings
    pub api: ApiConfig,
    /// Durable session storage settings
    pub storage: StorageConfig,
    /// Output settings
    pub display: DisplayConfig,
}

/// Storefront API configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    /// Timeout applied to every HTTP request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// User-Agent header sent with requests
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: crate::DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(crate::DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: format!("shopfront/{}", crate::VERSION),
        }
    }
}

/// Durable session storage options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the session file (defaults to the data directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_file: Option<PathBuf>,
}

/// Output configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Symbol printed in front of prices
    pub currency_symbol: String,
    /// Print JSON instead of tables by default
    pub json: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// If the configuration file doesn't exist, returns the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read config: {e}")))?;

        toml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to the default location.
    ///
    /// Creates the configuration directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be written.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::ConfigError(format!("Failed to create config directory: {e}"))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| Error::ConfigError(format!("Failed to write config: {e}")))
    }

    /// Get the default configuration directory path.
    #[must_use]
    pub fn config_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the full path to the configuration file.
    #[must_use]
    pub fn config_path() -> PathBuf {
        Self::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.toml")
    }

    /// Get the path of the durable session file.
    ///
    /// Uses `storage.session_file` when set, otherwise `session.json` in the
    /// platform data directory.
    #[must_use]
    pub fn session_path(&self) -> PathBuf {
        self.storage.session_file.clone().unwrap_or_else(|| {
            project_dirs()
                .map_or_else(|| PathBuf::from("."), |dirs| dirs.data_dir().to_path_buf())
                .join("session.json")
        })
    }

    /// Read a value by its dotted key (e.g. `api.base_url`).
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "api.base_url" => Some(self.api.base_url.clone()),
            "api.timeout" => Some(format!("{}s", self.api.timeout.as_secs())),
            "api.user_agent" => Some(self.api.user_agent.clone()),
            "storage.session_file" => Some(self.session_path().display().to_string()),
            "display.currency_symbol" => Some(self.display.currency_symbol.clone()),
            "display.json" => Some(self.display.json.to_string()),
            _ => None,
        }
    }

    /// Set a value by its dotted key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for unknown keys or unparsable values.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidConfig {
            key: key.to_string(),
            reason,
        };

        match key {
            "api.base_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid("must start with http:// or https://".into()));
                }
                self.api.base_url = value.trim_end_matches('/').to_string();
            }
            "api.timeout" => {
                self.api.timeout = parse_duration(value)
                    .ok_or_else(|| invalid("expected a duration such as 30s or 2m".into()))?;
            }
            "api.user_agent" => self.api.user_agent = value.to_string(),
            "storage.session_file" => self.storage.session_file = Some(PathBuf::from(value)),
            "display.currency_symbol" => self.display.currency_symbol = value.to_string(),
            "display.json" => {
                self.display.json = value.parse().map_err(|e| invalid(format!("{e}")))?;
            }
            _ => return Err(invalid("unknown key".into())),
        }
        Ok(())
    }

    /// All keys accepted by [`Config::get`] and [`Config::set`].
    pub const KEYS: &'static [&'static str] = &[
        "api.base_url",
        "api.timeout",
        "api.user_agent",
        "storage.session_file",
        "display.currency_symbol",
        "display.json",
    ];
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "shopfront", "Shopfront")
}

/// Parse a duration string like "30s", "2m" or "1h".
pub(crate) fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(num) = s.strip_suffix('s') {
        num.parse().ok().map(Duration::from_secs)
    } else if let Some(num) = s.strip_suffix('m') {
        num.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else if let Some(num) = s.strip_suffix('h') {
        num.parse::<u64>()
            .ok()
            .and_then(|h| h.checked_mul(3600))
            .map(Duration::from_secs)
    } else {
        None
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_duration(&s).ok_or_else(|| serde::de::Error::custom("invalid duration format"))
    }
}

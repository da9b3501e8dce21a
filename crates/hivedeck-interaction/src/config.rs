//! Backend connection configuration.
//!
//! Settings come from three places, later ones winning:
//! 1. Built-in defaults
//! 2. A TOML config file (`~/.config/hivedeck/config.toml` by default)
//! 3. `HIVEDECK_*` environment variables

use hivedeck_core::error::{HivedeckError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Backend URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
const DEFAULT_DASHBOARD_DEBOUNCE_MS: u64 = 300;

/// Connection and timing settings for the task backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Poll period for a task in flight, in milliseconds.
    pub poll_interval_ms: u64,
    /// Delay before the dashboard's first refresh, in milliseconds.
    pub dashboard_debounce_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            dashboard_debounce_ms: DEFAULT_DASHBOARD_DEBOUNCE_MS,
        }
    }
}

impl BackendConfig {
    /// Loads configuration from a TOML file.
    ///
    /// An empty file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns a Config error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            HivedeckError::config(format!("Failed to read config file at {:?}: {}", path, e))
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = toml::from_str(&content).map_err(|e| {
            HivedeckError::config(format!("Failed to parse TOML from {:?}: {}", path, e))
        })?;
        Ok(config.normalized())
    }

    /// Loads configuration from the default location, then applies
    /// environment overrides.
    ///
    /// The default path is `<config dir>/hivedeck/config.toml`. A missing
    /// file or config directory is not an error; the defaults apply.
    ///
    /// # Errors
    ///
    /// Returns a Config error only when a config file exists but cannot
    /// be read or parsed.
    pub fn load_default() -> Result<Self> {
        let config = match dirs::config_dir() {
            Some(config_dir) => {
                let config_path = config_dir.join("hivedeck").join("config.toml");
                if config_path.exists() {
                    Self::load(&config_path)?
                } else {
                    Self::default()
                }
            }
            None => Self::default(),
        };
        Ok(config.apply_env())
    }

    /// Applies `HIVEDECK_*` environment overrides on top of this config.
    ///
    /// Recognized variables: `HIVEDECK_BASE_URL`, `HIVEDECK_TIMEOUT_SECS`,
    /// `HIVEDECK_POLL_INTERVAL_MS`. Unparseable numeric values are ignored.
    pub fn apply_env(mut self) -> Self {
        if let Ok(base_url) = env::var("HIVEDECK_BASE_URL") {
            self.base_url = base_url;
        }
        if let Ok(value) = env::var("HIVEDECK_TIMEOUT_SECS")
            && let Ok(secs) = value.parse()
        {
            self.timeout_secs = secs;
        }
        if let Ok(value) = env::var("HIVEDECK_POLL_INTERVAL_MS")
            && let Ok(ms) = value.parse()
        {
            self.poll_interval_ms = ms;
        }
        self.normalized()
    }

    /// Sets the backend base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.normalized()
    }

    /// Sets the poll period in milliseconds.
    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Poll period for a task in flight.
    ///
    /// Never zero; tokio rejects a zero interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Delay before the dashboard's first refresh.
    pub fn dashboard_debounce(&self) -> Duration {
        Duration::from_millis(self.dashboard_debounce_ms)
    }

    fn normalized(mut self) -> Self {
        while self.base_url.ends_with('/') {
            self.base_url.pop();
        }
        self
    }
}

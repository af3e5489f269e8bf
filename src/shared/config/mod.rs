//! Application configuration module
//!
//! Configuration is layered: built-in defaults, then an optional TOML file
//! (path in `HUBCOLLAB_CONFIG`), then environment variables. Unknown keys in
//! the file are rejected.
//!
//! | Key                  | Environment                    | Default   |
//! |----------------------|--------------------------------|-----------|
//! | `bind_address`       | `HUBCOLLAB_BIND_ADDRESS`       | `0.0.0.0` |
//! | `port`               | `HUBCOLLAB_PORT`               | `3000`    |
//! | `broadcast_capacity` | `HUBCOLLAB_BROADCAST_CAPACITY` | `1024`    |
//! | `history_retention`  | `HUBCOLLAB_HISTORY_RETENTION`  | `500`     |
//! | `database_url`       | `DATABASE_URL`                 | none      |
//! | `log_filter`         | `RUST_LOG`                     | `info`    |
//! | `idle_sweep_secs`    | `HUBCOLLAB_IDLE_SWEEP_SECS`    | `300`     |
//! | `snapshot_interval`  | `HUBCOLLAB_SNAPSHOT_INTERVAL`  | `1000`    |

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable naming the TOML configuration file
pub const CONFIG_PATH_ENV: &str = "HUBCOLLAB_CONFIG";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Port the HTTP server listens on
    pub port: u16,
    /// Buffered events per document before slow subscribers lag
    pub broadcast_capacity: usize,
    /// Most recent history entries always kept per document
    pub history_retention: usize,
    /// SQLite URL for the snapshot store; in-memory store when unset
    pub database_url: Option<String>,
    /// `tracing` filter directive
    pub log_filter: String,
    /// Interval between sweeps that close idle document sessions
    pub idle_sweep_secs: u64,
    /// Revisions between snapshot checkpoints of an open document; 0 disables
    pub snapshot_interval: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3000,
            broadcast_capacity: 1024,
            history_retention: 500,
            database_url: None,
            log_filter: "info".to_string(),
            idle_sweep_secs: 300,
            snapshot_interval: 1000,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Load defaults, the optional config file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text; missing keys keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style lookups
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HUBCOLLAB_BIND_ADDRESS") {
            self.bind_address = value;
        }
        if let Some(value) = lookup("HUBCOLLAB_PORT") {
            self.port = parse_env("HUBCOLLAB_PORT", &value)?;
        }
        if let Some(value) = lookup("HUBCOLLAB_BROADCAST_CAPACITY") {
            self.broadcast_capacity = parse_env("HUBCOLLAB_BROADCAST_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("HUBCOLLAB_HISTORY_RETENTION") {
            self.history_retention = parse_env("HUBCOLLAB_HISTORY_RETENTION", &value)?;
        }
        if let Some(value) = lookup("HUBCOLLAB_IDLE_SWEEP_SECS") {
            self.idle_sweep_secs = parse_env("HUBCOLLAB_IDLE_SWEEP_SECS", &value)?;
        }
        if let Some(value) = lookup("HUBCOLLAB_SNAPSHOT_INTERVAL") {
            self.snapshot_interval = parse_env("HUBCOLLAB_SNAPSHOT_INTERVAL", &value)?;
        }
        if let Some(value) = lookup("DATABASE_URL") {
            self.database_url = Some(value).filter(|url| !url.is_empty());
        }
        if let Some(value) = lookup("RUST_LOG") {
            self.log_filter = value;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::MissingValue("bind_address"));
        }
        if self.broadcast_capacity == 0 {
            return Err(ConfigError::invalid("broadcast_capacity", "0"));
        }
        if self.history_retention == 0 {
            return Err(ConfigError::invalid("history_retention", "0"));
        }
        if self.idle_sweep_secs == 0 {
            return Err(ConfigError::invalid("idle_sweep_secs", "0"));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Address to bind the listener to
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.bind_address, self.port);
        SocketAddr::from_str(&addr).map_err(|_| ConfigError::InvalidAddress(addr))
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    pub fn bind_address(mut self, address: impl Into<String>) -> Self {
        self.config.bind_address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.config.broadcast_capacity = capacity;
        self
    }

    pub fn history_retention(mut self, retention: usize) -> Self {
        self.config.history_retention = retention;
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    pub fn idle_sweep_secs(mut self, secs: u64) -> Self {
        self.config.idle_sweep_secs = secs;
        self
    }

    pub fn snapshot_interval(mut self, interval: u64) -> Self {
        self.config.snapshot_interval = interval;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl ConfigError {
    fn invalid(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::invalid(key, value))
}

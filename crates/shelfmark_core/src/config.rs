//! Composition-root configuration.
//!
//! # Responsibility
//! - Describe where the catalog store lives and how logging is set up.
//! - Read overrides from `SHELFMARK_*` environment variables.
//!
//! # Invariants
//! - A config that parsed successfully has a supported log level.
//! - `:memory:` as the store path selects a private in-memory store.

use crate::db::{StoreLocation, DEFAULT_BUSY_TIMEOUT};
use crate::logging::{default_log_level, normalize_level, LogConfig};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "SHELFMARK_DB_PATH";
pub const ENV_BUSY_TIMEOUT_MS: &str = "SHELFMARK_BUSY_TIMEOUT_MS";
pub const ENV_LOG_LEVEL: &str = "SHELFMARK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "SHELFMARK_LOG_DIR";

/// Store file used when no path is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "shelfmark.sqlite3";

const MEMORY_STORE_PATH: &str = ":memory:";

/// Settings for opening a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub store: StoreLocation,
    /// How long a writer waits on a locked store before failing.
    pub busy_timeout: Duration,
    /// `None` leaves logging uninitialized.
    pub log: Option<LogConfig>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store: StoreLocation::File(PathBuf::from(DEFAULT_DB_FILE_NAME)),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            log: None,
        }
    }
}

/// Invalid configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

impl CatalogConfig {
    /// In-memory store, no logging. Used by tests and smoke runs.
    pub fn in_memory() -> Self {
        Self {
            store: StoreLocation::Memory,
            ..Self::default()
        }
    }

    /// Builds a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or blank keys keep defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(path) = read(ENV_DB_PATH) {
            config.store = if path == MEMORY_STORE_PATH {
                StoreLocation::Memory
            } else {
                StoreLocation::File(PathBuf::from(path))
            };
        }

        if let Some(raw) = read(ENV_BUSY_TIMEOUT_MS) {
            let millis = raw
                .parse::<u64>()
                .map_err(|err| ConfigError::InvalidValue {
                    key: ENV_BUSY_TIMEOUT_MS,
                    value: raw.clone(),
                    reason: err.to_string(),
                })?;
            config.busy_timeout = Duration::from_millis(millis);
        }

        let level = match read(ENV_LOG_LEVEL) {
            Some(raw) => normalize_level(&raw).map_err(|err| ConfigError::InvalidValue {
                key: ENV_LOG_LEVEL,
                value: raw.clone(),
                reason: err.to_string(),
            })?,
            None => default_log_level(),
        };
        config.log = read(ENV_LOG_DIR).map(|dir| LogConfig::new(level, dir));

        Ok(config)
    }
}

//! # Controller Configuration
//!
//! Configuration for the movements controller and its SQLite provider.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKFLOW_PAGE_LIMIT=50                                            │
//! │     STOCKFLOW_SEARCH_DEBOUNCE_MS=700                                   │
//! │     STOCKFLOW_FILTER_DEBOUNCE_MS=300                                   │
//! │     STOCKFLOW_DB_PATH=/var/lib/stockflow/movements.db                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/movements/controller.toml (Linux)                        │
//! │     ~/Library/Application Support/com.stockflow.movements/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     limit 100, search 700ms, filters 300ms, database in data dir       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # controller.toml
//! [paging]
//! default_limit = 100
//!
//! [debounce]
//! search_quiet_ms = 700
//! filter_quiet_ms = 300
//!
//! [database]
//! path = "/var/lib/stockflow/movements.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use stockflow_core::validation::validate_limit;
use stockflow_core::DEFAULT_PAGE_LIMIT;
use stockflow_db::DbConfig;

use crate::error::{ControllerError, ControllerResult};

/// Quiet period of the per-resource search channels.
pub const DEFAULT_SEARCH_QUIET_MS: u64 = 700;

/// Quiet period of the shared date/category channel.
pub const DEFAULT_FILTER_QUIET_MS: u64 = 300;

const CONFIG_FILE_NAME: &str = "controller.toml";
const DATABASE_FILE_NAME: &str = "movements.db";

// =============================================================================
// Paging Settings
// =============================================================================

/// Initial pagination of both resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingSettings {
    /// Page size both resources start with.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl Default for PagingSettings {
    fn default() -> Self {
        PagingSettings {
            default_limit: default_limit(),
        }
    }
}

// =============================================================================
// Debounce Settings
// =============================================================================

/// Quiet periods of the debounce channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceSettings {
    /// Quiet period before a search edit refetches its resource (ms).
    #[serde(default = "default_search_quiet")]
    pub search_quiet_ms: u64,

    /// Quiet period before a date/category edit refetches both resources (ms).
    #[serde(default = "default_filter_quiet")]
    pub filter_quiet_ms: u64,
}

fn default_search_quiet() -> u64 {
    DEFAULT_SEARCH_QUIET_MS
}

fn default_filter_quiet() -> u64 {
    DEFAULT_FILTER_QUIET_MS
}

impl Default for DebounceSettings {
    fn default() -> Self {
        DebounceSettings {
            search_quiet_ms: default_search_quiet(),
            filter_quiet_ms: default_filter_quiet(),
        }
    }
}

// =============================================================================
// Database Settings
// =============================================================================

/// Where the SQLite provider keeps its data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Database file. Falls back to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Main Controller Configuration
// =============================================================================

/// Complete controller configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Initial pagination.
    #[serde(default)]
    pub paging: PagingSettings,

    /// Debounce quiet periods.
    #[serde(default)]
    pub debounce: DebounceSettings,

    /// SQLite provider settings.
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl ControllerConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (controller.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ControllerResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading controller config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load controller config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ControllerResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ControllerError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ControllerError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .map_err(|e| ControllerError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Controller config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ControllerResult<()> {
        validate_limit(self.paging.default_limit)
            .map_err(|e| ControllerError::InvalidConfig(e.to_string()))?;

        if self.debounce.search_quiet_ms == 0 {
            return Err(ControllerError::InvalidConfig(
                "search_quiet_ms must be greater than 0".into(),
            ));
        }

        if self.debounce.filter_quiet_ms == 0 {
            return Err(ControllerError::InvalidConfig(
                "filter_quiet_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key/value source.
    ///
    /// Unparseable numbers are ignored with a warning.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(limit) = lookup("STOCKFLOW_PAGE_LIMIT") {
            match limit.parse::<u32>() {
                Ok(l) => {
                    debug!(limit = l, "Overriding page limit from environment");
                    self.paging.default_limit = l;
                }
                Err(_) => warn!(value = %limit, "Ignoring invalid STOCKFLOW_PAGE_LIMIT"),
            }
        }

        if let Some(ms) = lookup("STOCKFLOW_SEARCH_DEBOUNCE_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.debounce.search_quiet_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid STOCKFLOW_SEARCH_DEBOUNCE_MS"),
            }
        }

        if let Some(ms) = lookup("STOCKFLOW_FILTER_DEBOUNCE_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => self.debounce.filter_quiet_ms = ms,
                Err(_) => warn!(value = %ms, "Ignoring invalid STOCKFLOW_FILTER_DEBOUNCE_MS"),
            }
        }

        if let Some(path) = lookup("STOCKFLOW_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "stockflow", "movements")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Quiet period of the search channels.
    pub fn search_quiet(&self) -> Duration {
        Duration::from_millis(self.debounce.search_quiet_ms)
    }

    /// Quiet period of the shared filter channel.
    pub fn filter_quiet(&self) -> Duration {
        Duration::from_millis(self.debounce.filter_quiet_ms)
    }

    /// Resolved database file: configured path, else the platform data dir.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database.path.clone().or_else(|| {
            Self::project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
        })
    }

    /// Database configuration for the SQLite provider.
    ///
    /// Without any usable path the provider runs in memory.
    pub fn db_config(&self) -> DbConfig {
        match self.database_path() {
            Some(path) => DbConfig::new(path),
            None => {
                warn!("No data directory available, using an in-memory database");
                DbConfig::in_memory()
            }
        }
    }
}

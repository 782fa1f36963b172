//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (REQLOG_*)
//! 2. TOML config file (if REQLOG_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::store::{PrunePolicy, PruneScope};

mod validation;

pub use validation::ConfigError;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (REQLOG_*)
/// 2. TOML config file (if REQLOG_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite history database.
    ///
    /// Set via REQLOG_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Use a transient in-memory database instead of `db_path`.
    ///
    /// Set via REQLOG_IN_MEMORY environment variable.
    #[serde(default)]
    pub in_memory: bool,

    /// Delete entries older than this many days during maintenance.
    ///
    /// Set via REQLOG_RETENTION_DAYS environment variable.
    #[serde(default)]
    pub retention_days: Option<u64>,

    /// Keep only the newest N entries during maintenance.
    ///
    /// Set via REQLOG_RETENTION_KEEP_LAST environment variable.
    #[serde(default)]
    pub retention_keep_last: Option<usize>,

    /// Garbage-collect unreferenced cached bodies during maintenance.
    ///
    /// Set via REQLOG_PRUNE_CACHE_ON_MAINTAIN environment variable.
    #[serde(default = "default_true")]
    pub prune_cache_on_maintain: bool,

    /// Page size used when a listing does not specify a limit.
    ///
    /// Set via REQLOG_DEFAULT_LIST_LIMIT environment variable.
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./reqlog-history.sqlite")
}

fn default_list_limit() -> usize {
    100
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            in_memory: false,
            retention_days: None,
            retention_keep_last: None,
            prune_cache_on_maintain: true,
            default_list_limit: default_list_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `REQLOG_`
    /// 2. TOML file from `REQLOG_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("REQLOG_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("REQLOG_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// The retention policy applied by maintenance, if any.
    ///
    /// Age-based retention takes precedence over count-based retention, matching
    /// [`crate::PruneOptions::policy`].
    pub fn retention_policy(&self) -> Option<PrunePolicy> {
        if let Some(days) = self.retention_days.filter(|d| *d > 0) {
            return Some(PrunePolicy::ByAge {
                older_than: Duration::from_secs(days.saturating_mul(SECONDS_PER_DAY)),
                scope: PruneScope::default(),
            });
        }
        self.retention_keep_last
            .filter(|n| *n > 0)
            .map(|keep_last| PrunePolicy::ByCount { keep_last, scope: PruneScope::default() })
    }
}

//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Longest accepted retention window, in days.
const MAX_RETENTION_DAYS: u64 = 36_500;

/// Largest accepted default page size.
const MAX_LIST_LIMIT: usize = 10_000;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if `db_path` is empty for a durable store.
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `retention_days` is 0 or exceeds 100 years
    /// - `retention_keep_last` is 0
    /// - `default_list_limit` is 0 or exceeds 10000
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.in_memory && self.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Missing {
                field: "db_path".into(),
                hint: "Set REQLOG_DB_PATH or REQLOG_IN_MEMORY=true".into(),
            });
        }

        if let Some(days) = self.retention_days {
            if days == 0 {
                return Err(ConfigError::Invalid {
                    field: "retention_days".into(),
                    reason: "must be greater than 0".into(),
                });
            }
            if days > MAX_RETENTION_DAYS {
                return Err(ConfigError::Invalid {
                    field: "retention_days".into(),
                    reason: format!("must not exceed {MAX_RETENTION_DAYS} days"),
                });
            }
        }

        if self.retention_keep_last == Some(0) {
            return Err(ConfigError::Invalid {
                field: "retention_keep_last".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.default_list_limit == 0 || self.default_list_limit > MAX_LIST_LIMIT {
            return Err(ConfigError::Invalid {
                field: "default_list_limit".into(),
                reason: format!("must be between 1 and {MAX_LIST_LIMIT}"),
            });
        }

        if self.retention_days.is_some() && self.retention_keep_last.is_some() {
            tracing::warn!(
                retention_days = self.retention_days,
                retention_keep_last = self.retention_keep_last,
                "Both retention_days and retention_keep_last are set; \
                 retention_days takes precedence"
            );
        }

        if self.in_memory && self.db_path != super::default_db_path() {
            tracing::warn!(db_path = %self.db_path.display(), "in_memory is set; db_path is ignored");
        }

        Ok(())
    }
}

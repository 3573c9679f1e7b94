//! Action log configuration.
//!
//! Table names and policy defaults are explicit configuration rather than
//! hidden globals. Configuration can be built in code or read from TOML:
//!
//! ```toml
//! table = "action_log"
//! tombstone_table = "action_log_cleaned"
//! default_window_secs = 85000
//!
//! [sweep]
//! max_age_hours = 720
//! max_delete = 100
//! tombstones = true
//! ```

use crate::domain::policy::{
    check_table_name, RequestWindow, SweepPolicy, ValidationError, DEFAULT_MAX_AGE, DEFAULT_MAX_DELETE,
    DEFAULT_WINDOW,
};
use serde::Deserialize;

pub const DEFAULT_TABLE: &str = "action_log";
pub const DEFAULT_TOMBSTONE_TABLE: &str = "action_log_cleaned";

/// Sweep section of [`ActionLogConfig`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    pub max_age_hours: f64,
    pub max_delete: usize,
    pub tombstones: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_age_hours: DEFAULT_MAX_AGE.as_secs_f64() / 3600.0,
            max_delete: DEFAULT_MAX_DELETE,
            tombstones: false,
        }
    }
}

/// Configuration of an [`ActionLog`](crate::ActionLog).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionLogConfig {
    /// Table holding action records
    pub table: String,
    /// Table receiving tombstones when sweeps write them
    pub tombstone_table: String,
    /// Window used by `is_limit_exceeded` when none is given
    pub default_window_secs: f64,
    pub sweep: SweepConfig,
}

impl Default for ActionLogConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            tombstone_table: DEFAULT_TOMBSTONE_TABLE.to_string(),
            default_window_secs: DEFAULT_WINDOW.as_secs_f64(),
            sweep: SweepConfig::default(),
        }
    }
}

impl ActionLogConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    ///
    /// # Errors
    /// Returns [`ValidationError::Config`] for malformed TOML or unknown keys,
    /// or the validation error of the first invalid value.
    pub fn from_toml_str(text: &str) -> Result<Self, ValidationError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ValidationError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_table_name("action", &self.table)?;
        check_table_name("tombstone", &self.tombstone_table)?;
        if self.tombstone_table == self.table {
            return Err(ValidationError::TombstoneTableCollision(self.table.clone()));
        }
        self.window()?;
        self.sweep_policy()?;
        Ok(())
    }

    /// The default rate-limit window.
    pub fn window(&self) -> Result<RequestWindow, ValidationError> {
        RequestWindow::from_secs_f64(self.default_window_secs)
    }

    /// The default sweep policy.
    pub fn sweep_policy(&self) -> Result<SweepPolicy, ValidationError> {
        Ok(
            SweepPolicy::from_hours(self.sweep.max_age_hours, self.sweep.max_delete)?
                .with_tombstones(self.sweep.tombstones),
        )
    }
}

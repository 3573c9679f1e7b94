//! Rate-limit and retention policies.
//!
//! - [`RequestWindow`]: the rolling window inside which a repeat of the same
//!   action counts as "limit exceeded".
//! - [`SweepPolicy`]: how old a record must be before a sweep removes it, how
//!   many records one sweep may delete, and whether tombstones are written.

use crate::domain::record::Timestamp;
use std::time::Duration;
use thiserror::Error;

/// Default rate-limit window: one request per distinct action per ~23.6 hours.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(85_000);

/// Default cap on deletions per sweep.
pub const DEFAULT_MAX_DELETE: usize = 100;

/// Default retention before records become eligible for a sweep (30 days).
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(30 * 24 * 3600);

/// Characters a table name must not contain. Store adapters join table and
/// partition with `:` and select a table's keys with glob patterns.
pub const RESERVED_TABLE_CHARS: [char; 6] = [':', '*', '?', '[', ']', '\\'];

/// Check a table name.
///
/// # Errors
/// Returns [`ValidationError::EmptyTable`] for an empty name and
/// [`ValidationError::InvalidTableName`] for a name with a reserved character.
pub fn check_table_name(kind: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyTable(kind));
    }
    if name.contains(RESERVED_TABLE_CHARS) {
        return Err(ValidationError::InvalidTableName(name.to_string()));
    }
    Ok(())
}

/// Error returned when parameters are rejected before any store call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Table names must not be empty
    #[error("{0} table name must not be empty")]
    EmptyTable(&'static str),
    /// Window must be a finite, non-negative number of seconds
    #[error("window must be finite and non-negative, got {0}")]
    InvalidWindow(f64),
    /// Age must be a finite, non-negative number of hours
    #[error("max age must be finite and non-negative, got {0} hours")]
    InvalidAge(f64),
    /// Page size must be greater than zero
    #[error("page size must be greater than 0")]
    ZeroPageSize,
    /// Table names must not contain key separators or glob metacharacters
    #[error("table name `{0}` must not contain `:`, `*`, `?`, `[`, `]` or `\\`")]
    InvalidTableName(String),
    /// Tombstones must not land in the table being swept
    #[error("tombstone table must differ from the action table `{0}`")]
    TombstoneTableCollision(String),
    /// Configuration text could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Rolling window used by the rate-limit query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestWindow {
    length: Duration,
}

impl RequestWindow {
    /// Create a window of the given length.
    pub fn new(length: Duration) -> Self {
        Self { length }
    }

    /// Create a window from a number of seconds.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidWindow`] for negative, non-finite or
    /// out-of-range input.
    pub fn from_secs_f64(secs: f64) -> Result<Self, ValidationError> {
        Duration::try_from_secs_f64(secs)
            .map(Self::new)
            .map_err(|_| ValidationError::InvalidWindow(secs))
    }

    /// Length of the window.
    pub fn length(&self) -> Duration {
        self.length
    }

    /// Oldest action time (exclusive) that still falls inside the window.
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        now - self.length
    }
}

impl Default for RequestWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

/// Retention policy applied by one sweep.
///
/// # Example
/// ```
/// use skoocheh::SweepPolicy;
///
/// let policy = SweepPolicy::from_hours(48.0, 100).unwrap().with_tombstones(true);
/// assert_eq!(policy.max_delete(), 100);
/// assert!(policy.tombstones());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPolicy {
    max_age: Duration,
    max_delete: usize,
    tombstones: bool,
}

impl SweepPolicy {
    /// Create a policy removing records older than `max_age`, at most
    /// `max_delete` of them per sweep, without tombstones.
    pub fn new(max_age: Duration, max_delete: usize) -> Self {
        Self {
            max_age,
            max_delete,
            tombstones: false,
        }
    }

    /// Create a policy from an age in (possibly fractional) hours.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidAge`] for negative or non-finite hours.
    pub fn from_hours(hours: f64, max_delete: usize) -> Result<Self, ValidationError> {
        Duration::try_from_secs_f64(hours * 3600.0)
            .map(|max_age| Self::new(max_age, max_delete))
            .map_err(|_| ValidationError::InvalidAge(hours))
    }

    /// Enable or disable tombstone entries for each deletion.
    pub fn with_tombstones(mut self, enabled: bool) -> Self {
        self.tombstones = enabled;
        self
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn max_delete(&self) -> usize {
        self.max_delete
    }

    pub fn tombstones(&self) -> bool {
        self.tombstones
    }

    /// Records with `action_time` strictly before this are eligible.
    pub fn cutoff(&self, now: Timestamp) -> Timestamp {
        now - self.max_age
    }
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE, DEFAULT_MAX_DELETE)
    }
}

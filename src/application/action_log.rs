//! The action log: request rate limiting and audit records.
//!
//! Every successful user action is written as one [`ActionRecord`]. Two
//! questions are answered from those records:
//! - has this user performed this action inside the rate-limit window?
//! - has this user ever requested anything?
//!
//! Old records are removed by bounded sweeps. A sweep deletes at most
//! `max_delete` records and stops even mid-page; the caller runs it again to
//! continue. When tombstones are enabled each deletion is preceded by a
//! tombstone written to the tombstone table under [`Actor::Cleared`].

use crate::application::config::ActionLogConfig;
use crate::application::metrics::Metrics;
use crate::application::ports::{
    ActionStore, Clock, ContinuationToken, Filter, KeyRange, Predicate, QueryRequest, StoreError,
};
use crate::domain::policy::{RequestWindow, SweepPolicy, ValidationError};
use crate::domain::record::{ActionRecord, Actor, Timestamp};
use crate::infrastructure::clock::SystemClock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A record removed by a sweep that wrote tombstones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearedItem {
    pub action_name: String,
    pub action_time: Timestamp,
    pub source: String,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Records deleted by this sweep (exact).
    pub deleted: usize,
    /// Candidates on the page where the sweep stopped at its cap, 0 when it
    /// ran to completion. Diagnostic only: it says nothing about other pages.
    pub remaining_in_page: usize,
    /// True if the sweep stopped at its cap with candidates left.
    pub more_remaining: bool,
    /// Deleted records, collected only when tombstones are written.
    pub cleared: Vec<ClearedItem>,
}

impl SweepReport {
    /// `(deleted, remaining_in_page)`.
    pub fn as_tuple(&self) -> (usize, usize) {
        (self.deleted, self.remaining_in_page)
    }
}

/// Action log bound to one store, clock and configuration.
///
/// # Example
/// ```
/// use skoocheh::{ActionLog, MemoryStore};
///
/// let log = ActionLog::builder().build(MemoryStore::new()).unwrap();
///
/// assert!(!log.is_limit_exceeded("alice", "app.apk").unwrap());
/// log.log_action("alice", "app.apk", "bot").unwrap();
/// assert!(log.is_limit_exceeded("alice", "app.apk").unwrap());
/// assert!(log.user_has_requested_before("alice").unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct ActionLog<S: ActionStore> {
    store: S,
    clock: Arc<dyn Clock>,
    table: String,
    tombstone_table: String,
    window: RequestWindow,
    sweep_policy: SweepPolicy,
    metrics: Metrics,
}

impl<S: ActionStore> ActionLog<S> {
    /// Create an action log from a validated configuration.
    ///
    /// # Errors
    /// Returns the first [`ValidationError`] found in `config`.
    pub fn new(
        store: S,
        clock: Arc<dyn Clock>,
        config: ActionLogConfig,
    ) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            window: config.window()?,
            sweep_policy: config.sweep_policy()?,
            store,
            clock,
            table: config.table,
            tombstone_table: config.tombstone_table,
            metrics: Metrics::new(),
        })
    }

    /// Write one record for `user_id`, timestamped now.
    pub fn log_action(
        &self,
        user_id: &str,
        action_name: &str,
        source: &str,
    ) -> Result<(), StoreError> {
        self.log_action_at(user_id, action_name, source, self.clock.now())
    }

    /// Write one record for `user_id` with an explicit timestamp.
    pub fn log_action_at(
        &self,
        user_id: &str,
        action_name: &str,
        source: &str,
        timestamp: Timestamp,
    ) -> Result<(), StoreError> {
        self.log_action_to(&self.table, user_id, action_name, source, timestamp)
    }

    /// Write one record into `table` instead of the configured table.
    pub fn log_action_to(
        &self,
        table: &str,
        user_id: &str,
        action_name: &str,
        source: &str,
        timestamp: Timestamp,
    ) -> Result<(), StoreError> {
        let record = ActionRecord::for_user(user_id, action_name, source, timestamp);
        self.store.put(table, &record)?;
        self.metrics.record_action_logged();
        debug!(
            table,
            actor = %record.actor,
            action = action_name,
            source,
            "action logged"
        );
        Ok(())
    }

    /// Check `action_name` against the configured default window.
    pub fn is_limit_exceeded(&self, user_id: &str, action_name: &str) -> Result<bool, StoreError> {
        self.is_limit_exceeded_within(user_id, action_name, self.window.length())
    }

    /// True iff `user_id` performed `action_name` within the last `window`.
    ///
    /// A recorded action counts while `action_time > now - window`.
    pub fn is_limit_exceeded_within(
        &self,
        user_id: &str,
        action_name: &str,
        window: Duration,
    ) -> Result<bool, StoreError> {
        self.is_limit_exceeded_in(&self.table, user_id, action_name, window)
    }

    /// Same as [`is_limit_exceeded_within`](Self::is_limit_exceeded_within)
    /// against another table.
    pub fn is_limit_exceeded_in(
        &self,
        table: &str,
        user_id: &str,
        action_name: &str,
        window: Duration,
    ) -> Result<bool, StoreError> {
        let actor = Actor::user(user_id);
        let cutoff = RequestWindow::new(window).cutoff(self.clock.now());
        let request = QueryRequest::partition(actor)
            .with_range(KeyRange::After(cutoff))
            .with_filter(Filter::all().and(Predicate::ActionNameIs(action_name.to_string())))
            .with_limit(1);

        let exceeded = !self.store.query(table, &request)?.is_empty();
        self.metrics.record_limit_check(exceeded);
        debug!(
            table,
            actor = %request.actor,
            action = action_name,
            window_secs = window.as_secs_f64(),
            exceeded,
            "rate limit checked"
        );
        Ok(exceeded)
    }

    /// True iff any record exists for `user_id`, of any action and age.
    pub fn user_has_requested_before(&self, user_id: &str) -> Result<bool, StoreError> {
        let request = QueryRequest::partition(Actor::user(user_id)).with_limit(1);
        let found = !self.store.query(&self.table, &request)?.is_empty();
        debug!(table = %self.table, actor = %request.actor, found, "request history checked");
        Ok(found)
    }

    /// Delete records older than `max_age`, at most `max_delete` of them.
    ///
    /// Tombstones follow the configured sweep policy.
    pub fn clean_action_log(
        &self,
        max_age: Duration,
        max_delete: usize,
    ) -> Result<SweepReport, StoreError> {
        let policy =
            SweepPolicy::new(max_age, max_delete).with_tombstones(self.sweep_policy.tombstones());
        self.sweep_with(policy)
    }

    /// Run one sweep with the configured policy.
    pub fn sweep(&self) -> Result<SweepReport, StoreError> {
        self.sweep_with(self.sweep_policy)
    }

    /// Run one sweep with an explicit policy.
    ///
    /// # Errors
    /// A store failure aborts the sweep. Deletions made before the failure
    /// are not rolled back.
    pub fn sweep_with(&self, policy: SweepPolicy) -> Result<SweepReport, StoreError> {
        let cutoff = policy.cutoff(self.clock.now());
        let filter = Filter::all().and(Predicate::TimeBefore(cutoff));
        let mut report = SweepReport::default();
        let mut start: Option<ContinuationToken> = None;

        loop {
            let page = self
                .store
                .scan(&self.table, &filter, start.as_ref())
                .map_err(|e| self.abort_sweep(e, &report))?;
            let candidates = page.records.len();

            for record in page.records {
                if report.deleted == policy.max_delete() {
                    report.remaining_in_page = candidates;
                    report.more_remaining = true;
                    self.metrics.record_sweep_capped();
                    info!(
                        table = %self.table,
                        deleted = report.deleted,
                        remaining_in_page = candidates,
                        more_remaining = true,
                        "sweep stopped at delete cap"
                    );
                    return Ok(report);
                }
                self.clear_record(record, policy.tombstones(), &mut report)
                    .map_err(|e| self.abort_sweep(e, &report))?;
            }

            match page.next {
                Some(next) => start = Some(next),
                None => break,
            }
        }

        info!(
            table = %self.table,
            deleted = report.deleted,
            more_remaining = false,
            "sweep complete"
        );
        Ok(report)
    }

    fn clear_record(
        &self,
        record: ActionRecord,
        tombstones: bool,
        report: &mut SweepReport,
    ) -> Result<(), StoreError> {
        if tombstones {
            self.store.put(&self.tombstone_table, &record.tombstone())?;
            self.metrics.record_tombstone();
        }

        self.store.delete(&self.table, &record.key())?;
        self.metrics.record_swept();
        report.deleted += 1;

        if tombstones {
            report.cleared.push(ClearedItem {
                action_name: record.action_name,
                action_time: record.action_time,
                source: record.source,
            });
        }
        Ok(())
    }

    fn abort_sweep(&self, error: StoreError, report: &SweepReport) -> StoreError {
        warn!(
            table = %self.table,
            deleted = report.deleted,
            error = %error,
            "sweep aborted"
        );
        error
    }

    /// Metrics for this action log. Clones share counters.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Table holding action records.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table receiving tombstones.
    pub fn tombstone_table(&self) -> &str {
        &self.tombstone_table
    }

    /// Default rate-limit window.
    pub fn window(&self) -> RequestWindow {
        self.window
    }

    /// Policy used by [`sweep`](Self::sweep).
    pub fn sweep_policy(&self) -> SweepPolicy {
        self.sweep_policy
    }
}

impl ActionLog<crate::infrastructure::storage::MemoryStore> {
    /// Start building an action log.
    pub fn builder() -> ActionLogBuilder {
        ActionLogBuilder::new()
    }
}

/// Builder for constructing an [`ActionLog`].
#[derive(Debug, Default)]
pub struct ActionLogBuilder {
    config: ActionLogConfig,
    clock: Option<Arc<dyn Clock>>,
    window: Option<RequestWindow>,
    sweep_policy: Option<SweepPolicy>,
}

impl ActionLogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration.
    pub fn with_config(mut self, config: ActionLogConfig) -> Self {
        self.config = config;
        self
    }

    /// Table holding action records (default `action_log`).
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.config.table = table.into();
        self
    }

    /// Table receiving tombstones (default `action_log_cleaned`).
    pub fn with_tombstone_table(mut self, table: impl Into<String>) -> Self {
        self.config.tombstone_table = table.into();
        self
    }

    /// Default rate-limit window (default 85 000 seconds).
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = Some(RequestWindow::new(window));
        self
    }

    /// Policy used by [`ActionLog::sweep`] and the tombstone flag of
    /// [`ActionLog::clean_action_log`].
    pub fn with_sweep_policy(mut self, policy: SweepPolicy) -> Self {
        self.sweep_policy = Some(policy);
        self
    }

    /// Clock to use (default [`SystemClock`]).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the action log over `store`.
    ///
    /// # Errors
    /// Returns `ValidationError` if the configuration is invalid.
    pub fn build<S: ActionStore>(self, store: S) -> Result<ActionLog<S>, ValidationError> {
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let mut log = ActionLog::new(store, clock, self.config)?;
        if let Some(window) = self.window {
            log.window = window;
        }
        if let Some(policy) = self.sweep_policy {
            log.sweep_policy = policy;
        }
        Ok(log)
    }
}

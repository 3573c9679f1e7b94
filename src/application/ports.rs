//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::domain::record::{ActionRecord, Actor, RecordKey, Timestamp};
use std::error::Error as StdError;
use std::fmt::{self, Debug};
use std::sync::Arc;
use thiserror::Error;

/// Port for obtaining the current wall-clock time.
///
/// Infrastructure provides concrete implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current time.
    fn now(&self) -> Timestamp;
}

/// Store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Put,
    Query,
    Scan,
    Delete,
}

impl fmt::Display for StoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StoreOp::Put => "put",
            StoreOp::Query => "query",
            StoreOp::Scan => "scan",
            StoreOp::Delete => "delete",
        })
    }
}

/// Failure of any store interaction.
///
/// There is no distinction between transient and permanent failures and
/// nothing in this crate retries; that is the caller's decision.
#[derive(Debug, Error)]
#[error("{op} on table `{table}` failed: {source}")]
pub struct StoreError {
    op: StoreOp,
    table: String,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl StoreError {
    /// Wrap an underlying client error.
    pub fn new(
        op: StoreOp,
        table: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            op,
            table: table.into(),
            source: source.into(),
        }
    }

    pub fn op(&self) -> StoreOp {
        self.op
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

/// Predicate on a single record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `action_time > t`
    TimeAfter(Timestamp),
    /// `action_time < t`
    TimeBefore(Timestamp),
    /// `action_name == s`
    ActionNameIs(String),
    /// `source == s`
    SourceIs(String),
}

impl Predicate {
    pub fn matches(&self, record: &ActionRecord) -> bool {
        match self {
            Predicate::TimeAfter(t) => record.action_time > *t,
            Predicate::TimeBefore(t) => record.action_time < *t,
            Predicate::ActionNameIs(name) => record.action_name == *name,
            Predicate::SourceIs(source) => record.source == *source,
        }
    }
}

/// Conjunction of predicates. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Vec<Predicate>);

impl Filter {
    pub fn all() -> Self {
        Self(Vec::new())
    }

    /// Add a predicate that must also hold.
    pub fn and(mut self, predicate: Predicate) -> Self {
        self.0.push(predicate);
        self
    }

    pub fn matches(&self, record: &ActionRecord) -> bool {
        self.0.iter().all(|p| p.matches(record))
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.0
    }

    /// Tightest `(after, before)` time bounds implied by the predicates.
    ///
    /// Adapters with an ordered index use this to narrow the range they read.
    pub fn time_bounds(&self) -> (Option<Timestamp>, Option<Timestamp>) {
        self.0
            .iter()
            .fold((None, None), |(after, before), p| match p {
                Predicate::TimeAfter(t) => (Some(after.map_or(*t, |a: Timestamp| a.max(*t))), before),
                Predicate::TimeBefore(t) => (after, Some(before.map_or(*t, |b: Timestamp| b.min(*t)))),
                _ => (after, before),
            })
    }
}

/// Range condition on the sort key (`action_time`) within one partition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum KeyRange {
    #[default]
    All,
    After(Timestamp),
    Before(Timestamp),
}

impl KeyRange {
    pub fn contains(&self, t: Timestamp) -> bool {
        match self {
            KeyRange::All => true,
            KeyRange::After(cutoff) => t > *cutoff,
            KeyRange::Before(cutoff) => t < *cutoff,
        }
    }
}

/// Query over a single actor's partition.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub actor: Actor,
    pub range: KeyRange,
    pub filter: Filter,
    /// Maximum number of matching records to return.
    pub limit: Option<usize>,
}

impl QueryRequest {
    /// Query every record of `actor`.
    pub fn partition(actor: Actor) -> Self {
        Self {
            actor,
            range: KeyRange::All,
            filter: Filter::all(),
            limit: None,
        }
    }

    pub fn with_range(mut self, range: KeyRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check if a record of this partition satisfies range and filter.
    pub fn matches(&self, record: &ActionRecord) -> bool {
        record.actor == self.actor
            && self.range.contains(record.action_time)
            && self.filter.matches(record)
    }
}

/// Where the next scan page starts. Opaque to the application layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationToken {
    /// Resume after this key (ordered in-process stores).
    After(RecordKey),
    /// Resume from a server-side cursor (Redis `SCAN`).
    Cursor(u64),
}

/// One page of a scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    /// Records on this page that matched the filter.
    pub records: Vec<ActionRecord>,
    /// Token for the next page, `None` when the scan is complete.
    pub next: Option<ContinuationToken>,
}

/// Port for the durable key-value store holding action records.
///
/// Tables are addressed by name. Records are keyed by [`RecordKey`];
/// a `put` with an existing key overwrites.
pub trait ActionStore: Send + Sync + Debug {
    /// Insert a record.
    fn put(&self, table: &str, record: &ActionRecord) -> Result<(), StoreError>;

    /// Read records of one actor.
    fn query(&self, table: &str, request: &QueryRequest) -> Result<Vec<ActionRecord>, StoreError>;

    /// Read one page of records across all actors.
    ///
    /// Pages may be empty while `next` is still `Some`.
    fn scan(
        &self,
        table: &str,
        filter: &Filter,
        start: Option<&ContinuationToken>,
    ) -> Result<ScanPage, StoreError>;

    /// Delete a record. Deleting a missing key is not an error.
    fn delete(&self, table: &str, key: &RecordKey) -> Result<(), StoreError>;
}

impl<T: ActionStore + ?Sized> ActionStore for Arc<T> {
    fn put(&self, table: &str, record: &ActionRecord) -> Result<(), StoreError> {
        (**self).put(table, record)
    }

    fn query(&self, table: &str, request: &QueryRequest) -> Result<Vec<ActionRecord>, StoreError> {
        (**self).query(table, request)
    }

    fn scan(
        &self,
        table: &str,
        filter: &Filter,
        start: Option<&ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        (**self).scan(table, filter, start)
    }

    fn delete(&self, table: &str, key: &RecordKey) -> Result<(), StoreError> {
        (**self).delete(table, key)
    }
}

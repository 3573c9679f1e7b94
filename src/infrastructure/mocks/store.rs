//! Store wrapper that injects failures.

use crate::application::ports::{
    ActionStore, ContinuationToken, Filter, QueryRequest, ScanPage, StoreError, StoreOp,
};
use crate::domain::record::{ActionRecord, RecordKey};
use crate::infrastructure::storage::MemoryStore;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps a [`MemoryStore`] and fails one kind of operation on demand.
///
/// Operations of the armed kind succeed `allow` more times, then every
/// further call fails. Other operations always reach the inner store.
///
/// ```
/// use skoocheh::application::ports::{ActionStore, StoreOp};
/// use skoocheh::infrastructure::mocks::FailingStore;
/// use skoocheh::{ActionRecord, Timestamp};
///
/// let store = FailingStore::new().fail_after(StoreOp::Put, 1);
/// let record = ActionRecord::for_user("alice", "a", "bot", Timestamp::EPOCH);
///
/// assert!(store.put("action_log", &record).is_ok());
/// assert!(store.put("action_log", &record).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    armed: Option<StoreOp>,
    allow: Arc<AtomicUsize>,
}

impl FailingStore {
    /// Wrap a fresh in-memory store with no failure armed.
    pub fn new() -> Self {
        Self::wrap(Arc::new(MemoryStore::new()))
    }

    /// Wrap an existing store, for example one with a small page size.
    pub fn wrap(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            armed: None,
            allow: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail every `op` call after the first `allow` calls succeed.
    pub fn fail_after(mut self, op: StoreOp, allow: usize) -> Self {
        self.armed = Some(op);
        self.allow = Arc::new(AtomicUsize::new(allow));
        self
    }

    /// Fail every `op` call.
    pub fn fail_on(self, op: StoreOp) -> Self {
        self.fail_after(op, 0)
    }

    /// The wrapped store, for inspecting what was committed.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self, op: StoreOp, table: &str) -> Result<(), StoreError> {
        if self.armed != Some(op) {
            return Ok(());
        }
        let spent = self
            .allow
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        match spent {
            Ok(_) => Ok(()),
            Err(_) => Err(StoreError::new(op, table, "injected failure")),
        }
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionStore for FailingStore {
    fn put(&self, table: &str, record: &ActionRecord) -> Result<(), StoreError> {
        self.check(StoreOp::Put, table)?;
        self.inner.put(table, record)
    }

    fn query(&self, table: &str, request: &QueryRequest) -> Result<Vec<ActionRecord>, StoreError> {
        self.check(StoreOp::Query, table)?;
        self.inner.query(table, request)
    }

    fn scan(
        &self,
        table: &str,
        filter: &Filter,
        start: Option<&ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        self.check(StoreOp::Scan, table)?;
        self.inner.scan(table, filter, start)
    }

    fn delete(&self, table: &str, key: &RecordKey) -> Result<(), StoreError> {
        self.check(StoreOp::Delete, table)?;
        self.inner.delete(table, key)
    }
}

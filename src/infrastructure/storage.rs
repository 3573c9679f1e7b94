//! In-process action store.
//!
//! Tables live in a sharded `DashMap`; each table is an ordered map keyed by
//! [`RecordKey`], so partitions are contiguous ranges and scans resume after
//! the last evaluated key, the way a paginated key-value service behaves.

use crate::application::ports::{
    ActionStore, ContinuationToken, Filter, KeyRange, QueryRequest, ScanPage, StoreError, StoreOp,
};
use crate::domain::policy::ValidationError;
use crate::domain::record::{ActionRecord, Actor, RecordKey, Timestamp};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Default number of entries evaluated per scan page.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

type Table = BTreeMap<RecordKey, ActionRecord>;

/// Thread-safe in-memory store backed by DashMap.
///
/// A scan page evaluates at most `page_size` stored entries before applying
/// the filter, so a page may hold fewer matches than `page_size`, or none.
#[derive(Debug)]
pub struct MemoryStore {
    tables: DashMap<String, Table>,
    page_size: usize,
}

impl MemoryStore {
    /// Create an empty store with the default page size.
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Create an empty store evaluating `page_size` entries per scan page.
    ///
    /// # Errors
    /// Returns [`ValidationError::ZeroPageSize`] if `page_size` is zero.
    pub fn with_page_size(page_size: usize) -> Result<Self, ValidationError> {
        if page_size == 0 {
            return Err(ValidationError::ZeroPageSize);
        }
        Ok(Self {
            tables: DashMap::new(),
            page_size,
        })
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of records in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables.get(table).map_or(0, |t| t.len())
    }

    /// Check if `table` holds no records.
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Copy of every record in `table`, in key order.
    pub fn records(&self, table: &str) -> Vec<ActionRecord> {
        self.tables
            .get(table)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Remove every table.
    pub fn clear(&self) {
        self.tables.clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Key bounds covering `range` inside `actor`'s partition.
///
/// Returns `None` when the range is empty, e.g. `After(+inf)`.
fn partition_bounds(actor: &Actor, range: KeyRange) -> Option<(Bound<RecordKey>, Bound<RecordKey>)> {
    let key = |t: Timestamp| RecordKey::new(actor.clone(), t);
    let lowest = Timestamp::from_secs_f64(f64::NEG_INFINITY);
    let highest = Timestamp::from_secs_f64(f64::INFINITY);
    match range {
        KeyRange::All => Some((Bound::Included(key(lowest)), Bound::Included(key(highest)))),
        KeyRange::After(t) if t <= highest => {
            Some((Bound::Excluded(key(t)), Bound::Included(key(highest))))
        }
        KeyRange::Before(t) if t >= lowest => {
            Some((Bound::Included(key(lowest)), Bound::Excluded(key(t))))
        }
        KeyRange::After(_) | KeyRange::Before(_) => None,
    }
}

impl ActionStore for MemoryStore {
    fn put(&self, table: &str, record: &ActionRecord) -> Result<(), StoreError> {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(record.key(), record.clone());
        Ok(())
    }

    fn query(&self, table: &str, request: &QueryRequest) -> Result<Vec<ActionRecord>, StoreError> {
        let Some(entries) = self.tables.get(table) else {
            return Ok(Vec::new());
        };
        let Some(bounds) = partition_bounds(&request.actor, request.range) else {
            return Ok(Vec::new());
        };

        let limit = request.limit.unwrap_or(usize::MAX);
        Ok(entries
            .range(bounds)
            .map(|(_, record)| record)
            .filter(|record| request.filter.matches(record))
            .take(limit)
            .cloned()
            .collect())
    }

    fn scan(
        &self,
        table: &str,
        filter: &Filter,
        start: Option<&ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        let lower = match start {
            None => Bound::Unbounded,
            Some(ContinuationToken::After(key)) => Bound::Excluded(key.clone()),
            Some(ContinuationToken::Cursor(_)) => {
                return Err(StoreError::new(
                    StoreOp::Scan,
                    table,
                    "cursor tokens are not issued by the in-memory store",
                ))
            }
        };
        let Some(entries) = self.tables.get(table) else {
            return Ok(ScanPage::default());
        };

        let mut evaluated = entries.range((lower, Bound::Unbounded)).take(self.page_size + 1);
        let mut page = ScanPage::default();
        let mut last_key = None;
        for (key, record) in evaluated.by_ref().take(self.page_size) {
            if filter.matches(record) {
                page.records.push(record.clone());
            }
            last_key = Some(key);
        }
        // Only hand out a token when something follows the last evaluated key.
        if evaluated.next().is_some() {
            page.next = last_key.cloned().map(ContinuationToken::After);
        }
        Ok(page)
    }

    fn delete(&self, table: &str, key: &RecordKey) -> Result<(), StoreError> {
        if let Some(mut entries) = self.tables.get_mut(table) {
            entries.remove(key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::Predicate;

    const TABLE: &str = "action_log";

    fn ts(secs: f64) -> Timestamp {
        Timestamp::from_secs_f64(secs)
    }

    fn record(user: &str, name: &str, secs: f64) -> ActionRecord {
        ActionRecord::for_user(user, name, "bot", ts(secs))
    }

    #[test]
    fn test_put_overwrites_same_key() {
        let store = MemoryStore::new();
        store.put(TABLE, &record("alice", "a", 1.0)).unwrap();
        store.put(TABLE, &record("alice", "b", 1.0)).unwrap();

        assert_eq!(store.len(TABLE), 1);
        assert_eq!(store.records(TABLE)[0].action_name, "b");
    }

    #[test]
    fn test_query_stays_in_partition() {
        let store = MemoryStore::new();
        store.put(TABLE, &record("alice", "a", 1.0)).unwrap();
        store.put(TABLE, &record("alice", "a", 2.0)).unwrap();
        store.put(TABLE, &record("bob", "a", 1.5)).unwrap();

        let alice = store
            .query(TABLE, &QueryRequest::partition(Actor::user("alice")))
            .unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|r| r.actor == Actor::user("alice")));
    }

    #[test]
    fn test_query_range_filter_and_limit() {
        let store = MemoryStore::new();
        for (i, name) in ["a", "b", "a", "a"].iter().enumerate() {
            store.put(TABLE, &record("alice", name, i as f64)).unwrap();
        }

        let request = QueryRequest::partition(Actor::user("alice"))
            .with_range(KeyRange::After(ts(0.0)))
            .with_filter(Filter::all().and(Predicate::ActionNameIs("a".to_string())));
        let found = store.query(TABLE, &request).unwrap();
        assert_eq!(
            found.iter().map(|r| r.action_time).collect::<Vec<_>>(),
            vec![ts(2.0), ts(3.0)]
        );

        let limited = store.query(TABLE, &request.with_limit(1)).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_query_empty_range() {
        let store = MemoryStore::new();
        store.put(TABLE, &record("alice", "a", 1.0)).unwrap();

        let request = QueryRequest::partition(Actor::user("alice"))
            .with_range(KeyRange::After(ts(f64::NAN)));
        assert!(store.query(TABLE, &request).unwrap().is_empty());
    }

    #[test]
    fn test_query_missing_table() {
        let store = MemoryStore::new();
        let found = store
            .query("nope", &QueryRequest::partition(Actor::Cleared))
            .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_paginates_by_evaluated_entries() {
        let store = MemoryStore::with_page_size(2).unwrap();
        for i in 0..5 {
            store.put(TABLE, &record("alice", "a", i as f64)).unwrap();
        }
        let filter = Filter::all().and(Predicate::TimeBefore(ts(3.0)));

        let first = store.scan(TABLE, &filter, None).unwrap();
        assert_eq!(first.records.len(), 2);
        let second = store.scan(TABLE, &filter, first.next.as_ref()).unwrap();
        assert_eq!(second.records.len(), 1);
        let third = store.scan(TABLE, &filter, second.next.as_ref()).unwrap();
        assert!(third.records.is_empty());
        assert_eq!(third.next, None);
    }

    #[test]
    fn test_scan_exact_page_has_no_token() {
        let store = MemoryStore::with_page_size(2).unwrap();
        store.put(TABLE, &record("alice", "a", 1.0)).unwrap();
        store.put(TABLE, &record("bob", "a", 1.0)).unwrap();

        let page = store.scan(TABLE, &Filter::all(), None).unwrap();
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_scan_rejects_foreign_cursor() {
        let store = MemoryStore::new();
        let err = store
            .scan(TABLE, &Filter::all(), Some(&ContinuationToken::Cursor(7)))
            .unwrap_err();
        assert_eq!(err.op(), StoreOp::Scan);
    }

    #[test]
    fn test_delete_missing_key_is_noop() {
        let store = MemoryStore::new();
        let key = record("alice", "a", 1.0).key();
        store.delete(TABLE, &key).unwrap();

        store.put(TABLE, &record("alice", "a", 1.0)).unwrap();
        store.delete(TABLE, &key).unwrap();
        store.delete(TABLE, &key).unwrap();
        assert!(store.is_empty(TABLE));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert_eq!(
            MemoryStore::with_page_size(0).unwrap_err(),
            ValidationError::ZeroPageSize
        );
    }
}

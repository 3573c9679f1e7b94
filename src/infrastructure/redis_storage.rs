//! Redis-backed action store.
//!
//! Lets several bot instances share one action log.
//!
//! ## Layout
//!
//! - One sorted set per partition: `{key_prefix}{table}:{partition}`
//! - Score: `action_time` in seconds
//! - Member: the record, bincode encoded
//!
//! A partition query is a `ZRANGEBYSCORE` on one key. A scan walks the
//! table's keys with `SCAN ... MATCH {key_prefix}{table}:*` and hands the
//! server cursor back as the continuation token. `SCAN` can return a key
//! twice across pages, so a sweep may see a record it already deleted;
//! deleting it again is a no-op.
//!
//! Table names containing `:` or glob metacharacters are rejected, so one
//! table's pattern never reaches another table's keys.
//!
//! ## Runtime
//!
//! The [`ActionStore`] port is synchronous. Inside a multi-threaded tokio
//! runtime calls run through `block_in_place`; outside any runtime a
//! temporary one is created per call.
//!
//! ## Example
//!
//! ```rust,ignore
//! use skoocheh::{ActionLog, RedisStore, RedisStoreConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RedisStoreConfig {
//!         key_prefix: "skoocheh:".to_string(),
//!         scan_count: 500,
//!     };
//!     let store = RedisStore::connect_with_config("redis://127.0.0.1/", config)
//!         .await
//!         .expect("Failed to connect to Redis");
//!
//!     let log = ActionLog::builder().build(store).unwrap();
//!     log.log_action("alice", "app.apk", "bot").unwrap();
//! }
//! ```

use crate::application::ports::{
    ActionStore, ContinuationToken, Filter, KeyRange, QueryRequest, ScanPage, StoreError, StoreOp,
};
use crate::domain::policy::check_table_name;
use crate::domain::record::{ActionRecord, Actor, RecordKey, Timestamp};
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Configuration for Redis storage.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Key prefix for Redis keys (default: "skoocheh:")
    pub key_prefix: String,
    /// `COUNT` hint passed to each `SCAN` (default: 100)
    pub scan_count: usize,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "skoocheh:".to_string(),
            scan_count: 100,
        }
    }
}

/// Redis-backed store for distributed action logs.
pub struct RedisStore {
    connection: Arc<RwLock<ConnectionManager>>,
    config: RedisStoreConfig,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Clone for RedisStore {
    fn clone(&self) -> Self {
        Self {
            connection: Arc::clone(&self.connection),
            config: self.config.clone(),
        }
    }
}

impl RedisStore {
    /// Connect to Redis with default configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisStoreConfig::default()).await
    }

    /// Connect to Redis with custom configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisStoreConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
            config,
        })
    }

    pub fn config(&self) -> &RedisStoreConfig {
        &self.config
    }

    /// Delete every key under this store's prefix.
    pub fn clear(&self) -> Result<(), StoreError> {
        let pattern = format!("{}*", escape_glob(&self.config.key_prefix));

        block_on(StoreOp::Delete, &self.config.key_prefix, async {
            let mut conn = self.connection.write().await;
            let mut cursor = 0;
            loop {
                let (new_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(self.config.scan_count)
                    .query_async(&mut *conn)
                    .await?;

                if !keys.is_empty() {
                    let (): () = redis::cmd("DEL").arg(&keys).query_async(&mut *conn).await?;
                }

                if new_cursor == 0 {
                    break;
                }
                cursor = new_cursor;
            }
            Ok(())
        })
    }

    fn key(&self, op: StoreOp, table: &str, actor: &Actor) -> Result<String, StoreError> {
        check_table_name("store", table).map_err(|e| StoreError::new(op, table, e))?;
        Ok(format!("{}{}:{}", self.config.key_prefix, table, actor.partition()))
    }

    fn table_pattern(&self, table: &str) -> Result<String, StoreError> {
        check_table_name("store", table).map_err(|e| StoreError::new(StoreOp::Scan, table, e))?;
        Ok(format!("{}{}:*", escape_glob(&self.config.key_prefix), table))
    }

    /// Read the members of `key` with scores in `[min, max]`, at most `limit`
    /// of them, dropping any member that does not decode.
    async fn range(
        &self,
        key: &str,
        min: &str,
        max: &str,
        limit: Option<usize>,
    ) -> Result<Vec<ActionRecord>, RedisError> {
        let mut cmd = redis::cmd("ZRANGEBYSCORE");
        cmd.arg(key).arg(min).arg(max);
        if let Some(count) = limit {
            cmd.arg("LIMIT").arg(0).arg(count);
        }

        let mut conn = self.connection.write().await;
        let members: Vec<Vec<u8>> = cmd.query_async(&mut *conn).await?;

        Ok(members
            .iter()
            .filter_map(|bytes| match bincode::deserialize::<ActionRecord>(bytes) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(key, error = %e, "skipping undecodable action record");
                    None
                }
            })
            .collect())
    }
}

/// Escape glob metacharacters for `SCAN ... MATCH`.
fn escape_glob(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Render a score bound, exclusive bounds prefixed with `(`.
fn score_bound(t: Timestamp, exclusive: bool) -> String {
    let secs = t.as_secs_f64();
    let value = if secs == f64::INFINITY {
        "+inf".to_string()
    } else if secs == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        secs.to_string()
    };
    if exclusive {
        format!("({}", value)
    } else {
        value
    }
}

fn range_bounds(range: KeyRange) -> (String, String) {
    match range {
        KeyRange::All => ("-inf".to_string(), "+inf".to_string()),
        KeyRange::After(t) => (score_bound(t, true), "+inf".to_string()),
        KeyRange::Before(t) => ("-inf".to_string(), score_bound(t, true)),
    }
}

fn filter_bounds(filter: &Filter) -> (String, String) {
    let (after, before) = filter.time_bounds();
    (
        after.map_or_else(|| "-inf".to_string(), |t| score_bound(t, true)),
        before.map_or_else(|| "+inf".to_string(), |t| score_bound(t, true)),
    )
}

/// Run `fut` to completion from synchronous code.
fn block_on<F, T>(op: StoreOp, table: &str, fut: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, RedisError>>,
{
    let result = if let Ok(handle) = tokio::runtime::Handle::try_current() {
        tokio::task::block_in_place(|| handle.block_on(fut))
    } else {
        let rt = tokio::runtime::Runtime::new().map_err(|e| StoreError::new(op, table, e))?;
        rt.block_on(fut)
    };
    result.map_err(|e| StoreError::new(op, table, e))
}

impl ActionStore for RedisStore {
    fn put(&self, table: &str, record: &ActionRecord) -> Result<(), StoreError> {
        let key = self.key(StoreOp::Put, table, &record.actor)?;
        let score = score_bound(record.action_time, false);
        let bytes = bincode::serialize(record).map_err(|e| StoreError::new(StoreOp::Put, table, e))?;

        block_on(StoreOp::Put, table, async {
            let mut conn = self.connection.write().await;
            // Same key overwrites: drop whatever sits at this score first.
            let (): () = redis::pipe()
                .atomic()
                .cmd("ZREMRANGEBYSCORE")
                .arg(&key)
                .arg(&score)
                .arg(&score)
                .ignore()
                .cmd("ZADD")
                .arg(&key)
                .arg(&score)
                .arg(bytes)
                .ignore()
                .query_async(&mut *conn)
                .await?;
            Ok(())
        })
    }

    fn query(&self, table: &str, request: &QueryRequest) -> Result<Vec<ActionRecord>, StoreError> {
        let key = self.key(StoreOp::Query, table, &request.actor)?;
        let (min, max) = range_bounds(request.range);
        // Without predicates the server can stop at the limit.
        let server_limit = request.limit.filter(|_| request.filter.predicates().is_empty());
        let limit = request.limit.unwrap_or(usize::MAX);

        let records = block_on(
            StoreOp::Query,
            table,
            self.range(&key, &min, &max, server_limit),
        )?;
        Ok(records
            .into_iter()
            .filter(|record| request.filter.matches(record))
            .take(limit)
            .collect())
    }

    fn scan(
        &self,
        table: &str,
        filter: &Filter,
        start: Option<&ContinuationToken>,
    ) -> Result<ScanPage, StoreError> {
        let cursor = match start {
            None => 0,
            Some(ContinuationToken::Cursor(cursor)) => *cursor,
            Some(ContinuationToken::After(_)) => {
                return Err(StoreError::new(
                    StoreOp::Scan,
                    table,
                    "key tokens are not issued by the Redis store",
                ))
            }
        };
        let pattern = self.table_pattern(table)?;
        let (min, max) = filter_bounds(filter);

        block_on(StoreOp::Scan, table, async {
            let (next_cursor, keys): (u64, Vec<String>) = {
                let mut conn = self.connection.write().await;
                redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(self.config.scan_count)
                    .query_async(&mut *conn)
                    .await?
            };

            let mut page = ScanPage::default();
            let mut seen = HashSet::new();
            for key in keys {
                if !seen.insert(key.clone()) {
                    continue;
                }
                let records = self.range(&key, &min, &max, None).await?;
                page.records
                    .extend(records.into_iter().filter(|record| filter.matches(record)));
            }
            if next_cursor != 0 {
                page.next = Some(ContinuationToken::Cursor(next_cursor));
            }
            Ok(page)
        })
    }

    fn delete(&self, table: &str, key: &RecordKey) -> Result<(), StoreError> {
        let redis_key = self.key(StoreOp::Delete, table, &key.actor)?;
        let score = score_bound(key.action_time, false);

        block_on(StoreOp::Delete, table, async {
            let mut conn = self.connection.write().await;
            let _removed: usize = redis::cmd("ZREMRANGEBYSCORE")
                .arg(&redis_key)
                .arg(&score)
                .arg(&score)
                .query_async(&mut *conn)
                .await?;
            Ok(())
        })
    }
}

//! # skoocheh
//!
//! Action logging, request rate limiting and locale helpers for a file
//! distribution bot.
//!
//! Every successful user action is written to an append-mostly action log.
//! The log answers two questions: whether a user performed an action within
//! the rate-limit window, and whether a user ever requested anything. Old
//! records are removed by bounded sweeps that optionally leave tombstones.
//!
//! User identifiers are never stored: each one is replaced by the hex
//! SHA-512 digest of its UTF-8 bytes before it reaches a store.
//!
//! ## Quick Start
//!
//! ```rust
//! use skoocheh::{ActionLog, MemoryStore};
//! use std::time::Duration;
//!
//! let log = ActionLog::builder()
//!     .with_window(Duration::from_secs(3600))
//!     .build(MemoryStore::new())
//!     .unwrap();
//!
//! if !log.is_limit_exceeded("alice", "app.apk").unwrap() {
//!     // serve the file, then:
//!     log.log_action("alice", "app.apk", "telegram").unwrap();
//! }
//! assert!(log.is_limit_exceeded("alice", "app.apk").unwrap());
//! ```
//!
//! ## Sweeps
//!
//! A sweep deletes records older than a maximum age, but never more than
//! `max_delete` of them per call. It stops mid-page once the cap is hit and
//! reports whether candidates remain; run it again to continue.
//!
//! ```rust
//! use skoocheh::{ActionLog, MemoryStore, SweepPolicy, Timestamp};
//! use std::time::Duration;
//!
//! let log = ActionLog::builder().build(MemoryStore::new()).unwrap();
//! for i in 0..150 {
//!     log.log_action_at("alice", "app.apk", "bot", Timestamp::from_secs_f64(i as f64))
//!         .unwrap();
//! }
//!
//! let policy = SweepPolicy::new(Duration::from_secs(3600), 100);
//! let first = log.sweep_with(policy).unwrap();
//! assert_eq!(first.deleted, 100);
//! assert!(first.more_remaining);
//!
//! let second = log.sweep_with(policy).unwrap();
//! assert_eq!(second.as_tuple(), (50, 0));
//! ```
//!
//! With tombstones enabled, each deleted record is first copied to the
//! tombstone table under the reserved [`Actor::Cleared`] identity, and the
//! report lists the cleared items.
//!
//! ## Configuration
//!
//! [`ActionLogConfig`] can be built in code or loaded from TOML; missing
//! keys take their defaults and unknown keys are rejected:
//!
//! ```rust
//! use skoocheh::ActionLogConfig;
//!
//! let config = ActionLogConfig::from_toml_str(r#"
//!     table = "downloads"
//!     [sweep]
//!     max_delete = 25
//!     tombstones = true
//! "#).unwrap();
//! assert_eq!(config.sweep_policy().unwrap().max_delete(), 25);
//! ```
//!
//! ## Storage
//!
//! - [`MemoryStore`]: ordered in-process tables (default)
//! - `RedisStore`: one sorted set per user (feature `redis-storage`)
//!
//! Any type implementing [`ActionStore`] can back an [`ActionLog`].
//!
//! ## Observability
//!
//! The crate logs through `tracing` and never installs a subscriber.
//! Logged actions and limit checks emit `debug!` events, sweep outcomes
//! emit `info!`, and aborted sweeps emit `warn!`. Counters are available
//! through [`ActionLog::metrics`]:
//!
//! ```rust
//! # use skoocheh::{ActionLog, MemoryStore};
//! # let log = ActionLog::builder().build(MemoryStore::new()).unwrap();
//! let snapshot = log.metrics().snapshot();
//! println!("limit hit rate: {:.2}%", snapshot.hit_rate() * 100.0);
//! ```
//!
//! ## Locale helpers
//!
//! Bot messages are rendered for Farsi and English readers:
//!
//! ```rust
//! use skoocheh::{localize_digits, Lang};
//!
//! assert_eq!(localize_digits("v1.25", Lang::Fa, true), "v۱٫۲۵");
//! ```

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    digest::{checksum_bytes, content_checksum},
    jalali::JalaliDate,
    locale::{localize_digits, Lang, MultiDate, RelativeTime, UnknownLang},
    policy::{
        check_table_name, RequestWindow, SweepPolicy, ValidationError, DEFAULT_MAX_AGE, DEFAULT_MAX_DELETE,
        DEFAULT_WINDOW,
    },
    record::{ActionRecord, Actor, RecordKey, Timestamp, UserHash},
};

pub use application::{
    action_log::{ActionLog, ActionLogBuilder, ClearedItem, SweepReport},
    config::{ActionLogConfig, SweepConfig},
    metrics::{Metrics, MetricsSnapshot},
    ports::{
        ActionStore, Clock, ContinuationToken, Filter, KeyRange, Predicate, QueryRequest,
        ScanPage, StoreError, StoreOp,
    },
};

pub use infrastructure::{clock::SystemClock, storage::MemoryStore};

#[cfg(feature = "redis-storage")]
pub use infrastructure::redis_storage::{RedisStore, RedisStoreConfig};

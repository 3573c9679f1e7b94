//! Integration tests for the Redis store.
//!
//! These tests require a Redis instance running at `redis://127.0.0.1/`.
//! Tests are ignored by default - run with `cargo test --features redis-storage --test redis_store -- --ignored`

#![cfg(feature = "redis-storage")]

use skoocheh::application::ports::StoreOp;
use skoocheh::infrastructure::mocks::MockClock;
use skoocheh::{
    ActionLog, ActionRecord, ActionStore, Actor, Filter, KeyRange, Predicate, QueryRequest,
    RedisStore, RedisStoreConfig, SweepPolicy, Timestamp,
};
use std::sync::Arc;
use std::time::Duration;

fn ts(secs: f64) -> Timestamp {
    Timestamp::from_secs_f64(secs)
}

/// Check if Redis is available before running tests
async fn redis_available() -> bool {
    RedisStore::connect("redis://127.0.0.1/").await.is_ok()
}

/// Create a test store with unique prefix
async fn create_test_store(test_name: &str, scan_count: usize) -> RedisStore {
    let config = RedisStoreConfig {
        key_prefix: format!("test:{}:", test_name),
        scan_count,
    };

    let store = RedisStore::connect_with_config("redis://127.0.0.1/", config)
        .await
        .expect("Failed to connect to Redis");
    store.clear().expect("Failed to clear test keys");
    store
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Redis
async fn test_redis_put_and_query() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available at redis://127.0.0.1/");
        return;
    }

    let store = create_test_store("put_query", 100).await;
    for (i, name) in ["a", "b", "a"].iter().enumerate() {
        store
            .put(
                "action_log",
                &ActionRecord::for_user("alice", *name, "bot", ts(10.0 + i as f64)),
            )
            .unwrap();
    }
    store
        .put("action_log", &ActionRecord::for_user("bob", "a", "bot", ts(11.0)))
        .unwrap();

    let request = QueryRequest::partition(Actor::user("alice"))
        .with_range(KeyRange::After(ts(10.0)))
        .with_filter(Filter::all().and(Predicate::ActionNameIs("a".to_string())));
    let found = store.query("action_log", &request).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].action_time, ts(12.0));

    let all = store
        .query("action_log", &QueryRequest::partition(Actor::user("alice")))
        .unwrap();
    assert_eq!(all.len(), 3);

    store.clear().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Redis
async fn test_redis_put_overwrites_same_key() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = create_test_store("overwrite", 100).await;
    let first = ActionRecord::for_user("alice", "first", "bot", ts(1.5));
    let second = ActionRecord::for_user("alice", "second", "bot", ts(1.5));
    store.put("action_log", &first).unwrap();
    store.put("action_log", &second).unwrap();

    let all = store
        .query("action_log", &QueryRequest::partition(Actor::user("alice")))
        .unwrap();
    assert_eq!(all, vec![second.clone()]);

    store.delete("action_log", &second.key()).unwrap();
    store.delete("action_log", &second.key()).unwrap();
    assert!(store
        .query("action_log", &QueryRequest::partition(Actor::user("alice")))
        .unwrap()
        .is_empty());

    store.clear().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Redis
async fn test_redis_action_log_round_trip() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = create_test_store("action_log", 100).await;
    let clock = MockClock::at_secs(1000.0);
    let log = ActionLog::builder()
        .with_clock(Arc::new(clock.clone()))
        .build(store.clone())
        .unwrap();

    // A long history: the existence check must still return one record.
    for i in 0..500 {
        log.log_action_at("alice", &format!("old-{}.apk", i), "bot", ts(i as f64))
            .unwrap();
    }
    log.log_action("alice", "app.apk", "bot").unwrap();
    assert!(log.is_limit_exceeded("alice", "app.apk").unwrap());
    assert!(log.user_has_requested_before("alice").unwrap());
    assert!(!log.user_has_requested_before("bob").unwrap());

    let first = store
        .query(
            "action_log",
            &QueryRequest::partition(Actor::user("alice")).with_limit(1),
        )
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].action_time, ts(0.0));

    let filtered = store
        .query(
            "action_log",
            &QueryRequest::partition(Actor::user("alice"))
                .with_filter(Filter::all().and(Predicate::ActionNameIs("app.apk".to_string())))
                .with_limit(1),
        )
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].action_time, ts(1000.0));

    clock.advance(Duration::from_secs(85_000));
    assert!(!log.is_limit_exceeded("alice", "app.apk").unwrap());

    store.clear().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Redis
async fn test_redis_sweep_with_tombstones() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    // A small scan count forces several cursor pages.
    let store = create_test_store("sweep", 2).await;
    let log = ActionLog::builder()
        .with_clock(Arc::new(MockClock::at_secs(1_000_000.0)))
        .with_sweep_policy(SweepPolicy::new(Duration::from_secs(3600), 100).with_tombstones(true))
        .build(store.clone())
        .unwrap();

    for u in 0..10 {
        log.log_action_at(&format!("user-{}", u), "app.apk", "bot", ts(u as f64))
            .unwrap();
        log.log_action_at(&format!("user-{}", u), "app.apk", "bot", ts(999_999.0))
            .unwrap();
    }

    let report = log.sweep().unwrap();
    assert_eq!(report.deleted, 10);
    assert_eq!(report.cleared.len(), 10);
    assert!(!report.more_remaining);

    let tombstones = store
        .query("action_log_cleaned", &QueryRequest::partition(Actor::Cleared))
        .unwrap();
    assert_eq!(tombstones.len(), 10);
    for u in 0..10 {
        assert!(log.user_has_requested_before(&format!("user-{}", u)).unwrap());
    }

    store.clear().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Redis
async fn test_redis_sweep_cap() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = create_test_store("sweep_cap", 100).await;
    let log = ActionLog::builder()
        .with_clock(Arc::new(MockClock::at_secs(1_000_000.0)))
        .build(store.clone())
        .unwrap();
    for i in 0..30 {
        log.log_action_at("alice", "app.apk", "bot", ts(i as f64)).unwrap();
    }

    let first = log.clean_action_log(Duration::from_secs(3600), 20).unwrap();
    assert_eq!(first.deleted, 20);
    assert!(first.more_remaining);

    let second = log.clean_action_log(Duration::from_secs(3600), 20).unwrap();
    assert_eq!(second.as_tuple(), (10, 0));

    store.clear().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Requires Redis
async fn test_redis_rejects_reserved_table_names() {
    if !redis_available().await {
        eprintln!("Skipping test: Redis not available");
        return;
    }

    let store = create_test_store("reserved", 100).await;
    let record = ActionRecord::for_user("alice", "app.apk", "bot", ts(1.0));
    for table in ["action_log:old", "action_*"] {
        let err = store.put(table, &record).unwrap_err();
        assert_eq!(err.op(), StoreOp::Put);
        assert!(store
            .scan(table, &Filter::all(), None)
            .unwrap_err()
            .to_string()
            .contains(table));
    }

    store.put("action_log", &record).unwrap();
    let mut found = Vec::new();
    let mut start = None;
    loop {
        let page = store.scan("action_log", &Filter::all(), start.as_ref()).unwrap();
        found.extend(page.records);
        match page.next {
            Some(next) => start = Some(next),
            None => break,
        }
    }
    assert_eq!(found, vec![record]);

    store.clear().unwrap();
}

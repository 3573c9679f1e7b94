use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use skoocheh::infrastructure::mocks::MockClock;
use skoocheh::{ActionLog, MemoryStore, SweepPolicy, Timestamp, UserHash};
use std::sync::Arc;
use std::time::Duration;

/// Benchmark user identifier hashing
fn bench_user_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("user_hash");

    group.bench_function("short_id", |b| {
        b.iter(|| UserHash::of(black_box("123456789")))
    });

    group.bench_function("email", |b| {
        b.iter(|| UserHash::of(black_box("someone.with.a.long.name@example.com")))
    });

    group.finish();
}

/// Benchmark rate-limit checks against logs of growing size
fn bench_limit_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("limit_check");

    for users in [10, 1_000, 10_000].iter() {
        let log = ActionLog::builder()
            .with_clock(Arc::new(MockClock::at_secs(1_000_000.0)))
            .build(MemoryStore::new())
            .unwrap();
        for u in 0..*users {
            for i in 0..10 {
                log.log_action_at(
                    &format!("user-{}", u),
                    &format!("app-{}.apk", i),
                    "bot",
                    Timestamp::from_secs_f64(999_000.0 + i as f64),
                )
                .unwrap();
            }
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("hit", users), users, |b, _| {
            b.iter(|| log.is_limit_exceeded(black_box("user-7"), black_box("app-3.apk")))
        });
        group.bench_with_input(BenchmarkId::new("miss", users), users, |b, _| {
            b.iter(|| log.is_limit_exceeded(black_box("user-7"), black_box("nope.apk")))
        });
    }

    group.finish();
}

/// Benchmark one capped sweep over a log full of old records
fn bench_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep");

    for tombstones in [false, true].iter() {
        group.throughput(Throughput::Elements(100));
        group.bench_with_input(
            BenchmarkId::new("capped_100", if *tombstones { "tombstones" } else { "plain" }),
            tombstones,
            |b, &tombstones| {
                b.iter_batched(
                    || {
                        let log = ActionLog::builder()
                            .with_clock(Arc::new(MockClock::at_secs(1_000_000.0)))
                            .with_sweep_policy(
                                SweepPolicy::new(Duration::from_secs(3600), 100)
                                    .with_tombstones(tombstones),
                            )
                            .build(MemoryStore::new())
                            .unwrap();
                        for i in 0..500 {
                            log.log_action_at(
                                &format!("user-{}", i % 50),
                                "app.apk",
                                "bot",
                                Timestamp::from_secs_f64(i as f64),
                            )
                            .unwrap();
                        }
                        log
                    },
                    |log| log.sweep().unwrap(),
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_user_hash, bench_limit_check, bench_sweep);
criterion_main!(benches);

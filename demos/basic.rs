//! Basic example of rate limiting and sweeping with an in-memory store.
//!
//! Logs a few downloads, shows the rate limit kicking in, then sweeps old
//! records with tombstones enabled. Run with:
//!
//! ```text
//! cargo run --example basic
//! ```

use skoocheh::application::ports::Clock;
use skoocheh::{ActionLog, MemoryStore, MultiDate, SweepPolicy, SystemClock, Timestamp};
use std::time::Duration;
use tracing::Level;

fn main() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let log = ActionLog::builder()
        .with_window(Duration::from_secs(60))
        .with_sweep_policy(
            SweepPolicy::new(Duration::from_secs(48 * 3600), 100).with_tombstones(true),
        )
        .build(MemoryStore::new())
        .expect("default configuration is valid");

    println!("=== Rate limiting ===\n");
    for attempt in 1..=3 {
        let limited = log
            .is_limit_exceeded("alice@example.com", "app.apk")
            .expect("in-memory store does not fail");
        if limited {
            println!("attempt {attempt}: rate limited");
        } else {
            println!("attempt {attempt}: serving app.apk");
            log.log_action("alice@example.com", "app.apk", "email")
                .expect("in-memory store does not fail");
        }
    }

    println!("\n=== Sweeping ===\n");
    let now = SystemClock::new().now();
    let three_days = 3.0 * 24.0 * 3600.0;
    for i in 0..5 {
        let at = Timestamp::from_secs_f64(now.as_secs_f64() - three_days - i as f64);
        log.log_action_at("bob", &format!("old-{i}.apk"), "telegram", at)
            .expect("in-memory store does not fail");
    }

    let report = log.sweep().expect("in-memory store does not fail");
    println!("deleted {} records", report.deleted);
    for item in &report.cleared {
        if let Some(date) = MultiDate::from_timestamp(item.action_time, now) {
            println!(
                "  {} via {}: {} ({} / {})",
                item.action_name, item.source, date.gregorian, date.jalali_short, date.relative_en
            );
        }
    }

    let snapshot = log.metrics().snapshot();
    println!("\nMetrics: {:?}", snapshot);
}

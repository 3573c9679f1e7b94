//! Mock clock for testing.

use crate::application::ports::Clock;
use crate::domain::record::Timestamp;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock wall clock for testing.
///
/// Allows tests to control time explicitly, so rate-limit windows and sweep
/// cutoffs can be checked at exact boundaries.
///
/// # Examples
///
/// ```
/// use skoocheh::infrastructure::mocks::MockClock;
/// use skoocheh::application::ports::Clock;
/// use skoocheh::Timestamp;
/// use std::time::Duration;
///
/// let clock = MockClock::new(Timestamp::from_secs_f64(1000.0));
///
/// clock.advance(Duration::from_secs(10));
/// assert_eq!(clock.now(), Timestamp::from_secs_f64(1010.0));
///
/// clock.set(Timestamp::from_secs_f64(5.5));
/// assert_eq!(clock.now().as_secs_f64(), 5.5);
/// ```
///
/// # Thread Safety
///
/// All clones share the same underlying time value, so advancing time in
/// one clone affects all clones.
#[derive(Debug, Clone)]
pub struct MockClock {
    current_time: Arc<Mutex<Timestamp>>,
}

impl MockClock {
    /// Create a mock clock reading `start`.
    pub fn new(start: Timestamp) -> Self {
        Self {
            current_time: Arc::new(Mutex::new(start)),
        }
    }

    /// Create a mock clock reading `secs` seconds since the epoch.
    pub fn at_secs(secs: f64) -> Self {
        Self::new(Timestamp::from_secs_f64(secs))
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: Duration) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = Timestamp::from_secs_f64(time.as_secs_f64() + duration.as_secs_f64());
    }

    /// Set the clock to a specific timestamp.
    pub fn set(&self, timestamp: Timestamp) {
        let mut time = self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock");
        *time = timestamp;
    }
}

impl Clock for MockClock {
    fn now(&self) -> Timestamp {
        *self
            .current_time
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

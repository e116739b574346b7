//! Clock adapters.

use chrono::{DateTime, Utc};
use guard_types::Clock;

/// Wall clock backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub use mock::MockClock;

#[cfg(any(test, feature = "test-helpers"))]
mod mock {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeDelta, Utc};
    use guard_types::Clock;

    /// Controllable clock for tests.
    ///
    /// Clones share the same time, so a clock handed to a limiter can be
    /// advanced from the test body.
    #[derive(Debug, Clone)]
    pub struct MockClock {
        current: Arc<Mutex<DateTime<Utc>>>,
    }

    impl MockClock {
        pub fn new(start: DateTime<Utc>) -> Self {
            Self {
                current: Arc::new(Mutex::new(start)),
            }
        }

        pub fn advance(&self, by: TimeDelta) {
            let mut time = self.current.lock().expect("MockClock mutex poisoned");
            *time += by;
        }

        pub fn advance_ms(&self, ms: i64) {
            self.advance(TimeDelta::milliseconds(ms));
        }

        pub fn set(&self, at: DateTime<Utc>) {
            *self.current.lock().expect("MockClock mutex poisoned") = at;
        }
    }

    impl Default for MockClock {
        fn default() -> Self {
            Self::new(Utc::now())
        }
    }

    impl Clock for MockClock {
        fn now(&self) -> DateTime<Utc> {
            *self.current.lock().expect("MockClock mutex poisoned")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::new();
        let t1 = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(clock.now() > t1);
    }

    #[test]
    fn test_mock_clock_is_shared_between_clones() {
        let start = Utc::now();
        let clock = MockClock::new(start);
        let clone = clock.clone();

        clone.advance(TimeDelta::seconds(10));
        assert_eq!(clock.now(), start + TimeDelta::seconds(10));

        clock.set(start);
        assert_eq!(clone.now(), start);
    }
}

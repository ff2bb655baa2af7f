//! # Bookline Testing
//!
//! Deterministic test utilities shared across the workspace.
//!
//! Reducer tests depend on time through the [`Clock`] trait
//! (`bookline_core::environment::Clock`); this crate supplies a fixed
//! clock so `added_at` timestamps and booking dates are reproducible.
//!
//! Feature-specific mocks (booking service, payment gateway, cart
//! storage) live in `bookline-checkout` behind its `test-utils` feature,
//! next to the traits they implement.
//!
//! ## Example
//!
//! ```
//! use bookline_testing::test_clock;
//! use bookline_core::environment::Clock;
//!
//! let clock = test_clock();
//! assert_eq!(clock.now(), clock.now());
//! ```

use bookline_core::environment::Clock;
use chrono::{DateTime, TimeZone, Utc};

/// Mock implementations of environment traits.
pub mod mocks {
    use super::{Clock, DateTime, TimeZone, Utc};

    /// A clock pinned to a single instant.
    #[derive(Debug, Clone, Copy)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a clock that always reports `time`.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// A clock advanced by `seconds` relative to this one.
        ///
        /// Useful for cart tests that need distinguishable `added_at`
        /// values.
        #[must_use]
        pub fn advanced_by_seconds(self, seconds: i64) -> Self {
            Self {
                time: self.time + chrono::Duration::seconds(seconds),
            }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// The default fixed clock for tests: 2025-06-01 09:00:00 UTC.
    #[must_use]
    pub fn test_clock() -> FixedClock {
        // The literal is a valid calendar date.
        #[allow(clippy::unwrap_used)]
        FixedClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap())
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

//! # Boxoffice Testing
//!
//! Testing utilities for the reservation engine.
//!
//! This crate provides:
//! - In-memory implementations of the engine's store traits, with real
//!   TTL semantics against the tokio clock
//! - Failure-injecting stores for outage-path tests
//! - A fixed clock for deterministic receipt timestamps
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_core::{ReservationConfig, ReservationEngine};
//! use boxoffice_testing::{test_clock, InMemoryStore, InMemoryTierSource};
//! use std::sync::Arc;
//!
//! #[tokio::test]
//! async fn test_reserve() {
//!     let tiers = Arc::new(InMemoryTierSource::new());
//!     let store = Arc::new(InMemoryStore::new());
//!     let engine = ReservationEngine::with_clock(
//!         tiers,
//!         store,
//!         ReservationConfig::default(),
//!         Arc::new(test_clock()),
//!     );
//!     // drive the engine...
//! }
//! ```

pub mod store_mocks;

/// Mock implementations of ambient dependencies.
pub mod mocks {
    use boxoffice_core::clock::Clock;
    use chrono::{DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use boxoffice_testing::mocks::FixedClock;
    /// use boxoffice_core::clock::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};
pub use store_mocks::{
    FailingStore, FailingTierSource, InMemoryStore, InMemoryTierSource,
};

#[cfg(test)]
mod tests {
    use super::*;
    use boxoffice_core::clock::Clock;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
    }
}

//! Engine configuration.
//!
//! Hold and lock lifetimes are product decisions, not derived from any
//! invariant, so they are carried as configuration rather than constants.
//! The defaults match the values the system shipped with: 20-minute holds,
//! 30-second locks, 4 lock retries at a 100 ms base delay.

use std::time::Duration;

/// Tunables for the reservation engine.
///
/// # Default Values
///
/// - `hold_ttl`: 20 minutes
/// - `lock_ttl`: 30 seconds
/// - `lock_max_retries`: 4
/// - `lock_base_delay`: 100ms
#[derive(Debug, Clone)]
pub struct ReservationConfig {
    /// How long a written hold stays on the books before the ephemeral
    /// store expires it.
    pub hold_ttl: Duration,
    /// Lifetime of the per-event admission lock. Bounds how long a crashed
    /// holder can wedge an event.
    pub lock_ttl: Duration,
    /// How many times lock acquisition is retried after the first attempt.
    pub lock_max_retries: usize,
    /// Base delay for the exponential backoff between lock attempts.
    pub lock_base_delay: Duration,
}

impl Default for ReservationConfig {
    fn default() -> Self {
        Self {
            hold_ttl: Duration::from_secs(20 * 60),
            lock_ttl: Duration::from_secs(30),
            lock_max_retries: 4,
            lock_base_delay: Duration::from_millis(100),
        }
    }
}

impl ReservationConfig {
    /// Create a new config builder.
    #[must_use]
    pub const fn builder() -> ReservationConfigBuilder {
        ReservationConfigBuilder {
            hold_ttl: None,
            lock_ttl: None,
            lock_max_retries: None,
            lock_base_delay: None,
        }
    }
}

/// Builder for [`ReservationConfig`].
#[derive(Debug, Clone)]
pub struct ReservationConfigBuilder {
    hold_ttl: Option<Duration>,
    lock_ttl: Option<Duration>,
    lock_max_retries: Option<usize>,
    lock_base_delay: Option<Duration>,
}

impl ReservationConfigBuilder {
    /// Set the hold lifetime.
    #[must_use]
    pub const fn hold_ttl(mut self, ttl: Duration) -> Self {
        self.hold_ttl = Some(ttl);
        self
    }

    /// Set the lock lifetime.
    #[must_use]
    pub const fn lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = Some(ttl);
        self
    }

    /// Set the number of lock acquisition retries.
    #[must_use]
    pub const fn lock_max_retries(mut self, retries: usize) -> Self {
        self.lock_max_retries = Some(retries);
        self
    }

    /// Set the base delay for lock acquisition backoff.
    #[must_use]
    pub const fn lock_base_delay(mut self, delay: Duration) -> Self {
        self.lock_base_delay = Some(delay);
        self
    }

    /// Build the [`ReservationConfig`], filling unset fields with defaults.
    #[must_use]
    pub fn build(self) -> ReservationConfig {
        let defaults = ReservationConfig::default();
        ReservationConfig {
            hold_ttl: self.hold_ttl.unwrap_or(defaults.hold_ttl),
            lock_ttl: self.lock_ttl.unwrap_or(defaults.lock_ttl),
            lock_max_retries: self.lock_max_retries.unwrap_or(defaults.lock_max_retries),
            lock_base_delay: self.lock_base_delay.unwrap_or(defaults.lock_base_delay),
        }
    }
}

//! Per-event admission lock.
//!
//! Mutual exclusion is built on the ephemeral store's conditional-set
//! primitive: exactly one caller can create the lock key, and the key's
//! TTL guarantees an ungracefully terminated holder cannot wedge the event
//! forever. Contenders retry with capped exponential backoff and full
//! jitter rather than waiting in a queue, so there is no FIFO guarantee:
//! the first successful `set_if_absent` wins.

use crate::config::ReservationConfig;
use crate::store::EphemeralStore;
use crate::types::EventId;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

const LOCK_KEY_PREFIX: &str = "lock:event:";
const LOCK_VALUE: &str = "locked";

/// Acquires and releases the per-event admission lock.
///
/// All hold writes for an event must happen while that event's lock is
/// held; the lock serialises admission decisions so the no-oversell
/// invariant only has to be checked at write time.
pub struct LockManager {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
    max_retries: usize,
    base_delay: Duration,
}

impl LockManager {
    /// Create a lock manager over the given store, taking the lock
    /// tunables from `config`.
    #[must_use]
    pub fn new(store: Arc<dyn EphemeralStore>, config: &ReservationConfig) -> Self {
        Self {
            store,
            ttl: config.lock_ttl,
            max_retries: config.lock_max_retries,
            base_delay: config.lock_base_delay,
        }
    }

    fn lock_key(event_id: &EventId) -> String {
        format!("{LOCK_KEY_PREFIX}{event_id}")
    }

    /// Attempt to acquire the event's lock once.
    ///
    /// Returns `true` iff this call created the lock key. A store failure
    /// is logged and reported as not-acquired; the retry path and the
    /// bounded retry budget turn a persistent outage into `EventBusy`
    /// rather than an unbounded wait.
    pub async fn acquire(&self, event_id: &EventId) -> bool {
        let key = Self::lock_key(event_id);
        match self
            .store
            .set_if_absent(key, LOCK_VALUE.to_string(), self.ttl)
            .await
        {
            Ok(acquired) => acquired,
            Err(error) => {
                tracing::warn!(event_id = %event_id, error = %error, "Error acquiring event lock");
                false
            }
        }
    }

    /// Acquire the event's lock, retrying with jittered exponential
    /// backoff.
    ///
    /// Attempts up to `max_retries + 1` acquisitions. Between attempts the
    /// task sleeps `base_delay * 2^attempt` plus up to 50% random jitter,
    /// which prevents synchronized retry storms when many buyers contend
    /// for the same hot event. No sleep happens after the final failed
    /// attempt. Returns `false` if every attempt failed.
    pub async fn acquire_with_retry(&self, event_id: &EventId) -> bool {
        for attempt in 0..=self.max_retries {
            if self.acquire(event_id).await {
                if attempt > 0 {
                    tracing::debug!(event_id = %event_id, attempt, "Event lock acquired after retry");
                }
                return true;
            }

            if attempt < self.max_retries {
                let delay = self.delay_for_attempt(attempt);
                tracing::debug!(
                    event_id = %event_id,
                    attempt,
                    delay_ms = delay.as_millis(),
                    "Event lock held elsewhere, backing off"
                );
                sleep(delay).await;
            }
        }

        tracing::debug!(
            event_id = %event_id,
            attempts = self.max_retries + 1,
            "Event lock not acquired within retry budget"
        );
        false
    }

    /// Release the event's lock unconditionally.
    ///
    /// Must be called on every exit path after a successful acquire.
    /// Release failures are logged and swallowed: the lock TTL is the
    /// safety net, and a failed delete must not turn an otherwise
    /// successful reservation into an error.
    pub async fn release(&self, event_id: &EventId) {
        let key = Self::lock_key(event_id);
        if let Err(error) = self.store.delete(key).await {
            tracing::warn!(event_id = %event_id, error = %error, "Error releasing event lock");
        }
    }

    /// Backoff delay before retry number `attempt + 1`: exponential in the
    /// attempt count, plus uniform jitter in `[0, 50%)` of the delay.
    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let factor = 2u32.saturating_pow(u32::try_from(attempt).unwrap_or(u32::MAX));
        let delay = self.base_delay.saturating_mul(factor);
        let jitter = delay.mul_f64(rand::thread_rng().gen_range(0.0..0.5));
        delay + jitter
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use boxoffice_testing::InMemoryStore;

    fn fast_config() -> ReservationConfig {
        ReservationConfig::builder()
            .lock_base_delay(Duration::from_millis(2))
            .build()
    }

    fn manager(store: &Arc<InMemoryStore>) -> LockManager {
        let store: Arc<dyn EphemeralStore> = Arc::clone(store);
        LockManager::new(store, &fast_config())
    }

    #[test]
    fn backoff_grows_exponentially_with_jitter_bound() {
        let store: Arc<dyn EphemeralStore> = Arc::new(InMemoryStore::new());
        let locks = LockManager::new(
            store,
            &ReservationConfig::builder()
                .lock_base_delay(Duration::from_millis(100))
                .build(),
        );

        for attempt in 0..4 {
            let base = Duration::from_millis(100 * 2u64.pow(attempt));
            let delay = locks.delay_for_attempt(attempt as usize);
            assert!(delay >= base, "attempt {attempt}: {delay:?} < {base:?}");
            assert!(
                delay < base + base.mul_f64(0.5),
                "attempt {attempt}: {delay:?} exceeds jitter bound"
            );
        }
    }

    #[tokio::test]
    async fn acquire_is_exclusive_until_released() {
        let store = Arc::new(InMemoryStore::new());
        let locks = manager(&store);
        let event = EventId::new("evt-1");

        assert!(locks.acquire(&event).await);
        assert!(!locks.acquire(&event).await);

        locks.release(&event).await;
        assert!(locks.acquire(&event).await);
    }

    #[tokio::test]
    async fn locks_for_different_events_are_independent() {
        let store = Arc::new(InMemoryStore::new());
        let locks = manager(&store);

        assert!(locks.acquire(&EventId::new("evt-1")).await);
        assert!(locks.acquire(&EventId::new("evt-2")).await);
    }

    #[tokio::test]
    async fn retry_exhaustion_returns_false() {
        let store = Arc::new(InMemoryStore::new());
        let locks = manager(&store);
        let event = EventId::new("evt-1");

        assert!(locks.acquire(&event).await);
        assert!(!locks.acquire_with_retry(&event).await);
    }

    #[tokio::test]
    async fn retry_succeeds_once_holder_releases() {
        let store = Arc::new(InMemoryStore::new());
        let locks = Arc::new(manager(&store));
        let event = EventId::new("evt-1");

        assert!(locks.acquire(&event).await);

        let background = Arc::clone(&locks);
        let release_event = event.clone();
        let releaser = tokio::spawn(async move {
            sleep(Duration::from_millis(5)).await;
            background.release(&release_event).await;
        });

        assert!(locks.acquire_with_retry(&event).await);
        releaser.await.unwrap();
    }
}

//! In-memory implementations of the engine's store traits.
//!
//! [`InMemoryStore`] honours real TTL semantics against the tokio clock,
//! so tests run with `#[tokio::test(start_paused = true)]` can expire
//! locks and holds by advancing time instead of sleeping. Both fakes count
//! their calls, which lets tests assert that certain rejections happen
//! before any store access.

use boxoffice_core::error::StoreError;
use boxoffice_core::store::EphemeralStore;
use boxoffice_core::tiers::TierSource;
use boxoffice_core::types::{EventId, TicketTier};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Connection("store mutex poisoned".to_string())
}

struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory key/value store with per-key expiry.
///
/// Expiry is lazy: a key past its TTL simply reads as absent, which is
/// indistinguishable from eager eviction through the [`EphemeralStore`]
/// interface. `set_if_absent` treats an expired key as absent, so lock
/// takeover after a stuck holder's TTL behaves like the real store.
#[derive(Default)]
pub struct InMemoryStore {
    entries: Mutex<HashMap<String, StoredValue>>,
    ops: AtomicUsize,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of store operations performed so far.
    pub fn operation_count(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }

    /// Number of live (non-expired) keys, for test assertions.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex was poisoned by a previous test panic.
    #[allow(clippy::expect_used)]
    pub fn live_key_count(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .values()
            .filter(|value| value.live(now))
            .count()
    }
}

impl EphemeralStore for InMemoryStore {
    fn set_if_absent(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let result = self.entries.lock().map_err(poisoned).map(|mut entries| {
            let now = Instant::now();
            if entries.get(&key).is_some_and(|existing| existing.live(now)) {
                false
            } else {
                entries.insert(
                    key,
                    StoredValue {
                        value,
                        expires_at: now + ttl,
                    },
                );
                true
            }
        });
        Box::pin(async move { result })
    }

    fn set(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let result = self.entries.lock().map_err(poisoned).map(|mut entries| {
            entries.insert(
                key,
                StoredValue {
                    value,
                    expires_at: Instant::now() + ttl,
                },
            );
        });
        Box::pin(async move { result })
    }

    fn get(
        &self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, StoreError>> + Send + '_>> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let result = self.entries.lock().map_err(poisoned).map(|entries| {
            let now = Instant::now();
            entries
                .get(&key)
                .filter(|value| value.live(now))
                .map(|value| value.value.clone())
        });
        Box::pin(async move { result })
    }

    fn multi_get(
        &self,
        keys: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Option<String>>, StoreError>> + Send + '_>> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let result = self.entries.lock().map_err(poisoned).map(|entries| {
            let now = Instant::now();
            keys.iter()
                .map(|key| {
                    entries
                        .get(key)
                        .filter(|value| value.live(now))
                        .map(|value| value.value.clone())
                })
                .collect()
        });
        Box::pin(async move { result })
    }

    fn delete(
        &self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let result = self.entries.lock().map_err(poisoned).map(|mut entries| {
            entries.remove(&key);
        });
        Box::pin(async move { result })
    }
}

/// Ephemeral store whose every operation fails, for outage-path tests.
#[derive(Default)]
pub struct FailingStore;

impl FailingStore {
    fn failure() -> StoreError {
        StoreError::Connection("injected store failure".to_string())
    }
}

impl EphemeralStore for FailingStore {
    fn set_if_absent(
        &self,
        _key: String,
        _value: String,
        _ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn set(
        &self,
        _key: String,
        _value: String,
        _ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn get(
        &self,
        _key: String,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, StoreError>> + Send + '_>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn multi_get(
        &self,
        _keys: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Option<String>>, StoreError>> + Send + '_>> {
        Box::pin(async { Err(Self::failure()) })
    }

    fn delete(
        &self,
        _key: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> {
        Box::pin(async { Err(Self::failure()) })
    }
}

/// Mutable in-memory tier source.
///
/// `set_remaining` lets a test simulate durable sales completing between
/// an engine's pre-check and its locked re-read.
#[derive(Default)]
pub struct InMemoryTierSource {
    events: Mutex<HashMap<EventId, Vec<TicketTier>>>,
    ops: AtomicUsize,
}

impl InMemoryTierSource {
    /// Create an empty tier source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an event's tier list.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex was poisoned by a previous test panic.
    #[allow(clippy::expect_used)]
    pub fn insert_event(&self, event_id: EventId, tiers: Vec<TicketTier>) {
        self.events
            .lock()
            .expect("tier source mutex poisoned")
            .insert(event_id, tiers);
    }

    /// Overwrite one tier's durable remaining count. Returns `false` if
    /// the event or tier does not exist.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex was poisoned by a previous test panic.
    #[allow(clippy::expect_used)]
    pub fn set_remaining(&self, event_id: &EventId, tier_index: usize, remaining: u32) -> bool {
        let mut events = self.events.lock().expect("tier source mutex poisoned");
        match events.get_mut(event_id).and_then(|tiers| tiers.get_mut(tier_index)) {
            Some(tier) => {
                tier.remaining = remaining;
                true
            }
            None => false,
        }
    }

    /// Total number of tier lookups performed so far.
    pub fn operation_count(&self) -> usize {
        self.ops.load(Ordering::SeqCst)
    }
}

impl TierSource for InMemoryTierSource {
    fn find_event_tiers(
        &self,
        event_id: EventId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<TicketTier>>, StoreError>> + Send + '_>>
    {
        self.ops.fetch_add(1, Ordering::SeqCst);
        let result = self
            .events
            .lock()
            .map_err(|_| StoreError::Database("tier source mutex poisoned".to_string()))
            .map(|events| events.get(&event_id).cloned());
        Box::pin(async move { result })
    }
}

/// Tier source whose every lookup fails, for outage-path tests.
#[derive(Default)]
pub struct FailingTierSource;

impl TierSource for FailingTierSource {
    fn find_event_tiers(
        &self,
        _event_id: EventId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<TicketTier>>, StoreError>> + Send + '_>>
    {
        Box::pin(async { Err(StoreError::Database("injected database failure".to_string())) })
    }
}

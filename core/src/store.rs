//! Ephemeral key/value store abstraction.
//!
//! This module defines the core abstraction over the external ephemeral
//! store (Redis in production) that backs both the per-event admission
//! locks and the session hold records.
//!
//! # Design
//!
//! The trait is deliberately minimal: exactly the five primitives the
//! engine needs. Every key carries a TTL so all engine state is
//! self-expiring; there is no unbounded key and no scan operation.
//!
//! - Conditional set (`set_if_absent`) is the mutual-exclusion primitive
//!   for locks
//! - Unconditional set with TTL writes hold records and resets their expiry
//! - Multi-get bulk-reads the active holds for an event
//!
//! # Implementations
//!
//! - `RedisStore` (in `boxoffice-redis` crate): production implementation
//! - `InMemoryStore` (in `boxoffice-testing` crate): fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! This trait uses explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` to enable trait object usage (`Arc<dyn EphemeralStore>`).
//! The engine and its collaborators hold the store as an injected trait
//! object so tests can substitute an in-memory fake.

use crate::error::StoreError;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Key/value store with per-key expiry, consumed by the engine.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to be safely shared across the
/// concurrent request-handling tasks that invoke the engine.
///
/// # Atomicity
///
/// `set_if_absent` must be atomic with respect to concurrent calls for the
/// same key: exactly one of several simultaneous callers observes `true`.
/// All other operations only require the store's ordinary per-key
/// atomicity.
pub trait EphemeralStore: Send + Sync {
    /// Set `key` to `value` with the given TTL only if the key does not
    /// currently exist.
    ///
    /// Returns `true` iff this call created the key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the store is unreachable or
    /// the command fails.
    fn set_if_absent(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<bool, StoreError>> + Send + '_>>;

    /// Set `key` to `value` unconditionally, resetting its TTL.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the store is unreachable or
    /// the command fails.
    fn set(
        &self,
        key: String,
        value: String,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Read a single key. Expired or missing keys read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the store is unreachable or
    /// the command fails.
    fn get(
        &self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = Result<Option<String>, StoreError>> + Send + '_>>;

    /// Read many keys in one round trip. The result is positionally
    /// aligned with `keys`; expired or missing keys read as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the store is unreachable or
    /// the command fails.
    fn multi_get(
        &self,
        keys: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Option<String>>, StoreError>> + Send + '_>>;

    /// Delete a key. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the store is unreachable or
    /// the command fails.
    fn delete(
        &self,
        key: String,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}

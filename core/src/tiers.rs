//! Durable tier source abstraction.
//!
//! The system of record owns events and their price tiers; ticket-creation
//! transactions decrement each tier's `remaining` count as sales complete.
//! The engine only ever reads this data. Reads happen twice per
//! reservation: once for the cheap pre-check and once again under the
//! event lock, because durable sales can complete between the two.
//!
//! # Implementations
//!
//! - `PostgresTierSource` (in `boxoffice-postgres` crate): production implementation
//! - `InMemoryTierSource` (in `boxoffice-testing` crate): mutable fixture for tests
//!
//! # Dyn Compatibility
//!
//! Explicit `Pin<Box<dyn Future>>` returns, as in
//! [`EphemeralStore`](crate::store::EphemeralStore), so the engine can hold
//! an `Arc<dyn TierSource>`.

use crate::error::StoreError;
use crate::types::{EventId, TicketTier};
use std::future::Future;
use std::pin::Pin;

/// Read-only view of an event's price tiers in the system of record.
pub trait TierSource: Send + Sync {
    /// Fetch the tier list for an event, ordered by tier index.
    ///
    /// Returns `None` if the event does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the underlying store is
    /// unreachable or the query fails.
    fn find_event_tiers(
        &self,
        event_id: EventId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Vec<TicketTier>>, StoreError>> + Send + '_>>;
}

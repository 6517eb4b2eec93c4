//! The reservation engine.
//!
//! Composes the lock manager, the durable tier source, the availability
//! calculator, and the hold store to admit reservations without ever
//! overselling a tier, even under concurrent requests from many
//! simultaneous buyers.
//!
//! A reservation call moves through: cheap pre-checks with no lock, lock
//! acquisition with bounded backoff, a fresh durable read plus active-hold
//! read under the lock, the admission check, the hold write, and an
//! unconditional lock release. Only the re-read/validate/write section is
//! serialised per event; operations on different events proceed fully in
//! parallel.

use crate::availability::{
    calculate_tier_availability, group_reservations_by_tier, validate_availability,
    validate_batch_inputs, validate_tiers_and_capacities, TierValidation,
};
use crate::clock::{Clock, SystemClock};
use crate::config::ReservationConfig;
use crate::error::ReservationError;
use crate::holds::HoldStore;
use crate::lock::LockManager;
use crate::store::EphemeralStore;
use crate::tiers::TierSource;
use crate::types::{EventId, HoldEntry, ReservationReceipt, SessionId, TicketTier};
use std::sync::Arc;

/// Orchestrates ticket reservations for checkout sessions.
///
/// The engine owns no durable state: tiers live in the system of record
/// (read-only here) and holds live in the ephemeral store with TTL-based
/// lifecycle. Collaborators are injected so tests can run the whole engine
/// against in-memory fakes.
///
/// # Example
///
/// ```no_run
/// use boxoffice_core::{ReservationConfig, ReservationEngine};
/// use boxoffice_core::types::{EventId, HoldEntry, SessionId};
/// # async fn example(
/// #     tiers: std::sync::Arc<dyn boxoffice_core::TierSource>,
/// #     store: std::sync::Arc<dyn boxoffice_core::EphemeralStore>,
/// # ) -> Result<(), boxoffice_core::ReservationError> {
/// let engine = ReservationEngine::new(tiers, store, ReservationConfig::default());
///
/// let receipt = engine
///     .reserve_batch(
///         EventId::new("evt-2025-gala"),
///         SessionId::new("session-cookie"),
///         vec![HoldEntry::new(0, 2), HoldEntry::new(1, 1)],
///     )
///     .await?;
/// println!("held at {}", receipt.created_at);
/// # Ok(())
/// # }
/// ```
pub struct ReservationEngine {
    tier_source: Arc<dyn TierSource>,
    holds: HoldStore,
    locks: LockManager,
    clock: Arc<dyn Clock>,
}

impl ReservationEngine {
    /// Create an engine over the given tier source and ephemeral store,
    /// stamping receipts with the system clock.
    #[must_use]
    pub fn new(
        tier_source: Arc<dyn TierSource>,
        store: Arc<dyn EphemeralStore>,
        config: ReservationConfig,
    ) -> Self {
        Self::with_clock(tier_source, store, config, Arc::new(SystemClock))
    }

    /// Create an engine with an injected clock. Tests use this with a
    /// fixed clock so receipt timestamps are deterministic.
    #[must_use]
    pub fn with_clock(
        tier_source: Arc<dyn TierSource>,
        store: Arc<dyn EphemeralStore>,
        config: ReservationConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tier_source,
            holds: HoldStore::new(Arc::clone(&store), config.hold_ttl),
            locks: LockManager::new(store, &config),
            clock,
        }
    }

    /// Reserve a quantity of a single tier.
    ///
    /// Sugar over [`reserve_batch`](Self::reserve_batch) with a
    /// single-entry request list; semantically identical.
    ///
    /// # Errors
    ///
    /// See [`reserve_batch`](Self::reserve_batch).
    pub async fn reserve_single(
        &self,
        event_id: EventId,
        session_id: SessionId,
        tier_index: usize,
        quantity: u32,
    ) -> Result<ReservationReceipt, ReservationError> {
        self.reserve_batch(event_id, session_id, vec![HoldEntry::new(tier_index, quantity)])
            .await
    }

    /// Atomically reserve a batch of tier quantities for a session.
    ///
    /// On success the session's previous hold (if any) is **replaced** by
    /// `entries` and its TTL restarts; there is no merging. The batch is
    /// all-or-nothing: if any tier fails admission, nothing is written.
    ///
    /// # Errors
    ///
    /// - [`ReservationError::InvalidRequest`]: empty batch or a
    ///   non-positive quantity, rejected before any store access
    /// - [`ReservationError::EventNotFound`] /
    ///   [`ReservationError::TierNotFound`] /
    ///   [`ReservationError::CapacityExceeded`]: structurally impossible
    ///   requests, rejected before the lock is touched
    /// - [`ReservationError::EventBusy`]: the event lock stayed contended
    ///   through the whole retry budget
    /// - [`ReservationError::InsufficientAvailability`]: concurrent holds
    ///   or sales consumed the capacity
    /// - [`ReservationError::Store`]: an external store failed
    pub async fn reserve_batch(
        &self,
        event_id: EventId,
        session_id: SessionId,
        entries: Vec<HoldEntry>,
    ) -> Result<ReservationReceipt, ReservationError> {
        validate_batch_inputs(&entries)?;

        let tiers = self.find_tiers(&event_id).await?;
        let validations = validate_tiers_and_capacities(&entries, &tiers)?;

        if !self.locks.acquire_with_retry(&event_id).await {
            tracing::debug!(event_id = %event_id, "Reservation rejected: event busy");
            return Err(ReservationError::EventBusy);
        }

        // Lock held from here: run the critical section, then release on
        // every path before surfacing its result.
        let admission = self
            .admit_and_write(&event_id, &session_id, &entries, &validations)
            .await;
        self.locks.release(&event_id).await;
        admission?;

        tracing::info!(
            event_id = %event_id,
            session_id = %session_id,
            entries = entries.len(),
            "Reservation accepted"
        );

        Ok(ReservationReceipt {
            session_id,
            created_at: self.clock.now(),
        })
    }

    /// The session's current reservations for an event.
    ///
    /// Read-only and lock-free; feeds UI display, so it only needs the
    /// ephemeral store's own read consistency. Entries are returned as
    /// written: a hold written before the event's tier list was
    /// restructured may reference a tier index that no longer exists, and
    /// is returned verbatim rather than reconciled.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::Store`] if the ephemeral store fails.
    pub async fn reservations_for_session(
        &self,
        event_id: &EventId,
        session_id: &SessionId,
    ) -> Result<Vec<HoldEntry>, ReservationError> {
        let hold = self.holds.hold_for_session(event_id, session_id).await?;
        Ok(hold.map(|h| h.entries).unwrap_or_default())
    }

    /// Drop the session's hold for an event.
    ///
    /// Used after a completed purchase or an explicit cart-clear.
    /// Idempotent, lock-free (it only touches the session's own record),
    /// and infallible from the caller's perspective: cleanup failures are
    /// logged and swallowed, since the hold's TTL will finish the job.
    pub async fn clear_session(&self, event_id: &EventId, session_id: &SessionId) {
        if let Err(error) = self.holds.delete_hold(event_id, session_id).await {
            tracing::warn!(
                event_id = %event_id,
                session_id = %session_id,
                error = %error,
                "Error clearing session reservations"
            );
        }
    }

    /// The critical section: everything that must happen while the event
    /// lock is held. Kept as one fallible unit so the caller has a single
    /// release site covering success and every failure alike.
    async fn admit_and_write(
        &self,
        event_id: &EventId,
        session_id: &SessionId,
        entries: &[HoldEntry],
        validations: &[TierValidation],
    ) -> Result<(), ReservationError> {
        // Durable sales can complete between the pre-check and lock
        // acquisition, so the tier counts are read again here.
        let current_tiers = self.find_tiers(event_id).await?;
        let fresh_remaining = validations
            .iter()
            .map(|validation| {
                current_tiers
                    .get(validation.tier_index)
                    .map(|tier| tier.remaining)
                    .ok_or(ReservationError::TierNotFound {
                        tier_index: validation.tier_index,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let active_holds = self.holds.active_holds(event_id).await?;
        let availability =
            calculate_tier_availability(validations, &fresh_remaining, &active_holds);
        let requested_by_tier = group_reservations_by_tier(entries);

        if let Err(rejection) = validate_availability(&requested_by_tier, &availability) {
            tracing::debug!(
                event_id = %event_id,
                session_id = %session_id,
                rejection = %rejection,
                "Reservation rejected at admission"
            );
            return Err(rejection);
        }

        self.holds
            .write_hold(event_id, session_id, entries)
            .await?;
        Ok(())
    }

    async fn find_tiers(&self, event_id: &EventId) -> Result<Vec<TicketTier>, ReservationError> {
        self.tier_source
            .find_event_tiers(event_id.clone())
            .await?
            .ok_or_else(|| ReservationError::EventNotFound {
                event_id: event_id.clone(),
            })
    }
}

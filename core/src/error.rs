//! Error types for the reservation engine.
//!
//! Two layers are kept distinct: [`ReservationError`] is the business-level
//! taxonomy callers branch on (and the HTTP layer maps to status codes),
//! while [`StoreError`] carries infrastructure failures from the ephemeral
//! store or the durable tier source. Infrastructure failures fold into
//! `ReservationError::Store` so a single error type flows out of the engine,
//! but they stay distinguishable from the expected business outcomes.

use crate::types::EventId;
use thiserror::Error;

/// Errors from the external stores the engine composes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Ephemeral store unreachable or a command failed.
    #[error("Ephemeral store error: {0}")]
    Connection(String),

    /// Durable tier source unreachable or a query failed.
    #[error("Database error: {0}")]
    Database(String),

    /// A stored record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors returned by reservation operations.
///
/// The variants fall into three groups:
///
/// - **Caller errors** (no retry): [`InvalidRequest`], [`EventNotFound`],
///   [`TierNotFound`], [`CapacityExceeded`]
/// - **Transient outcomes** (retry after a delay, or re-query availability):
///   [`EventBusy`], [`InsufficientAvailability`]
/// - **Infrastructure failures**: [`Store`]
///
/// [`InvalidRequest`]: ReservationError::InvalidRequest
/// [`EventNotFound`]: ReservationError::EventNotFound
/// [`TierNotFound`]: ReservationError::TierNotFound
/// [`CapacityExceeded`]: ReservationError::CapacityExceeded
/// [`EventBusy`]: ReservationError::EventBusy
/// [`InsufficientAvailability`]: ReservationError::InsufficientAvailability
/// [`Store`]: ReservationError::Store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationError {
    /// The request was malformed: empty batch or a non-positive quantity.
    #[error("Invalid reservation request: {reason}")]
    InvalidRequest {
        /// What was wrong with the request.
        reason: String,
    },

    /// The event does not exist in the system of record.
    #[error("Event {event_id} does not exist")]
    EventNotFound {
        /// The event that was requested.
        event_id: EventId,
    },

    /// A requested tier index is out of range for the event's tier list.
    #[error("Tier at index {tier_index} does not exist")]
    TierNotFound {
        /// The out-of-range index.
        tier_index: usize,
    },

    /// The requested quantity exceeds the tier's durable remaining count in
    /// isolation. Detected before any lock is taken.
    #[error(
        "Requested quantity ({requested}) exceeds tier remaining tickets ({remaining}) for tier {tier_index}"
    )]
    CapacityExceeded {
        /// The tier that was over-requested.
        tier_index: usize,
        /// The quantity the caller asked for.
        requested: u32,
        /// The tier's durable remaining count.
        remaining: u32,
    },

    /// The event lock could not be acquired within the retry budget. The
    /// backoff already attempted is the system's own mitigation; callers
    /// should retry after a delay.
    #[error("Unable to process the reservation due to high demand, please try again in a moment")]
    EventBusy,

    /// The admission check failed under the lock: concurrent holds or sales
    /// consumed the remaining capacity between the pre-check and now.
    #[error("Only {available} tickets available for tier {tier_index}. Requested: {requested}")]
    InsufficientAvailability {
        /// The oversubscribed tier.
        tier_index: usize,
        /// Tickets actually available to reserve (remaining minus held).
        available: u32,
        /// The quantity the caller asked for.
        requested: u32,
    },

    /// An external store failed. Fatal for the current call; the lock, if
    /// held, has already been released.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ReservationError {
    /// Whether the caller may meaningfully retry the same request.
    ///
    /// True only for the transient outcomes: lock contention and
    /// availability consumed by concurrent activity. Caller errors and
    /// infrastructure failures are not retryable as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EventBusy | Self::InsufficientAvailability { .. }
        )
    }

    /// Whether the failure is the caller's fault (bad input or references
    /// to data that does not exist).
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRequest { .. }
                | Self::EventNotFound { .. }
                | Self::TierNotFound { .. }
                | Self::CapacityExceeded { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_outcomes_are_retryable() {
        assert!(ReservationError::EventBusy.is_retryable());
        assert!(
            ReservationError::InsufficientAvailability {
                tier_index: 0,
                available: 0,
                requested: 1
            }
            .is_retryable()
        );
    }

    #[test]
    fn caller_errors_are_not_retryable() {
        let err = ReservationError::TierNotFound { tier_index: 7 };
        assert!(!err.is_retryable());
        assert!(err.is_caller_error());

        let err = ReservationError::CapacityExceeded {
            tier_index: 1,
            requested: 10,
            remaining: 3,
        };
        assert!(!err.is_retryable());
        assert!(err.is_caller_error());
    }

    #[test]
    fn store_errors_are_neither_retryable_nor_caller_errors() {
        let err = ReservationError::Store(StoreError::Connection("refused".to_string()));
        assert!(!err.is_retryable());
        assert!(!err.is_caller_error());
    }

    #[test]
    fn insufficient_availability_display() {
        let err = ReservationError::InsufficientAvailability {
            tier_index: 2,
            available: 1,
            requested: 4,
        };
        assert_eq!(
            err.to_string(),
            "Only 1 tickets available for tier 2. Requested: 4"
        );
    }
}

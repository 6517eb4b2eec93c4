//! Availability accounting.
//!
//! Pure functions combining durable `remaining` counts with the sum of
//! currently-active ephemeral holds to produce true available-to-reserve
//! counts per tier. Deliberately free of I/O so every admission rule can
//! be unit-tested with literal fixtures, independent of any store.

use crate::error::ReservationError;
use crate::types::{Hold, HoldEntry, TicketTier};
use std::collections::{BTreeMap, HashMap};

/// A requested tier confirmed to exist, with its durable remaining count
/// at pre-check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierValidation {
    /// Ordinal index of the tier.
    pub tier_index: usize,
    /// Durable remaining count when the request was pre-checked.
    pub remaining: u32,
}

/// Per-tier availability as computed under the event lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierAvailability {
    /// Durable remaining count from the fresh re-read.
    pub remaining: u32,
    /// Sum of quantities across all active holds for this tier.
    pub reserved: u32,
}

impl TierAvailability {
    /// Tickets actually open to a new hold.
    #[must_use]
    pub const fn available(&self) -> u32 {
        self.remaining.saturating_sub(self.reserved)
    }
}

/// Reject structurally invalid batches: empty request lists and
/// non-positive quantities.
///
/// Runs before any store access.
///
/// # Errors
///
/// Returns [`ReservationError::InvalidRequest`] for an empty batch or any
/// entry with quantity zero.
pub fn validate_batch_inputs(entries: &[HoldEntry]) -> Result<(), ReservationError> {
    if entries.is_empty() {
        return Err(ReservationError::InvalidRequest {
            reason: "at least one reservation is required".to_string(),
        });
    }

    for entry in entries {
        if entry.quantity == 0 {
            return Err(ReservationError::InvalidRequest {
                reason: "requested quantity must be greater than 0".to_string(),
            });
        }
    }

    Ok(())
}

/// Check every requested tier exists and its quantity fits within the
/// tier's durable capacity in isolation.
///
/// This is the cheap early rejection performed before acquiring any lock:
/// a request that exceeds a tier's total remaining count can never be
/// admitted, no matter what the active holds look like.
///
/// # Errors
///
/// Returns [`ReservationError::TierNotFound`] for an out-of-range index
/// and [`ReservationError::CapacityExceeded`] when a single entry's
/// quantity exceeds the tier's durable remaining count.
pub fn validate_tiers_and_capacities(
    entries: &[HoldEntry],
    tiers: &[TicketTier],
) -> Result<Vec<TierValidation>, ReservationError> {
    let mut validations = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(tier) = tiers.get(entry.tier_index) else {
            return Err(ReservationError::TierNotFound {
                tier_index: entry.tier_index,
            });
        };

        if entry.quantity > tier.remaining {
            return Err(ReservationError::CapacityExceeded {
                tier_index: entry.tier_index,
                requested: entry.quantity,
                remaining: tier.remaining,
            });
        }

        validations.push(TierValidation {
            tier_index: entry.tier_index,
            remaining: tier.remaining,
        });
    }

    Ok(validations)
}

/// Pair each validated tier with its freshly re-read durable remaining
/// count and the total quantity currently held for it.
///
/// `fresh_remaining` is positionally aligned with `validations` and comes
/// from the durable re-read performed under the event lock. Hold entries
/// referencing tiers outside the validated set are ignored here; they
/// belong to other admission decisions.
#[must_use]
pub fn calculate_tier_availability(
    validations: &[TierValidation],
    fresh_remaining: &[u32],
    active_holds: &[Hold],
) -> HashMap<usize, TierAvailability> {
    let mut availability = HashMap::with_capacity(validations.len());

    for (validation, &remaining) in validations.iter().zip(fresh_remaining) {
        let reserved = active_holds
            .iter()
            .flat_map(|hold| hold.entries.iter())
            .filter(|entry| entry.tier_index == validation.tier_index)
            .fold(0u32, |sum, entry| sum.saturating_add(entry.quantity));

        availability.insert(
            validation.tier_index,
            TierAvailability {
                remaining,
                reserved,
            },
        );
    }

    availability
}

/// Collapse a batch that may name the same tier more than once into a
/// per-tier demand total.
///
/// The result is ordered by tier index so the first-violation rule of
/// [`validate_availability`] is deterministic.
#[must_use]
pub fn group_reservations_by_tier(entries: &[HoldEntry]) -> BTreeMap<usize, u32> {
    let mut requested_by_tier = BTreeMap::new();

    for entry in entries {
        let total: &mut u32 = requested_by_tier.entry(entry.tier_index).or_default();
        *total = total.saturating_add(entry.quantity);
    }

    requested_by_tier
}

/// The authoritative admission check, run under the event lock.
///
/// For each tier the grouped demand must not exceed
/// `remaining - reserved`. Fails on the first violating tier (lowest
/// index first).
///
/// # Errors
///
/// Returns [`ReservationError::InsufficientAvailability`] for the first
/// oversubscribed tier, or [`ReservationError::TierNotFound`] if a
/// requested tier has no availability record (the tier list shrank
/// between the pre-check and the locked re-read).
pub fn validate_availability(
    requested_by_tier: &BTreeMap<usize, u32>,
    tier_availability: &HashMap<usize, TierAvailability>,
) -> Result<(), ReservationError> {
    for (&tier_index, &requested) in requested_by_tier {
        let Some(availability) = tier_availability.get(&tier_index) else {
            return Err(ReservationError::TierNotFound { tier_index });
        };

        let available = availability.available();
        if requested > available {
            return Err(ReservationError::InsufficientAvailability {
                tier_index,
                available,
                requested,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::SessionId;
    use proptest::prelude::*;

    fn tier(name: &str, remaining: u32) -> TicketTier {
        TicketTier {
            name: name.to_string(),
            price_cents: 5_000,
            remaining,
        }
    }

    fn hold(session: &str, entries: Vec<HoldEntry>) -> Hold {
        Hold {
            session_id: SessionId::new(session),
            entries,
        }
    }

    #[test]
    fn empty_batch_is_invalid() {
        let err = validate_batch_inputs(&[]).unwrap_err();
        assert!(matches!(err, ReservationError::InvalidRequest { .. }));
    }

    #[test]
    fn zero_quantity_is_invalid() {
        let entries = [HoldEntry::new(0, 2), HoldEntry::new(1, 0)];
        let err = validate_batch_inputs(&entries).unwrap_err();
        assert!(matches!(err, ReservationError::InvalidRequest { .. }));
    }

    #[test]
    fn out_of_range_tier_is_not_found() {
        let tiers = vec![tier("GA", 10), tier("VIP", 5), tier("Balcony", 3)];
        let err =
            validate_tiers_and_capacities(&[HoldEntry::new(7, 1)], &tiers).unwrap_err();
        assert_eq!(err, ReservationError::TierNotFound { tier_index: 7 });
    }

    #[test]
    fn quantity_beyond_durable_remaining_is_capacity_exceeded() {
        let tiers = vec![tier("GA", 10)];
        let err =
            validate_tiers_and_capacities(&[HoldEntry::new(0, 11)], &tiers).unwrap_err();
        assert_eq!(
            err,
            ReservationError::CapacityExceeded {
                tier_index: 0,
                requested: 11,
                remaining: 10
            }
        );
    }

    #[test]
    fn validations_capture_pre_check_remaining() {
        let tiers = vec![tier("GA", 10), tier("VIP", 5)];
        let entries = [HoldEntry::new(1, 2), HoldEntry::new(0, 3)];
        let validations = validate_tiers_and_capacities(&entries, &tiers).unwrap();
        assert_eq!(
            validations,
            vec![
                TierValidation {
                    tier_index: 1,
                    remaining: 5
                },
                TierValidation {
                    tier_index: 0,
                    remaining: 10
                },
            ]
        );
    }

    #[test]
    fn availability_sums_holds_per_tier() {
        let validations = [
            TierValidation {
                tier_index: 0,
                remaining: 10,
            },
            TierValidation {
                tier_index: 1,
                remaining: 5,
            },
        ];
        let holds = [
            hold("s-1", vec![HoldEntry::new(0, 2), HoldEntry::new(1, 1)]),
            hold("s-2", vec![HoldEntry::new(0, 3)]),
            hold("s-3", vec![HoldEntry::new(2, 4)]),
        ];

        let availability = calculate_tier_availability(&validations, &[10, 5], &holds);

        assert_eq!(
            availability[&0],
            TierAvailability {
                remaining: 10,
                reserved: 5
            }
        );
        assert_eq!(
            availability[&1],
            TierAvailability {
                remaining: 5,
                reserved: 1
            }
        );
        assert!(!availability.contains_key(&2));
    }

    #[test]
    fn grouping_collapses_duplicate_tiers() {
        let entries = [
            HoldEntry::new(1, 2),
            HoldEntry::new(0, 1),
            HoldEntry::new(1, 3),
        ];
        let grouped = group_reservations_by_tier(&entries);
        assert_eq!(grouped.get(&0), Some(&1));
        assert_eq!(grouped.get(&1), Some(&5));
    }

    #[test]
    fn admission_fails_on_lowest_violating_tier_first() {
        let mut requested = BTreeMap::new();
        requested.insert(0, 6u32);
        requested.insert(1, 6u32);

        let mut availability = HashMap::new();
        availability.insert(
            0,
            TierAvailability {
                remaining: 10,
                reserved: 5,
            },
        );
        availability.insert(
            1,
            TierAvailability {
                remaining: 5,
                reserved: 0,
            },
        );

        let err = validate_availability(&requested, &availability).unwrap_err();
        assert_eq!(
            err,
            ReservationError::InsufficientAvailability {
                tier_index: 0,
                available: 5,
                requested: 6
            }
        );
    }

    #[test]
    fn admission_allows_exact_fit() {
        let mut requested = BTreeMap::new();
        requested.insert(0, 5u32);

        let mut availability = HashMap::new();
        availability.insert(
            0,
            TierAvailability {
                remaining: 10,
                reserved: 5,
            },
        );

        assert!(validate_availability(&requested, &availability).is_ok());
    }

    #[test]
    fn missing_availability_record_is_tier_not_found() {
        let mut requested = BTreeMap::new();
        requested.insert(3, 1u32);

        let err = validate_availability(&requested, &HashMap::new()).unwrap_err();
        assert_eq!(err, ReservationError::TierNotFound { tier_index: 3 });
    }

    proptest! {
        /// Whatever the mix of holds and demand, an admitted request never
        /// pushes (held + requested) past the durable remaining count.
        #[test]
        fn admitted_demand_never_exceeds_remaining(
            remaining in 0u32..500,
            held in proptest::collection::vec(0u32..50, 0..8),
            requested in 1u32..200,
        ) {
            let validations = [TierValidation { tier_index: 0, remaining }];
            let holds: Vec<Hold> = held
                .iter()
                .enumerate()
                .map(|(i, &quantity)| hold(&format!("s-{i}"), vec![HoldEntry::new(0, quantity)]))
                .collect();

            let availability = calculate_tier_availability(&validations, &[remaining], &holds);
            let grouped = group_reservations_by_tier(&[HoldEntry::new(0, requested)]);
            let reserved: u32 = held.iter().sum();

            match validate_availability(&grouped, &availability) {
                Ok(()) => prop_assert!(reserved + requested <= remaining),
                Err(ReservationError::InsufficientAvailability { available, .. }) => {
                    prop_assert_eq!(available, remaining.saturating_sub(reserved));
                    prop_assert!(requested > available);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
        }
    }
}

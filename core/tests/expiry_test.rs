//! TTL lifecycle tests.
//!
//! Runs the engine under tokio's paused clock so hold and lock expiry can
//! be exercised by advancing time instead of sleeping through real TTLs.
//!
//! Run with: `cargo test --test expiry_test`

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use boxoffice_core::lock::LockManager;
use boxoffice_core::store::EphemeralStore;
use boxoffice_core::tiers::TierSource;
use boxoffice_core::types::{EventId, SessionId, TicketTier};
use boxoffice_core::{ReservationConfig, ReservationEngine};
use boxoffice_testing::{test_clock, InMemoryStore, InMemoryTierSource};
use std::sync::Arc;
use std::time::Duration;

fn fixture(remaining: u32) -> (Arc<InMemoryStore>, ReservationEngine, EventId) {
    let event = EventId::new("evt-1");
    let tiers = Arc::new(InMemoryTierSource::new());
    tiers.insert_event(
        event.clone(),
        vec![TicketTier {
            name: "General Admission".to_string(),
            price_cents: 5_000,
            remaining,
        }],
    );

    let store = Arc::new(InMemoryStore::new());
    let engine = ReservationEngine::with_clock(
        tiers as Arc<dyn TierSource>,
        Arc::clone(&store) as Arc<dyn EphemeralStore>,
        ReservationConfig::default(),
        Arc::new(test_clock()),
    );

    (store, engine, event)
}

#[tokio::test(start_paused = true)]
async fn expired_holds_stop_counting_against_availability() {
    let (_, engine, event) = fixture(5);

    engine
        .reserve_single(event.clone(), SessionId::new("s-1"), 0, 5)
        .await
        .unwrap();

    // While the hold is live the tier is exhausted.
    assert!(
        engine
            .reserve_single(event.clone(), SessionId::new("s-2"), 0, 5)
            .await
            .is_err()
    );

    // Past the 20-minute hold TTL the abandoned cart releases its claim.
    tokio::time::advance(Duration::from_secs(20 * 60 + 1)).await;

    engine
        .reserve_single(event.clone(), SessionId::new("s-2"), 0, 5)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn a_hold_rewrite_restarts_its_ttl() {
    let (_, engine, event) = fixture(5);

    engine
        .reserve_single(event.clone(), SessionId::new("s-1"), 0, 2)
        .await
        .unwrap();

    // Ten minutes in, the buyer updates the cart; the clock restarts.
    // The old two-ticket hold still counts against the rewrite itself,
    // so the replacement can claim at most the three that remain free.
    tokio::time::advance(Duration::from_secs(10 * 60)).await;
    engine
        .reserve_single(event.clone(), SessionId::new("s-1"), 0, 3)
        .await
        .unwrap();

    // Fifteen further minutes is past the original deadline but inside
    // the refreshed one, so the hold still counts.
    tokio::time::advance(Duration::from_secs(15 * 60)).await;
    let err = engine
        .reserve_single(event.clone(), SessionId::new("s-2"), 0, 3)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        boxoffice_core::ReservationError::InsufficientAvailability {
            tier_index: 0,
            available: 2,
            requested: 3
        }
    );
}

#[tokio::test(start_paused = true)]
async fn stuck_lock_holder_is_evicted_by_ttl() {
    let (store, engine, event) = fixture(5);

    // Simulate a holder that acquired the lock and then died without
    // releasing: take the lock directly, never release it.
    let locks = LockManager::new(
        Arc::clone(&store) as Arc<dyn EphemeralStore>,
        &ReservationConfig::default(),
    );
    assert!(locks.acquire(&event).await);

    // Within the lock TTL every caller exhausts its retry budget.
    let err = engine
        .reserve_single(event.clone(), SessionId::new("s-1"), 0, 1)
        .await
        .unwrap_err();
    assert_eq!(err, boxoffice_core::ReservationError::EventBusy);

    // Once the 30-second TTL elapses the key expires and the event is
    // acquirable again, with no explicit release anywhere.
    tokio::time::advance(Duration::from_secs(31)).await;
    engine
        .reserve_single(event.clone(), SessionId::new("s-1"), 0, 1)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn lock_ttl_allows_direct_reacquisition() {
    let (store, _, event) = fixture(5);
    let locks = LockManager::new(
        Arc::clone(&store) as Arc<dyn EphemeralStore>,
        &ReservationConfig::default(),
    );

    assert!(locks.acquire(&event).await);
    assert!(!locks.acquire(&event).await);

    tokio::time::advance(Duration::from_secs(31)).await;
    assert!(locks.acquire(&event).await);
}

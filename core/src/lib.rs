//! # Boxoffice Core
//!
//! The ticket reservation engine for an event-ticketing backend: a
//! temporary claim ("hold") on a limited pool of tickets per price tier is
//! taken while a buyer completes checkout, without ever overselling a tier
//! under concurrent requests.
//!
//! ## Core Concepts
//!
//! - **Tier**: a price category within an event, with a durable
//!   `remaining` count owned by the system of record
//! - **Hold**: a session-scoped, expiring claim on quantities of one or
//!   more tiers ("the session's current cart")
//! - **Lock**: per-event mutual exclusion over admission decisions, built
//!   on the ephemeral store's conditional-set primitive
//! - **Admission check**: `durable remaining - currently held` validated
//!   under the lock at the moment a hold is written
//!
//! ## Architecture Principles
//!
//! - The engine owns no storage: durable tiers and ephemeral holds/locks
//!   are external systems reached through the [`TierSource`] and
//!   [`EphemeralStore`] traits
//! - Collaborators are injected (constructor-provided trait objects), so
//!   the whole engine runs against in-memory fakes in tests
//! - Availability math is pure functions, unit-testable with literal
//!   fixtures
//! - Expected business outcomes (`EventBusy`, `InsufficientAvailability`)
//!   are distinct error kinds, not exceptional control flow
//!
//! ## Example
//!
//! ```ignore
//! use boxoffice_core::{ReservationConfig, ReservationEngine};
//! use boxoffice_core::types::{EventId, SessionId};
//!
//! let engine = ReservationEngine::new(tier_source, ephemeral_store, ReservationConfig::default());
//!
//! // Hold two General Admission tickets for this checkout session.
//! let receipt = engine
//!     .reserve_single(EventId::new("evt-1"), SessionId::new("sess-1"), 0, 2)
//!     .await?;
//! ```

pub mod availability;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod holds;
pub mod lock;
pub mod store;
pub mod tiers;
pub mod types;

pub use clock::{Clock, SystemClock};
pub use config::ReservationConfig;
pub use engine::ReservationEngine;
pub use error::{ReservationError, StoreError};
pub use store::EphemeralStore;
pub use tiers::TierSource;

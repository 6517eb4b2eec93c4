//! Identifier and record types shared across the reservation engine.
//!
//! This module defines strong types for event and buyer-session identity,
//! the durable tier snapshot read from the system of record, and the
//! ephemeral hold records the engine writes while a checkout is in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for [`EventId`] parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid event ID: {0}")]
pub struct ParseEventIdError(String);

/// Unique identifier for a ticketed event.
///
/// # Design
///
/// `EventId` is a newtype wrapper around `String` that provides:
/// - Type safety (can't accidentally swap an event ID for a session ID)
/// - Clear intent in function signatures
/// - Serialization support for storage keys
///
/// # Validation
///
/// - `FromStr::from_str()`: Validates input (rejects empty strings)
/// - `From::from()` and `new()`: No validation (for internal use with trusted input)
///
/// Use `FromStr` when parsing external/user input. Use `new()` or `From` when
/// constructing event IDs from application-controlled data.
///
/// # Examples
///
/// ```
/// use boxoffice_core::types::EventId;
///
/// let event_id = EventId::new("evt-2025-gala");
/// assert_eq!(event_id.as_str(), "evt-2025-gala");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    /// Create a new `EventId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the event ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the `EventId` into its inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = ParseEventIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseEventIdError("Event ID cannot be empty".to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier for a buyer session (the checkout cookie).
///
/// A session holds at most one active [`Hold`] per event; the session ID is
/// the reservation handle returned to callers, there is no separate
/// reservation ID.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new `SessionId` from a string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the session ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A price tier within an event, as recorded by the system of record.
///
/// Tier identity is ordinal: a tier is addressed by its position in the
/// event's tier list. `remaining` is capacity minus permanently sold tickets
/// as of the last durable write; it does not account for in-flight holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTier {
    /// Display name, e.g. "General Admission".
    pub name: String,
    /// Ticket price in minor currency units.
    pub price_cents: i64,
    /// Capacity minus permanently sold tickets.
    pub remaining: u32,
}

/// One line of a reservation request or of a stored hold: a quantity
/// against a tier, addressed by ordinal index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldEntry {
    /// Ordinal position of the tier within the event's tier list.
    pub tier_index: usize,
    /// Number of tickets claimed.
    pub quantity: u32,
}

impl HoldEntry {
    /// Create a new entry.
    #[must_use]
    pub const fn new(tier_index: usize, quantity: u32) -> Self {
        Self {
            tier_index,
            quantity,
        }
    }
}

/// A session's active cart for one event: the full set of tier claims the
/// session currently holds. One hold exists per (event, session); writing a
/// new one replaces the previous one entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    /// The owning buyer session.
    pub session_id: SessionId,
    /// The claimed (tier, quantity) pairs, in request order.
    pub entries: Vec<HoldEntry>,
}

/// Returned by a successful reservation.
///
/// The session ID doubles as the reservation handle, and `created_at` is
/// the server-side timestamp clients use to synchronise their countdown
/// timers with the hold's expiry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationReceipt {
    /// The session whose hold was written.
    pub session_id: SessionId,
    /// Server time at which the hold was accepted.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_round_trip() {
        let id = EventId::new("evt-1");
        assert_eq!(id.as_str(), "evt-1");
        assert_eq!(id.to_string(), "evt-1");
        assert_eq!(id.clone().into_inner(), "evt-1");
    }

    #[test]
    fn event_id_rejects_empty_on_parse() {
        assert!("".parse::<EventId>().is_err());
        assert!("evt-1".parse::<EventId>().is_ok());
    }

    #[test]
    fn hold_entry_serializes_as_json_object() {
        let entry = HoldEntry::new(2, 4);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        assert_eq!(json, r#"{"tier_index":2,"quantity":4}"#);
    }

    #[test]
    fn session_ids_compare_by_value() {
        assert_eq!(SessionId::from("s-1"), SessionId::new("s-1"));
        assert_ne!(SessionId::from("s-1"), SessionId::new("s-2"));
    }
}

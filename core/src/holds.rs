//! Session-scoped hold records.
//!
//! One ephemeral record exists per (event, session): a JSON array of
//! (tier, quantity) entries, expiring after the configured hold TTL. The
//! record is the session's cart, not a list of discrete reservations, and
//! writing it replaces whatever was there before.
//!
//! # Indexing
//!
//! The ephemeral store has no scan operation, so active holds are found
//! through a per-event index record listing the session IDs that have
//! written a hold recently. The index is only written on the hold-write
//! path, which runs under the event lock, and its TTL is refreshed to the
//! hold TTL alongside every hold write. Every hold therefore expires no
//! later than the index written with it, so the index can never vanish
//! while a live hold exists. Entries for sessions whose holds have since
//! expired or been deleted resolve to nothing on the bulk read and are
//! skipped; they age out when the index key itself expires.

use crate::error::StoreError;
use crate::store::EphemeralStore;
use crate::types::{EventId, Hold, HoldEntry, SessionId};
use std::sync::Arc;
use std::time::Duration;

const HOLD_KEY_PREFIX: &str = "reservation:event:";
const INDEX_KEY_PREFIX: &str = "reservations:event:";

/// Reads and writes the ephemeral hold records for buyer sessions.
///
/// [`write_hold`](Self::write_hold) is the sole mutation point for hold
/// records and must only be called while the caller holds the event's
/// admission lock. Reads and deletes are scoped to a single session's own
/// key and are safe without the lock.
pub struct HoldStore {
    store: Arc<dyn EphemeralStore>,
    hold_ttl: Duration,
}

impl HoldStore {
    /// Create a hold store over the given ephemeral store.
    #[must_use]
    pub const fn new(store: Arc<dyn EphemeralStore>, hold_ttl: Duration) -> Self {
        Self { store, hold_ttl }
    }

    fn hold_key(event_id: &EventId, session_id: &SessionId) -> String {
        format!("{HOLD_KEY_PREFIX}{event_id}:{session_id}")
    }

    fn index_key(event_id: &EventId) -> String {
        format!("{INDEX_KEY_PREFIX}{event_id}")
    }

    /// All currently non-expired holds for the event.
    ///
    /// Bulk-reads every session key named by the event's index in one
    /// round trip. Index entries whose holds have expired are skipped.
    ///
    /// # Errors
    ///
    /// Propagates store failures; a hold record that fails to decode is an
    /// error rather than silently invisible, since an invisible hold would
    /// let admission oversell its tier.
    pub async fn active_holds(&self, event_id: &EventId) -> Result<Vec<Hold>, StoreError> {
        let sessions = self.indexed_sessions(event_id).await?;
        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let keys = sessions
            .iter()
            .map(|session_id| Self::hold_key(event_id, session_id))
            .collect();
        let values = self.store.multi_get(keys).await?;

        let mut holds = Vec::with_capacity(values.len());
        for (session_id, value) in sessions.into_iter().zip(values) {
            let Some(raw) = value else { continue };
            let entries = decode_entries(&raw)?;
            holds.push(Hold {
                session_id,
                entries,
            });
        }

        Ok(holds)
    }

    /// The session's current hold, if it has one.
    ///
    /// # Errors
    ///
    /// Propagates store failures and decode failures.
    pub async fn hold_for_session(
        &self,
        event_id: &EventId,
        session_id: &SessionId,
    ) -> Result<Option<Hold>, StoreError> {
        let raw = self.store.get(Self::hold_key(event_id, session_id)).await?;
        match raw {
            None => Ok(None),
            Some(raw) => Ok(Some(Hold {
                session_id: session_id.clone(),
                entries: decode_entries(&raw)?,
            })),
        }
    }

    /// Create or replace the session's hold with `entries`, resetting its
    /// TTL to the full hold lifetime.
    ///
    /// Must only be called while the caller holds the event's admission
    /// lock. The session is registered in the event index before the
    /// record itself is written: a failure between the two leaves a stale
    /// index entry (harmless), never a hold the index cannot see.
    ///
    /// # Errors
    ///
    /// Propagates store failures and encode failures.
    pub async fn write_hold(
        &self,
        event_id: &EventId,
        session_id: &SessionId,
        entries: &[HoldEntry],
    ) -> Result<(), StoreError> {
        self.register_session(event_id, session_id).await?;

        let encoded = serde_json::to_string(entries)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store
            .set(Self::hold_key(event_id, session_id), encoded, self.hold_ttl)
            .await
    }

    /// Delete the session's hold. Idempotent; deleting a hold that does
    /// not exist is not an error. The index entry is left to age out.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn delete_hold(
        &self,
        event_id: &EventId,
        session_id: &SessionId,
    ) -> Result<(), StoreError> {
        self.store
            .delete(Self::hold_key(event_id, session_id))
            .await
    }

    async fn indexed_sessions(&self, event_id: &EventId) -> Result<Vec<SessionId>, StoreError> {
        let raw = self.store.get(Self::index_key(event_id)).await?;
        match raw {
            None => Ok(Vec::new()),
            Some(raw) => {
                let ids: Vec<String> = serde_json::from_str(&raw)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(ids.into_iter().map(SessionId::from).collect())
            }
        }
    }

    async fn register_session(
        &self,
        event_id: &EventId,
        session_id: &SessionId,
    ) -> Result<(), StoreError> {
        let mut sessions = self.indexed_sessions(event_id).await?;
        if !sessions.contains(session_id) {
            sessions.push(session_id.clone());
        }

        let ids: Vec<&str> = sessions.iter().map(SessionId::as_str).collect();
        let encoded = serde_json::to_string(&ids)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.store
            .set(Self::index_key(event_id), encoded, self.hold_ttl)
            .await
    }
}

fn decode_entries(raw: &str) -> Result<Vec<HoldEntry>, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Serialization(e.to_string()))
}

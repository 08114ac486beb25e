//! Persistence port.
//!
//! Durable create/read/update of session, roster, and message records. The
//! engine is the only writer of durable records during an active run; reads
//! by outer API layers may happen concurrently (last write wins). All
//! operations are assumed atomic and immediately consistent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roundtable_domain::{Message, MessageDraft, Participant, SessionId, SessionRecord};
use thiserror::Error;

/// Errors surfaced by storage adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session {0} not found")]
    NotFound(SessionId),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Partial update applied to a durable session record.
///
/// Only the fields the engine writes; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub current_round: Option<u32>,
    pub is_completed: Option<bool>,
    pub consensus_reached: Option<bool>,
    pub consensus_percentage: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionPatch {
    /// The patch Finalize writes: completion flags, the final round count,
    /// and the authoritative consensus value.
    pub fn completed(current_round: u32, consensus_percentage: f64, at: DateTime<Utc>) -> Self {
        Self {
            current_round: Some(current_round),
            is_completed: Some(true),
            consensus_reached: Some(true),
            consensus_percentage: Some(consensus_percentage),
            completed_at: Some(at),
        }
    }

    /// Apply this patch to a record in place.
    pub fn apply(&self, record: &mut SessionRecord) {
        if let Some(round) = self.current_round {
            record.current_round = round;
        }
        if let Some(completed) = self.is_completed {
            record.is_completed = completed;
        }
        if let Some(reached) = self.consensus_reached {
            record.consensus_reached = reached;
        }
        if let Some(pct) = self.consensus_percentage {
            record.consensus_percentage = pct;
        }
        if let Some(at) = self.completed_at {
            record.completed_at = Some(at);
        }
    }
}

/// Port for durable session/roster/message storage.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the durable session record.
    async fn load_session(&self, id: &SessionId) -> Result<SessionRecord, StoreError>;

    /// Load the session's participant roster in persisted speaking order.
    async fn load_roster(&self, id: &SessionId) -> Result<Vec<Participant>, StoreError>;

    /// Persist a new message; the store assigns id and creation time.
    async fn create_message(&self, draft: MessageDraft) -> Result<Message, StoreError>;

    /// Apply a partial update to the session record.
    async fn update_session(&self, id: &SessionId, patch: SessionPatch) -> Result<(), StoreError>;
}

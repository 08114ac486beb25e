//! Event sink port and the session event vocabulary.
//!
//! The engine narrates a session's lifecycle through typed events published
//! to a per-session topic. `publish` is intentionally synchronous and
//! infallible from the engine's view: transport failures are a subscriber
//! concern and must be absorbed inside adapters, never propagated into the
//! round loop.

use roundtable_domain::{Message, ParticipantId, SessionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Status carried by a round update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Started,
}

/// Lifecycle events emitted by the engine, in strict per-session order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A message was persisted (persistence always precedes this event).
    NewMessage { message: Message },
    /// A new round began.
    RoundUpdate {
        current_round: u32,
        max_rounds: u32,
        status: RoundStatus,
    },
    /// A participant's generation is in flight.
    ParticipantTyping {
        participant_id: ParticipantId,
        name: String,
    },
    /// The generation finished, successfully or not.
    ParticipantStoppedTyping {
        participant_id: ParticipantId,
        name: String,
    },
    /// The running consensus heuristic moved.
    ConsensusUpdate {
        percentage: f64,
        current_round: u32,
        total_messages: usize,
    },
    /// The session finalized; strictly the last event of a run.
    SessionCompleted {
        summary: String,
        total_rounds: u32,
        total_messages: usize,
        consensus_percentage: f64,
    },
}

impl SessionEvent {
    /// Stable tag for logs and filtering.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::NewMessage { .. } => "new_message",
            SessionEvent::RoundUpdate { .. } => "round_update",
            SessionEvent::ParticipantTyping { .. } => "participant_typing",
            SessionEvent::ParticipantStoppedTyping { .. } => "participant_stopped_typing",
            SessionEvent::ConsensusUpdate { .. } => "consensus_update",
            SessionEvent::SessionCompleted { .. } => "session_completed",
        }
    }
}

/// Port for broadcasting session events to observers.
///
/// Delivery is best-effort and order-preserving per session. Implementations
/// must isolate per-subscriber failures.
pub trait EventSink: Send + Sync {
    fn publish(&self, session_id: &SessionId, event: SessionEvent);
}

/// No-op implementation for tests and headless runs.
pub struct NoEventSink;

impl EventSink for NoEventSink {
    fn publish(&self, _session_id: &SessionId, _event: SessionEvent) {}
}

/// Fans every event out to several sinks in order.
///
/// Used to run the broadcast channel and the JSONL event log side by side.
pub struct CompositeEventSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl CompositeEventSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }
}

impl EventSink for CompositeEventSink {
    fn publish(&self, session_id: &SessionId, event: SessionEvent) {
        for sink in &self.sinks {
            sink.publish(session_id, event.clone());
        }
    }
}

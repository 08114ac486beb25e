//! Broadcast fan-out event sink.
//!
//! One `tokio::sync::broadcast` channel per session topic. Publishing is
//! synchronous and never fails from the engine's view: a topic with no live
//! subscribers drops the event, and a lagging subscriber loses only its own
//! backlog (`RecvError::Lagged`) without affecting other subscribers or the
//! sender.

use roundtable_application::{EventSink, SessionEvent};
use roundtable_domain::SessionId;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::trace;

const DEFAULT_CAPACITY: usize = 256;

/// Per-session broadcast channels for live observers.
pub struct BroadcastEventSink {
    topics: Mutex<HashMap<SessionId, broadcast::Sender<SessionEvent>>>,
    capacity: usize,
}

impl BroadcastEventSink {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// `capacity` is the per-topic backlog; slow subscribers past it observe
    /// a lag error and continue from the oldest retained event.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    /// Subscribe to a session's events, creating the topic on first use.
    pub fn subscribe(&self, session_id: &SessionId) -> broadcast::Receiver<SessionEvent> {
        let mut topics = self.topics.lock().unwrap();
        topics
            .entry(session_id.clone())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of live subscribers on a session topic.
    pub fn subscriber_count(&self, session_id: &SessionId) -> usize {
        self.topics
            .lock()
            .unwrap()
            .get(session_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for BroadcastEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastEventSink {
    fn publish(&self, session_id: &SessionId, event: SessionEvent) {
        let mut topics = self.topics.lock().unwrap();
        let Some(tx) = topics.get(session_id) else {
            trace!(session = %session_id, kind = event.kind(), "no topic, dropping event");
            return;
        };
        if tx.send(event).is_err() {
            // All receivers are gone; drop the topic so an idle session
            // doesn't pin its channel forever.
            trace!(session = %session_id, "last subscriber gone, removing topic");
            topics.remove(session_id);
        }
    }
}

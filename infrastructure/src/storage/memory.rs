//! In-memory session store.
//!
//! Implements the persistence port with plain process memory: good enough
//! for the CLI demo and tests, and the reference for what a database-backed
//! adapter must guarantee: message listing order is creation order, and
//! every operation is atomic from the engine's perspective.

use async_trait::async_trait;
use chrono::Utc;
use roundtable_application::{SessionPatch, SessionStore, StoreError};
use roundtable_domain::{Message, MessageDraft, MessageId, Participant, SessionId, SessionRecord};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-memory implementation of [`SessionStore`].
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, SessionRecord>>,
    rosters: Mutex<HashMap<SessionId, Vec<Participant>>>,
    /// All messages across sessions, in creation order.
    messages: Mutex<Vec<Message>>,
    next_message_id: AtomicU64,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            rosters: Mutex::new(HashMap::new()),
            messages: Mutex::new(Vec::new()),
            next_message_id: AtomicU64::new(1),
        }
    }

    /// Seed a session and its roster. Creation-side glue for the CLI and
    /// tests; not part of the engine-facing port.
    pub fn insert_session(&self, record: SessionRecord, roster: Vec<Participant>) {
        let id = record.id.clone();
        self.sessions.lock().unwrap().insert(id.clone(), record);
        self.rosters.lock().unwrap().insert(id, roster);
    }

    /// All messages of one session, in creation order.
    pub fn messages_for(&self, session_id: &SessionId) -> Vec<Message> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Read a session record, if present.
    pub fn session(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load_session(&self, id: &SessionId) -> Result<SessionRecord, StoreError> {
        self.sessions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn load_roster(&self, id: &SessionId) -> Result<Vec<Participant>, StoreError> {
        if !self.sessions.lock().unwrap().contains_key(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(self
            .rosters
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_message(&self, draft: MessageDraft) -> Result<Message, StoreError> {
        if !self.sessions.lock().unwrap().contains_key(&draft.session_id) {
            return Err(StoreError::NotFound(draft.session_id.clone()));
        }
        let n = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        let message = Message {
            id: MessageId::new(format!("msg-{}", n)),
            session_id: draft.session_id,
            participant_id: draft.participant_id,
            participant_name: draft.participant_name,
            role: draft.role,
            body: draft.body,
            reasoning: draft.reasoning,
            tokens_used: draft.tokens_used,
            latency_ms: draft.latency_ms,
            created_at: Utc::now(),
        };
        self.messages.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn update_session(&self, id: &SessionId, patch: SessionPatch) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().unwrap();
        let record = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        patch.apply(record);
        Ok(())
    }
}

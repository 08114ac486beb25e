//! Transient orchestration state and the process-wide session registry.
//!
//! One [`OrchestrationState`] exists per active session, owned exclusively by
//! the engine. Entries are created at `initialize` and removed at
//! finalize/stop. In-flight sessions do not survive a process restart: the
//! transcript is rebuilt from empty, durable messages already written remain
//! in storage.

use crate::ports::capability::{CapabilityClient, GenerationParams};
use roundtable_domain::{Participant, SessionId, SessionRecord, TranscriptEntry};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A roster participant paired with the capability client built for it at
/// initialization. Speaking order is the roster order.
#[derive(Clone)]
pub(crate) struct Speaker {
    pub participant: Participant,
    pub client: Arc<dyn CapabilityClient>,
}

/// In-memory state of one active session run.
pub(crate) struct OrchestrationState {
    pub topic: String,
    pub speakers: Vec<Speaker>,
    pub max_rounds: u32,
    pub current_round: u32,
    pub params: GenerationParams,
    /// Assistant turns and user injections, in creation order.
    pub transcript: Vec<TranscriptEntry>,
    /// Last computed consensus percentage; authoritative at finalize.
    pub consensus: f64,
}

impl OrchestrationState {
    /// Fresh state for a run: round counter at zero, empty transcript.
    pub fn from_record(record: &SessionRecord, speakers: Vec<Speaker>) -> Self {
        Self {
            topic: record.topic.clone(),
            speakers,
            max_rounds: record.max_rounds,
            current_round: 0,
            params: GenerationParams {
                temperature: record.temperature,
                max_tokens: record.max_tokens,
            },
            transcript: Vec::new(),
            consensus: 0.0,
        }
    }

    pub fn participant_names(&self) -> Vec<String> {
        self.speakers
            .iter()
            .map(|s| s.participant.name.clone())
            .collect()
    }
}

/// Shared handle to one session's state plus its cooperative stop flag.
///
/// The flag lives outside the state mutex so `stop` can clear it while a
/// turn holds the state lock.
pub(crate) struct SessionHandle {
    running: AtomicBool,
    pub state: tokio::sync::Mutex<OrchestrationState>,
}

impl SessionHandle {
    pub fn new(state: OrchestrationState) -> Self {
        Self {
            running: AtomicBool::new(false),
            state: tokio::sync::Mutex::new(state),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, value: bool) {
        self.running.store(value, Ordering::SeqCst);
    }

    /// Claim the running flag; returns false when it was already set.
    pub fn claim_running(&self) -> bool {
        !self.running.swap(true, Ordering::SeqCst)
    }
}

/// Process-wide registry of active sessions.
///
/// Lock discipline: the map lock is never held across an await.
pub(crate) struct SessionRegistry {
    inner: Mutex<HashMap<SessionId, Arc<SessionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a handle, replacing any previous entry (fresh state wins).
    pub fn insert(&self, id: SessionId, handle: Arc<SessionHandle>) {
        self.inner.lock().unwrap().insert(id, handle);
    }

    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.inner.lock().unwrap().get(id).cloned()
    }

    /// Remove and return a handle; `None` means the session was already
    /// finalized or never initialized.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.inner.lock().unwrap().remove(id)
    }
}

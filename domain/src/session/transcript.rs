//! In-memory discussion transcript.
//!
//! The transcript mirrors the conversational messages of a running session:
//! assistant turns and user injections, in creation order. Kickoff, summary,
//! and failure notices are persisted as SYSTEM messages but never enter the
//! transcript; they are bookkeeping, not discussion content. The transcript
//! is also what the consensus heuristic counts.

use crate::session::message::Role;
use serde::{Deserialize, Serialize};

/// One conversational entry of a running session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: Role,
    pub body: String,
    /// Display name of the speaking participant; `None` for user entries.
    pub speaker: Option<String>,
}

impl TranscriptEntry {
    pub fn assistant(speaker: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            body: body.into(),
            speaker: Some(speaker.into()),
        }
    }

    pub fn user(body: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            body: body.into(),
            speaker: None,
        }
    }

    /// Render this entry as model-context text. Assistant entries carry a
    /// `[Name]: ` prefix so a model can distinguish voices in a transcript
    /// where every prior turn arrives under the same assistant role.
    pub fn context_text(&self) -> String {
        match &self.speaker {
            Some(name) => format!("[{}]: {}", name, self.body),
            None => self.body.clone(),
        }
    }
}

/// The most recent `limit` entries, oldest first.
pub fn recent(entries: &[TranscriptEntry], limit: usize) -> &[TranscriptEntry] {
    let start = entries.len().saturating_sub(limit);
    &entries[start..]
}

//! Message entity and the write-side draft shape.

use crate::core::ids::{MessageId, ParticipantId, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message in a discussion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// A persisted message (Entity).
///
/// Immutable once created. `participant_id` is absent for messages authored
/// by the human user or the system itself; failure notices are SYSTEM
/// messages *with* an attribution, pointing at the participant that failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub session_id: SessionId,
    pub participant_id: Option<ParticipantId>,
    /// Display name of the attributed participant, denormalized for
    /// observers that render events without a roster lookup.
    pub participant_name: Option<String>,
    pub role: Role,
    pub body: String,
    pub reasoning: Option<String>,
    pub tokens_used: Option<u32>,
    pub latency_ms: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Write-side shape of a message: everything except the identity and
/// timestamp, which the store assigns at creation.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub session_id: SessionId,
    pub participant_id: Option<ParticipantId>,
    pub participant_name: Option<String>,
    pub role: Role,
    pub body: String,
    pub reasoning: Option<String>,
    pub tokens_used: Option<u32>,
    pub latency_ms: Option<f64>,
}

impl MessageDraft {
    /// A SYSTEM message with no attribution (kickoff, summary).
    pub fn system(session_id: impl Into<SessionId>, body: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            participant_id: None,
            participant_name: None,
            role: Role::System,
            body: body.into(),
            reasoning: None,
            tokens_used: None,
            latency_ms: None,
        }
    }

    /// A SYSTEM message attributed to a participant (failure notice).
    pub fn system_for(
        session_id: impl Into<SessionId>,
        participant_id: impl Into<ParticipantId>,
        participant_name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            participant_id: Some(participant_id.into()),
            participant_name: Some(participant_name.into()),
            role: Role::System,
            body: body.into(),
            reasoning: None,
            tokens_used: None,
            latency_ms: None,
        }
    }

    /// A USER message injected by the human observer.
    pub fn user(session_id: impl Into<SessionId>, body: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            participant_id: None,
            participant_name: None,
            role: Role::User,
            body: body.into(),
            reasoning: None,
            tokens_used: None,
            latency_ms: None,
        }
    }

    /// An ASSISTANT message produced by a participant's turn.
    pub fn assistant(
        session_id: impl Into<SessionId>,
        participant_id: impl Into<ParticipantId>,
        participant_name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            participant_id: Some(participant_id.into()),
            participant_name: Some(participant_name.into()),
            role: Role::Assistant,
            body: body.into(),
            reasoning: None,
            tokens_used: None,
            latency_ms: None,
        }
    }

    pub fn with_reasoning(mut self, reasoning: Option<String>) -> Self {
        self.reasoning = reasoning;
        self
    }

    pub fn with_usage(mut self, tokens_used: Option<u32>, latency_ms: Option<f64>) -> Self {
        self.tokens_used = tokens_used;
        self.latency_ms = latency_ms;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }

    #[test]
    fn test_system_draft_has_no_attribution() {
        let draft = MessageDraft::system("sess-1", "welcome");
        assert_eq!(draft.role, Role::System);
        assert!(draft.participant_id.is_none());
        assert!(draft.participant_name.is_none());
    }

    #[test]
    fn test_failure_notice_is_attributed_system_message() {
        let draft = MessageDraft::system_for("sess-1", "p-1", "Claude", "[Claude encountered an error]");
        assert_eq!(draft.role, Role::System);
        assert_eq!(draft.participant_id, Some(ParticipantId::new("p-1")));
        assert_eq!(draft.participant_name.as_deref(), Some("Claude"));
    }

    #[test]
    fn test_assistant_draft_builders() {
        let draft = MessageDraft::assistant("sess-1", "p-2", "GPT-4", "hello")
            .with_reasoning(Some("thought".into()))
            .with_usage(Some(42), Some(123.4));
        assert_eq!(draft.role, Role::Assistant);
        assert_eq!(draft.reasoning.as_deref(), Some("thought"));
        assert_eq!(draft.tokens_used, Some(42));
        assert_eq!(draft.latency_ms, Some(123.4));
    }
}

//! Participant domain entities

use crate::core::ids::ParticipantId;
use crate::participant::provider::ProviderKind;
use serde::{Deserialize, Serialize};

/// Capability-client configuration carried by a participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Vendor model identifier, e.g. `claude-3-5-sonnet-20241022`.
    pub model: String,
    /// Credential; empty means the participant cannot speak.
    pub api_key: String,
    /// Alternate endpoint overriding the vendor default.
    pub api_base: Option<String>,
}

impl ProviderConfig {
    pub fn new(kind: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            kind,
            model: model.into(),
            api_key: String::new(),
            api_base: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }
}

/// One configured model-backed speaker (Entity).
///
/// Roster order is the persisted ordering index of the session's roster and
/// is exactly the speaking order for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    pub provider: ProviderConfig,
    /// Display color for rendering surfaces, `#rrggbb`.
    pub color: String,
    pub enabled: bool,
}

impl Participant {
    pub fn new(
        id: impl Into<ParticipantId>,
        name: impl Into<String>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider,
            color: "#3b82f6".to_string(),
            enabled: true,
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// A participant speaks only when enabled with a credential present.
    /// Evaluated once at session initialization, never mid-run.
    pub fn is_eligible(&self) -> bool {
        self.enabled && !self.provider.api_key.is_empty()
    }
}

//! TOML file configuration for the CLI.
//!
//! ```toml
//! [session]
//! title = "Evening roundtable"
//! max_rounds = 5
//! temperature = 0.7
//! max_tokens = 2000
//!
//! [engine]
//! turn_delay_ms = 1000
//! round_delay_ms = 2000
//! context_window = 10
//!
//! [[participants]]
//! name = "Claude"
//! provider = "anthropic"
//! model = "claude-3-5-sonnet-20241022"
//! api_key_env = "ANTHROPIC_API_KEY"
//! color = "#d97757"
//! ```

use roundtable_application::EngineParams;
use roundtable_domain::{Participant, ProviderConfig, ProviderKind};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Root configuration file shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub session: FileSessionConfig,
    pub engine: FileEngineConfig,
    pub participants: Vec<FileParticipantConfig>,
}

/// Session defaults applied when the CLI creates a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSessionConfig {
    pub title: String,
    pub max_rounds: u32,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FileSessionConfig {
    fn default() -> Self {
        Self {
            title: "Roundtable session".to_string(),
            max_rounds: 10,
            temperature: 0.7,
            max_tokens: 2000,
        }
    }
}

/// Engine pacing, in milliseconds for TOML ergonomics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileEngineConfig {
    pub turn_delay_ms: u64,
    pub round_delay_ms: u64,
    pub context_window: usize,
}

impl Default for FileEngineConfig {
    fn default() -> Self {
        Self {
            turn_delay_ms: 1000,
            round_delay_ms: 2000,
            context_window: 10,
        }
    }
}

impl FileEngineConfig {
    pub fn to_engine_params(&self) -> EngineParams {
        EngineParams::default()
            .with_turn_delay(Duration::from_millis(self.turn_delay_ms))
            .with_round_delay(Duration::from_millis(self.round_delay_ms))
            .with_context_window(self.context_window)
    }
}

/// One configured participant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileParticipantConfig {
    pub name: String,
    /// Provider kind tag, e.g. `anthropic`, `openai`, `deepseek`.
    pub provider: String,
    pub model: String,
    /// Inline credential. Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the credential.
    pub api_key_env: Option<String>,
    pub api_base: Option<String>,
    pub color: Option<String>,
    pub enabled: bool,
}

impl Default for FileParticipantConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: "openai".to_string(),
            model: String::new(),
            api_key: None,
            api_key_env: None,
            api_base: None,
            color: None,
            enabled: true,
        }
    }
}

impl FileParticipantConfig {
    /// Resolve the credential: inline key first, then the named environment
    /// variable. An unresolvable credential yields an empty key, which the
    /// engine's eligibility filter excludes at session start.
    fn resolve_api_key(&self) -> String {
        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return key.clone();
        }
        if let Some(var) = &self.api_key_env {
            match std::env::var(var) {
                Ok(key) if !key.is_empty() => return key,
                _ => warn!(participant = %self.name, env = %var, "credential variable unset"),
            }
        }
        String::new()
    }

    /// Convert to a domain participant; `index` becomes the roster id and
    /// speaking-order position.
    pub fn to_participant(&self, index: usize) -> Participant {
        let kind: ProviderKind = self.provider.parse().unwrap();
        let mut provider =
            ProviderConfig::new(kind, self.model.clone()).with_api_key(self.resolve_api_key());
        provider.api_base = self.api_base.clone();

        let mut participant =
            Participant::new(format!("p-{}", index + 1), self.name.clone(), provider);
        if let Some(color) = &self.color {
            participant = participant.with_color(color.clone());
        }
        participant.enabled = self.enabled;
        participant
    }
}

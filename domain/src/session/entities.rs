//! Session domain entities

use crate::core::error::DomainError;
use crate::core::ids::SessionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of one discussion session (Entity).
///
/// This is the storage-facing shape: the orchestration engine reads the topic
/// and the numeric parameters, and writes the completion fields at finalize.
/// `title` and `description` exist for listing surfaces and are never read by
/// the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub title: String,
    pub description: Option<String>,
    pub topic: String,

    /// Round budget: total passes over the speaking order.
    pub max_rounds: u32,
    /// Rounds actually driven so far; 0 until the first round starts.
    pub current_round: u32,
    pub temperature: f32,
    pub max_tokens: u32,

    pub is_active: bool,
    pub is_completed: bool,
    pub consensus_reached: bool,
    /// Running consensus heuristic, 0.0 to 100.0.
    pub consensus_percentage: f64,

    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Create a new session with default generation parameters.
    pub fn new(
        id: impl Into<SessionId>,
        title: impl Into<String>,
        topic: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            topic: topic.into(),
            max_rounds: 10,
            current_round: 0,
            temperature: 0.7,
            max_tokens: 2000,
            is_active: true,
            is_completed: false,
            consensus_reached: false,
            consensus_percentage: 0.0,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_generation(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// Validate the invariants a session must hold before it can be driven.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_rounds == 0 {
            return Err(DomainError::InvalidRoundBudget(self.max_rounds));
        }
        if self.topic.trim().is_empty() {
            return Err(DomainError::EmptyTopic);
        }
        Ok(())
    }
}

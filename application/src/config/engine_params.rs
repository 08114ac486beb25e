//! Engine pacing parameters.
//!
//! [`EngineParams`] groups the static parameters that control the round loop
//! in [`DiscussionEngine`](crate::use_cases::run_discussion::DiscussionEngine).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Round loop control parameters.
///
/// The delays exist to avoid hammering downstream APIs and to give observers
/// a readable cadence; tests zero them out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    /// Pause after each participant turn.
    pub turn_delay: Duration,
    /// Pause between consecutive rounds.
    pub round_delay: Duration,
    /// How many recent transcript entries enter a turn's model context.
    pub context_window: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            turn_delay: Duration::from_secs(1),
            round_delay: Duration::from_secs(2),
            context_window: 10,
        }
    }
}

impl EngineParams {
    pub fn with_turn_delay(mut self, delay: Duration) -> Self {
        self.turn_delay = delay;
        self
    }

    pub fn with_round_delay(mut self, delay: Duration) -> Self {
        self.round_delay = delay;
        self
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    /// Zero delays for tests and batch runs.
    pub fn immediate() -> Self {
        Self::default()
            .with_turn_delay(Duration::ZERO)
            .with_round_delay(Duration::ZERO)
    }
}

//! Bounded model-context assembly for one turn.

use super::state::{OrchestrationState, Speaker};
use crate::ports::capability::ChatTurn;
use roundtable_domain::{PromptTemplate, Role, recent};

/// Build the conversation sent to a speaker's capability client: the
/// synthesized system instruction followed by the most recent `window`
/// transcript entries. Assistant entries arrive prefixed with the speaking
/// participant's name so the model can tell voices apart.
pub(crate) fn build_context(
    state: &OrchestrationState,
    speaker: &Speaker,
    window: usize,
) -> Vec<ChatTurn> {
    let others: Vec<String> = state
        .speakers
        .iter()
        .filter(|s| s.participant.id != speaker.participant.id)
        .map(|s| s.participant.name.clone())
        .collect();

    let mut turns = vec![ChatTurn::system(PromptTemplate::turn_instruction(
        &speaker.participant.name,
        &state.topic,
        &others,
        state.current_round,
        state.max_rounds,
    ))];

    for entry in recent(&state.transcript, window) {
        let turn = match entry.role {
            Role::Assistant => ChatTurn::assistant(entry.context_text()),
            _ => ChatTurn::user(entry.context_text()),
        };
        turns.push(turn);
    }

    turns
}

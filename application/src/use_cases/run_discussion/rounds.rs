//! Round driver, turn executor, consensus update, and finalizer.
//!
//! The round driver runs as a dedicated worker task per active session: an
//! explicit loop, so long sessions with large round budgets never grow the
//! call stack. Within one session turns are strictly sequential; the context
//! built for turn N+1 always includes the persisted result of turn N.

use super::context::build_context;
use super::state::{SessionHandle, Speaker};
use super::DiscussionEngine;
use crate::ports::capability::Generation;
use crate::ports::event_sink::{RoundStatus, SessionEvent};
use crate::ports::session_store::{SessionPatch, StoreError};
use chrono::Utc;
use roundtable_domain::{
    MessageDraft, PromptTemplate, SessionId, TranscriptEntry, consensus_percentage,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

impl DiscussionEngine {
    /// Drive rounds until the budget is exhausted or the session is stopped,
    /// then finalize.
    pub(crate) async fn drive_rounds(self: Arc<Self>, session_id: SessionId, handle: Arc<SessionHandle>) {
        loop {
            let (current_round, max_rounds, speakers) = {
                let mut state = handle.state.lock().await;
                state.current_round += 1;
                (state.current_round, state.max_rounds, state.speakers.clone())
            };

            info!(session = %session_id, round = current_round, max_rounds, "round started");
            self.events.publish(
                &session_id,
                SessionEvent::RoundUpdate {
                    current_round,
                    max_rounds,
                    status: RoundStatus::Started,
                },
            );

            for speaker in &speakers {
                // Stop is observed here, and only here: an in-flight turn
                // always completes, turns already taken are never rolled back.
                if !handle.is_running() {
                    debug!(session = %session_id, round = current_round, "stop observed, aborting round");
                    break;
                }
                self.take_turn(&session_id, &handle, speaker).await;
                tokio::time::sleep(self.params.turn_delay).await;
            }

            // An empty roster completes its first round with no turns and
            // finalizes immediately instead of spinning through the budget.
            if current_round < max_rounds && handle.is_running() && !speakers.is_empty() {
                tokio::time::sleep(self.params.round_delay).await;
                continue;
            }

            self.finalize(&session_id).await;
            return;
        }
    }

    /// One participant's generate-and-persist step.
    ///
    /// Vendor errors and storage errors alike are absorbed here:
    /// the participant gets an attributed SYSTEM failure notice and the round
    /// moves on. A single participant can never abort the session.
    async fn take_turn(&self, session_id: &SessionId, handle: &SessionHandle, speaker: &Speaker) {
        let participant = &speaker.participant;
        self.events.publish(
            session_id,
            SessionEvent::ParticipantTyping {
                participant_id: participant.id.clone(),
                name: participant.name.clone(),
            },
        );

        let (conversation, params) = {
            let state = handle.state.lock().await;
            (
                build_context(&state, speaker, self.params.context_window),
                state.params.clone(),
            )
        };

        match speaker.client.generate(&conversation, &params).await {
            Ok(generation) => {
                if let Err(err) = self.record_turn(session_id, handle, speaker, generation).await {
                    self.record_failure(session_id, speaker, &err.to_string()).await;
                    return;
                }
                self.update_consensus(session_id, handle).await;
            }
            Err(err) => {
                self.record_failure(session_id, speaker, &err.to_string()).await;
            }
        }
    }

    /// Persist a successful turn, mirror it into the transcript, and emit
    /// the turn's events. Persistence strictly precedes the `new_message`
    /// emission.
    async fn record_turn(
        &self,
        session_id: &SessionId,
        handle: &SessionHandle,
        speaker: &Speaker,
        generation: Generation,
    ) -> Result<(), StoreError> {
        let participant = &speaker.participant;
        let draft = MessageDraft::assistant(
            session_id.clone(),
            participant.id.clone(),
            participant.name.clone(),
            generation.text.clone(),
        )
        .with_reasoning(generation.reasoning)
        .with_usage(generation.tokens_used, generation.latency_ms);

        let message = self.store.create_message(draft).await?;

        {
            let mut state = handle.state.lock().await;
            state
                .transcript
                .push(TranscriptEntry::assistant(&participant.name, &generation.text));
        }

        self.events.publish(
            session_id,
            SessionEvent::ParticipantStoppedTyping {
                participant_id: participant.id.clone(),
                name: participant.name.clone(),
            },
        );
        self.events.publish(session_id, SessionEvent::NewMessage { message });
        Ok(())
    }

    /// Handle a failed turn: stopped-typing event, attributed SYSTEM notice,
    /// round continues.
    async fn record_failure(&self, session_id: &SessionId, speaker: &Speaker, detail: &str) {
        let participant = &speaker.participant;
        warn!(
            session = %session_id,
            participant = %participant.name,
            error = detail,
            "turn failed, continuing round"
        );

        self.events.publish(
            session_id,
            SessionEvent::ParticipantStoppedTyping {
                participant_id: participant.id.clone(),
                name: participant.name.clone(),
            },
        );

        let draft = MessageDraft::system_for(
            session_id.clone(),
            participant.id.clone(),
            participant.name.clone(),
            PromptTemplate::generation_failure(&participant.name, detail),
        );
        if let Err(err) = self.store.create_message(draft).await {
            warn!(session = %session_id, error = %err, "failed to persist failure notice");
        }
    }

    /// Recompute the consensus heuristic after a successful turn.
    /// Skipped while the transcript is empty.
    async fn update_consensus(&self, session_id: &SessionId, handle: &SessionHandle) {
        let (percentage, current_round, total_messages) = {
            let mut state = handle.state.lock().await;
            let total = state.transcript.len();
            if total == 0 {
                return;
            }
            let pct = consensus_percentage(total, state.max_rounds, state.speakers.len());
            state.consensus = pct;
            (pct, state.current_round, total)
        };

        self.events.publish(
            session_id,
            SessionEvent::ConsensusUpdate {
                percentage,
                current_round,
                total_messages,
            },
        );
    }

    /// Close a session: summary message, durable completion patch,
    /// completion event, registry removal.
    ///
    /// Removing the registry entry first makes finalize idempotent: the
    /// round driver and a concurrent `stop` may both reach here, and only
    /// the first caller proceeds.
    pub(crate) async fn finalize(&self, session_id: &SessionId) {
        let Some(handle) = self.registry.remove(session_id) else {
            return;
        };
        handle.set_running(false);

        let (summary, total_rounds, total_messages, consensus) = {
            let state = handle.state.lock().await;
            let names = state.participant_names();
            let summary = PromptTemplate::summary(
                &state.topic,
                state.current_round,
                &names,
                &state.transcript,
                state.consensus,
            );
            (summary, state.current_round, state.transcript.len(), state.consensus)
        };

        if let Err(err) = self
            .store
            .create_message(MessageDraft::system(session_id.clone(), summary.clone()))
            .await
        {
            warn!(session = %session_id, error = %err, "failed to persist summary");
        }

        let patch = SessionPatch::completed(total_rounds, consensus, Utc::now());
        if let Err(err) = self.store.update_session(session_id, patch).await {
            warn!(session = %session_id, error = %err, "failed to mark session completed");
        }

        info!(
            session = %session_id,
            rounds = total_rounds,
            messages = total_messages,
            consensus,
            "session completed"
        );
        self.events.publish(
            session_id,
            SessionEvent::SessionCompleted {
                summary,
                total_rounds,
                total_messages,
                consensus_percentage: consensus,
            },
        );
    }
}

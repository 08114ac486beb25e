//! Run Discussion use case
//!
//! The discussion orchestration engine: owns per-session state, sequences
//! participant turns into rounds, computes the running consensus signal, and
//! emits ordered lifecycle events. Storage, model vendors, and event
//! transport are reached only through ports.

mod context;
mod rounds;
mod state;

use crate::config::EngineParams;
use crate::ports::capability::CapabilityFactory;
use crate::ports::event_sink::{EventSink, SessionEvent};
use crate::ports::session_store::{SessionStore, StoreError};
use roundtable_domain::{
    DomainError, Message, MessageDraft, PromptTemplate, SessionId, TranscriptEntry,
};
use state::{OrchestrationState, SessionHandle, SessionRegistry, Speaker};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors surfaced to the engine's caller
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Session {0} not found")]
    NotFound(SessionId),

    #[error("Session {0} is already completed")]
    AlreadyCompleted(SessionId),

    #[error("Invalid session: {0}")]
    Invalid(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The discussion orchestration engine.
///
/// One instance serves many sessions; each running session gets its own
/// worker task, and turns within a session are strictly sequential. `Start`,
/// `Stop`, and `submit_user_message` may be called concurrently with a
/// running round loop for the same session.
pub struct DiscussionEngine {
    store: Arc<dyn SessionStore>,
    events: Arc<dyn EventSink>,
    capabilities: Arc<dyn CapabilityFactory>,
    params: EngineParams,
    registry: SessionRegistry,
}

impl DiscussionEngine {
    pub fn new(
        store: Arc<dyn SessionStore>,
        events: Arc<dyn EventSink>,
        capabilities: Arc<dyn CapabilityFactory>,
    ) -> Self {
        Self {
            store,
            events,
            capabilities,
            params: EngineParams::default(),
            registry: SessionRegistry::new(),
        }
    }

    pub fn with_params(mut self, params: EngineParams) -> Self {
        self.params = params;
        self
    }

    /// Build fresh orchestration state for a session.
    ///
    /// Idempotent in the replacing sense: calling twice discards any
    /// previous in-memory state. Emits nothing; only `start` announces a
    /// session.
    pub async fn initialize(&self, session_id: &SessionId) -> Result<(), EngineError> {
        self.init_state(session_id).await.map(|_| ())
    }

    /// Accept a start request: persist the kickoff announcement and hand the
    /// session to a round-driver worker task. Returns as soon as the start
    /// is accepted; rounds run asynchronously.
    pub async fn start(self: &Arc<Self>, session_id: &SessionId) -> Result<(), EngineError> {
        let record = self
            .store
            .load_session(session_id)
            .await
            .map_err(Self::map_store)?;
        if record.is_completed {
            return Err(EngineError::AlreadyCompleted(session_id.clone()));
        }
        record.validate()?;

        let handle = match self.registry.get(session_id) {
            Some(handle) => handle,
            None => self.init_state(session_id).await?,
        };

        if !handle.claim_running() {
            debug!(session = %session_id, "start ignored, session already running");
            return Ok(());
        }

        let (topic, names, max_rounds) = {
            let state = handle.state.lock().await;
            (
                state.topic.clone(),
                state.participant_names(),
                state.max_rounds,
            )
        };
        let kickoff = PromptTemplate::kickoff(&topic, &names, max_rounds);
        let message = self
            .store
            .create_message(MessageDraft::system(session_id.clone(), kickoff))
            .await?;
        self.events
            .publish(session_id, SessionEvent::NewMessage { message });

        info!(session = %session_id, participants = names.len(), "session started");

        let engine = Arc::clone(self);
        let worker_id = session_id.clone();
        let worker_handle = Arc::clone(&handle);
        tokio::spawn(async move {
            engine.drive_rounds(worker_id, worker_handle).await;
        });
        Ok(())
    }

    /// Request a cooperative stop. The flag is observed at the top of the
    /// per-speaker loop; the session finalizes immediately. A no-op when the
    /// session has no active state.
    pub async fn stop(&self, session_id: &SessionId) {
        if let Some(handle) = self.registry.get(session_id) {
            info!(session = %session_id, "stop requested");
            handle.set_running(false);
            self.finalize(session_id).await;
        }
    }

    /// Inject a message from the human observer. Never advances a turn or
    /// round; turns only advance through the round driver.
    pub async fn submit_user_message(
        &self,
        session_id: &SessionId,
        text: impl Into<String>,
    ) -> Result<Message, EngineError> {
        let message = self
            .store
            .create_message(MessageDraft::user(session_id.clone(), text.into()))
            .await
            .map_err(Self::map_store)?;

        if let Some(handle) = self.registry.get(session_id) {
            let mut state = handle.state.lock().await;
            state.transcript.push(TranscriptEntry::user(&message.body));
        }

        self.events.publish(
            session_id,
            SessionEvent::NewMessage {
                message: message.clone(),
            },
        );
        Ok(message)
    }

    /// Whether the session currently has a running round loop.
    pub fn is_running(&self, session_id: &SessionId) -> bool {
        self.registry
            .get(session_id)
            .map(|h| h.is_running())
            .unwrap_or(false)
    }

    async fn init_state(&self, session_id: &SessionId) -> Result<Arc<SessionHandle>, EngineError> {
        let record = self
            .store
            .load_session(session_id)
            .await
            .map_err(Self::map_store)?;
        let roster = self
            .store
            .load_roster(session_id)
            .await
            .map_err(Self::map_store)?;

        let mut speakers = Vec::new();
        for participant in roster {
            if !participant.is_eligible() {
                debug!(
                    session = %session_id,
                    participant = %participant.name,
                    "skipping ineligible participant"
                );
                continue;
            }
            match self.capabilities.client_for(&participant) {
                Ok(client) => speakers.push(Speaker { participant, client }),
                Err(err) => warn!(
                    session = %session_id,
                    participant = %participant.name,
                    error = %err,
                    "excluding participant: no capability client"
                ),
            }
        }

        info!(session = %session_id, speakers = speakers.len(), "session state initialized");
        let handle = Arc::new(SessionHandle::new(OrchestrationState::from_record(
            &record, speakers,
        )));
        self.registry.insert(session_id.clone(), handle.clone());
        Ok(handle)
    }

    fn map_store(err: StoreError) -> EngineError {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::capability::{
        CapabilityClient, CapabilityError, ChatTurn, Generation, GenerationParams,
    };
    use crate::ports::session_store::SessionPatch;
    use async_trait::async_trait;
    use chrono::Utc;
    use roundtable_domain::{
        Message, MessageId, Participant, ParticipantId, ProviderConfig, ProviderKind, Role,
        SessionRecord,
    };
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    // === Mock store ===

    struct MemStore {
        sessions: Mutex<HashMap<SessionId, SessionRecord>>,
        rosters: Mutex<HashMap<SessionId, Vec<Participant>>>,
        messages: Mutex<Vec<Message>>,
        next_id: AtomicUsize,
    }

    impl MemStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sessions: Mutex::new(HashMap::new()),
                rosters: Mutex::new(HashMap::new()),
                messages: Mutex::new(Vec::new()),
                next_id: AtomicUsize::new(1),
            })
        }

        fn seed(&self, record: SessionRecord, roster: Vec<Participant>) {
            let id = record.id.clone();
            self.sessions.lock().unwrap().insert(id.clone(), record);
            self.rosters.lock().unwrap().insert(id, roster);
        }

        fn messages(&self) -> Vec<Message> {
            self.messages.lock().unwrap().clone()
        }

        fn record(&self, id: &SessionId) -> SessionRecord {
            self.sessions.lock().unwrap().get(id).unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionStore for MemStore {
        async fn load_session(&self, id: &SessionId) -> Result<SessionRecord, StoreError> {
            self.sessions
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.clone()))
        }

        async fn load_roster(&self, id: &SessionId) -> Result<Vec<Participant>, StoreError> {
            self.rosters
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.clone()))
        }

        async fn create_message(
            &self,
            draft: roundtable_domain::MessageDraft,
        ) -> Result<Message, StoreError> {
            if !self.sessions.lock().unwrap().contains_key(&draft.session_id) {
                return Err(StoreError::NotFound(draft.session_id.clone()));
            }
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
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

        async fn update_session(
            &self,
            id: &SessionId,
            patch: SessionPatch,
        ) -> Result<(), StoreError> {
            let mut sessions = self.sessions.lock().unwrap();
            let record = sessions
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            patch.apply(record);
            Ok(())
        }
    }

    // === Mock event sink ===

    struct ChannelSink {
        tx: mpsc::UnboundedSender<SessionEvent>,
    }

    impl EventSink for ChannelSink {
        fn publish(&self, _session_id: &SessionId, event: SessionEvent) {
            let _ = self.tx.send(event);
        }
    }

    fn channel_sink() -> (Arc<ChannelSink>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(ChannelSink { tx }), rx)
    }

    // === Mock capability clients ===

    struct ScriptedClient {
        name: String,
        calls: AtomicUsize,
        /// Zero-based call index that should fail, if any.
        fail_on: Option<usize>,
    }

    impl ScriptedClient {
        fn ok(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
                fail_on: None,
            })
        }

        fn failing_on(name: &str, call: usize) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                calls: AtomicUsize::new(0),
                fail_on: Some(call),
            })
        }
    }

    #[async_trait]
    impl CapabilityClient for ScriptedClient {
        fn model(&self) -> &str {
            "test-model"
        }

        async fn generate(
            &self,
            _conversation: &[ChatTurn],
            _params: &GenerationParams,
        ) -> Result<Generation, CapabilityError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(n) {
                return Err(CapabilityError::Api {
                    status: 500,
                    message: "boom".into(),
                });
            }
            Ok(Generation {
                text: format!("{} speaks in turn {}", self.name, n + 1),
                reasoning: None,
                tokens_used: Some(10),
                latency_ms: Some(5.0),
            })
        }
    }

    struct TestFactory {
        clients: Mutex<HashMap<ParticipantId, Arc<dyn CapabilityClient>>>,
        rejected: HashSet<ParticipantId>,
    }

    impl TestFactory {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                clients: Mutex::new(HashMap::new()),
                rejected: HashSet::new(),
            })
        }

        fn with_client(
            self: Arc<Self>,
            id: &str,
            client: Arc<dyn CapabilityClient>,
        ) -> Arc<Self> {
            self.clients
                .lock()
                .unwrap()
                .insert(ParticipantId::new(id), client);
            self
        }

        fn rejecting(id: &str) -> Arc<Self> {
            Arc::new(Self {
                clients: Mutex::new(HashMap::new()),
                rejected: HashSet::from([ParticipantId::new(id)]),
            })
        }
    }

    impl CapabilityFactory for TestFactory {
        fn client_for(
            &self,
            participant: &Participant,
        ) -> Result<Arc<dyn CapabilityClient>, CapabilityError> {
            if self.rejected.contains(&participant.id) {
                return Err(CapabilityError::UnsupportedKind(
                    participant.provider.kind.to_string(),
                ));
            }
            let mut clients = self.clients.lock().unwrap();
            Ok(clients
                .entry(participant.id.clone())
                .or_insert_with(|| {
                    let client: Arc<dyn CapabilityClient> = ScriptedClient::ok(&participant.name);
                    client
                })
                .clone())
        }
    }

    // === Helpers ===

    fn participant(id: &str, name: &str) -> Participant {
        Participant::new(
            id,
            name,
            ProviderConfig::new(ProviderKind::OpenAi, "gpt-4").with_api_key("sk-test"),
        )
    }

    fn build_engine(
        store: Arc<MemStore>,
        factory: Arc<dyn CapabilityFactory>,
    ) -> (Arc<DiscussionEngine>, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sink, rx) = channel_sink();
        let engine = Arc::new(
            DiscussionEngine::new(store, sink, factory).with_params(EngineParams::immediate()),
        );
        (engine, rx)
    }

    async fn drain_until_completed(
        rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    ) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        loop {
            let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
                .await
                .expect("timed out waiting for session completion")
                .expect("event channel closed before completion");
            let done = matches!(event, SessionEvent::SessionCompleted { .. });
            events.push(event);
            if done {
                return events;
            }
        }
    }

    fn kinds(events: &[SessionEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.kind()).collect()
    }

    // === Tests ===

    #[tokio::test]
    async fn test_start_fails_for_unknown_session() {
        let store = MemStore::new();
        let (engine, _rx) = build_engine(store, TestFactory::new());
        let err = engine.start(&SessionId::new("missing")).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_start_fails_for_completed_session() {
        let store = MemStore::new();
        let mut record = SessionRecord::new("sess-1", "t", "topic");
        record.is_completed = true;
        store.seed(record, vec![]);

        let (engine, _rx) = build_engine(store, TestFactory::new());
        let err = engine.start(&SessionId::new("sess-1")).await.unwrap_err();
        assert!(matches!(err, EngineError::AlreadyCompleted(_)));
    }

    #[tokio::test]
    async fn test_start_rejects_zero_round_budget() {
        let store = MemStore::new();
        store.seed(
            SessionRecord::new("sess-1", "t", "topic").with_max_rounds(0),
            vec![],
        );

        let (engine, _rx) = build_engine(store, TestFactory::new());
        let err = engine.start(&SessionId::new("sess-1")).await.unwrap_err();
        assert!(matches!(err, EngineError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_full_run_persists_kickoff_turns_and_summary_in_order() {
        let store = MemStore::new();
        let id = SessionId::new("sess-1");
        store.seed(
            SessionRecord::new("sess-1", "t", "Remote work").with_max_rounds(3),
            vec![participant("p-a", "Alpha"), participant("p-b", "Beta")],
        );

        let (engine, mut rx) = build_engine(store.clone(), TestFactory::new());
        engine.start(&id).await.unwrap();
        let events = drain_until_completed(&mut rx).await;

        // 1 kickoff + 3 rounds x 2 turns + 1 summary
        let messages = store.messages();
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].body.contains("Topic: Remote work"));
        let speakers: Vec<_> = messages[1..7]
            .iter()
            .map(|m| {
                assert_eq!(m.role, Role::Assistant);
                m.participant_name.clone().unwrap()
            })
            .collect();
        assert_eq!(speakers, ["Alpha", "Beta", "Alpha", "Beta", "Alpha", "Beta"]);
        assert_eq!(messages[7].role, Role::System);
        assert!(messages[7].body.contains("## Discussion Summary"));

        // Durable record carries the completion patch
        let record = store.record(&id);
        assert!(record.is_completed);
        assert!(record.consensus_reached);
        assert_eq!(record.current_round, 3);
        assert_eq!(record.consensus_percentage, 100.0);
        assert!(record.completed_at.is_some());

        // Event order: kickoff, then per round one round_update and the
        // typing/stopped/message/consensus quartet per turn, completion last.
        let mut expected = vec!["new_message"];
        for _ in 0..3 {
            expected.push("round_update");
            for _ in 0..2 {
                expected.extend([
                    "participant_typing",
                    "participant_stopped_typing",
                    "new_message",
                    "consensus_update",
                ]);
            }
        }
        expected.push("session_completed");
        assert_eq!(kinds(&events), expected);

        // Consensus climbs monotonically to saturation
        let percentages: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::ConsensusUpdate { percentage, .. } => Some(*percentage),
                _ => None,
            })
            .collect();
        assert_eq!(percentages, [16.7, 33.3, 50.0, 66.7, 83.3, 100.0]);

        // State destroyed at finalize
        assert!(!engine.is_running(&id));
    }

    #[tokio::test]
    async fn test_zero_eligible_participants_completes_after_one_round() {
        let store = MemStore::new();
        let id = SessionId::new("sess-1");
        store.seed(
            SessionRecord::new("sess-1", "t", "topic").with_max_rounds(5),
            vec![
                participant("p-a", "NoKey").disabled(),
                Participant::new(
                    "p-b",
                    "Blank",
                    ProviderConfig::new(ProviderKind::OpenAi, "gpt-4"),
                ),
            ],
        );

        let (engine, mut rx) = build_engine(store.clone(), TestFactory::new());
        engine.start(&id).await.unwrap();
        let events = drain_until_completed(&mut rx).await;

        // Kickoff + summary only; exactly one round driven despite the budget
        assert_eq!(store.messages().len(), 2);
        let record = store.record(&id);
        assert!(record.is_completed);
        assert_eq!(record.current_round, 1);
        assert_eq!(record.consensus_percentage, 0.0);

        // No turn or consensus events at all
        assert_eq!(
            kinds(&events),
            ["new_message", "round_update", "session_completed"]
        );
    }

    #[tokio::test]
    async fn test_single_turn_failure_is_isolated() {
        let store = MemStore::new();
        let id = SessionId::new("sess-1");
        store.seed(
            SessionRecord::new("sess-1", "t", "topic").with_max_rounds(3),
            vec![participant("p-a", "Alpha"), participant("p-b", "Beta")],
        );

        // Alpha's second call (round 2) fails; everything else succeeds
        let factory = TestFactory::new()
            .with_client("p-a", ScriptedClient::failing_on("Alpha", 1));
        let (engine, mut rx) = build_engine(store.clone(), factory);
        engine.start(&id).await.unwrap();
        drain_until_completed(&mut rx).await;

        let messages = store.messages();
        // Kickoff + 5 successful turns + 1 failure notice + summary
        assert_eq!(messages.len(), 8);

        let failures: Vec<_> = messages
            .iter()
            .filter(|m| m.role == Role::System && m.participant_id.is_some())
            .collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].participant_name.as_deref(), Some("Alpha"));
        assert!(failures[0].body.contains("Alpha encountered an error"));
        assert!(failures[0].body.contains("API error (500): boom"));

        // Beta spoke in every round, including the round where Alpha failed
        let beta_turns = messages
            .iter()
            .filter(|m| m.role == Role::Assistant && m.participant_name.as_deref() == Some("Beta"))
            .count();
        assert_eq!(beta_turns, 3);

        // Five spoken turns of a six-turn budget
        let record = store.record(&id);
        assert!(record.is_completed);
        assert_eq!(record.consensus_percentage, 83.3);
    }

    #[tokio::test]
    async fn test_factory_rejection_excludes_participant_at_initialize() {
        let store = MemStore::new();
        let id = SessionId::new("sess-1");
        store.seed(
            SessionRecord::new("sess-1", "t", "topic").with_max_rounds(3),
            vec![participant("p-a", "Alpha"), participant("p-b", "Beta")],
        );

        let (engine, mut rx) = build_engine(store.clone(), TestFactory::rejecting("p-a"));
        engine.start(&id).await.unwrap();
        drain_until_completed(&mut rx).await;

        let messages = store.messages();
        // Kickoff + 3 Beta turns + summary; Alpha never speaks
        assert_eq!(messages.len(), 5);
        assert!(
            messages
                .iter()
                .all(|m| m.participant_name.as_deref() != Some("Alpha"))
        );
        // Consensus denominators use the filtered roster
        assert_eq!(store.record(&id).consensus_percentage, 100.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_mid_round_skips_remaining_speakers() {
        let store = MemStore::new();
        let id = SessionId::new("sess-1");
        store.seed(
            SessionRecord::new("sess-1", "t", "topic").with_max_rounds(3),
            vec![participant("p-a", "Alpha"), participant("p-b", "Beta")],
        );

        let (sink, mut rx) = channel_sink();
        let engine = Arc::new(DiscussionEngine::new(
            store.clone(),
            sink,
            TestFactory::new(),
        ));
        // Default pacing: the stop request lands in the inter-turn delay
        engine.start(&id).await.unwrap();

        // Wait for Alpha's round-2 message (third assistant message), then
        // stop before Beta's round-2 turn begins.
        let mut assistant_messages = 0;
        let mut events = Vec::new();
        while assistant_messages < 3 {
            let event = tokio::time::timeout(Duration::from_secs(60), rx.recv())
                .await
                .expect("timed out waiting for Alpha's round-2 turn")
                .expect("event channel closed");
            if let SessionEvent::NewMessage { message } = &event
                && message.role == Role::Assistant
            {
                assistant_messages += 1;
            }
            events.push(event);
        }
        engine.stop(&id).await;
        events.extend(drain_until_completed(&mut rx).await);

        let record = store.record(&id);
        assert!(record.is_completed);
        assert_eq!(record.current_round, 2);
        assert!(!engine.is_running(&id));

        // Beta spoke only in round 1
        let beta_turns = store
            .messages()
            .iter()
            .filter(|m| m.participant_name.as_deref() == Some("Beta") && m.role == Role::Assistant)
            .count();
        assert_eq!(beta_turns, 1);

        // The worker observes the cleared flag and emits nothing further
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
        let completed = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::SessionCompleted { .. }))
            .count();
        assert_eq!(completed, 1);
    }

    #[tokio::test]
    async fn test_stop_without_active_state_is_a_noop() {
        let store = MemStore::new();
        let (engine, mut rx) = build_engine(store, TestFactory::new());
        engine.stop(&SessionId::new("ghost")).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_initialize_twice_resets_without_emitting() {
        let store = MemStore::new();
        let id = SessionId::new("sess-1");
        store.seed(
            SessionRecord::new("sess-1", "t", "topic").with_max_rounds(3),
            vec![participant("p-a", "Alpha")],
        );

        let (engine, mut rx) = build_engine(store.clone(), TestFactory::new());
        engine.initialize(&id).await.unwrap();
        engine.initialize(&id).await.unwrap();

        // Initialize alone persists and emits nothing
        assert!(store.messages().is_empty());
        assert!(rx.try_recv().is_err());
        assert!(!engine.is_running(&id));

        // A run after the double initialize starts from round 1
        engine.start(&id).await.unwrap();
        let events = drain_until_completed(&mut rx).await;
        let first_round = events.iter().find_map(|e| match e {
            SessionEvent::RoundUpdate { current_round, .. } => Some(*current_round),
            _ => None,
        });
        assert_eq!(first_round, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_while_running_is_ignored() {
        let store = MemStore::new();
        let id = SessionId::new("sess-1");
        store.seed(
            SessionRecord::new("sess-1", "t", "topic").with_max_rounds(2),
            vec![participant("p-a", "Alpha")],
        );

        let (engine, mut rx) = build_engine(store.clone(), TestFactory::new());
        engine.start(&id).await.unwrap();
        engine.start(&id).await.unwrap();
        drain_until_completed(&mut rx).await;

        let kickoffs = store
            .messages()
            .iter()
            .filter(|m| m.body.contains("Welcome to the roundtable"))
            .count();
        assert_eq!(kickoffs, 1);
        // One worker only: kickoff + 2 turns + summary
        assert_eq!(store.messages().len(), 4);
    }

    #[tokio::test]
    async fn test_user_message_is_persisted_and_emitted_without_driving_turns() {
        let store = MemStore::new();
        let id = SessionId::new("sess-1");
        store.seed(
            SessionRecord::new("sess-1", "t", "topic"),
            vec![participant("p-a", "Alpha")],
        );

        let (engine, mut rx) = build_engine(store.clone(), TestFactory::new());
        engine.initialize(&id).await.unwrap();
        let message = engine
            .submit_user_message(&id, "Please consider costs.")
            .await
            .unwrap();

        assert_eq!(message.role, Role::User);
        assert!(message.participant_id.is_none());
        assert_eq!(store.messages().len(), 1);

        match rx.try_recv().unwrap() {
            SessionEvent::NewMessage { message: event_msg } => {
                assert_eq!(event_msg.id, message.id);
            }
            other => panic!("expected new_message, got {:?}", other.kind()),
        }
        // No round activity from an injection
        assert!(rx.try_recv().is_err());
        assert!(!engine.is_running(&id));
    }

    #[tokio::test]
    async fn test_user_message_for_unknown_session_is_not_found() {
        let store = MemStore::new();
        let (engine, _rx) = build_engine(store, TestFactory::new());
        let err = engine
            .submit_user_message(&SessionId::new("ghost"), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}

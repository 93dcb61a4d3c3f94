//! Simulator state machine
//!
//! [`SimulatorState`] is the single owner of everything the view shows:
//! the session registry, the visible transcript, the input field, the
//! typing indicator, and the new-contact form. It never performs I/O.
//! Operations that need the network return a ticket; the caller runs the
//! remote call however it likes and feeds the result back:
//!
//! - session changes return a [`LoadTicket`], completed with
//!   [`SimulatorState::apply_load`]
//! - sends return a [`SendTicket`], completed with
//!   [`SimulatorState::complete_send`]
//!
//! [`Simulator`] bundles the state with injected store and reply clients
//! and runs each operation to completion, for callers that don't need
//! interleaving.

use crate::error::Result;
use crate::message::{LocalIdGenerator, Message};
use crate::reply::ReplyService;
use crate::session::{Session, SessionId, SessionRegistry};
use crate::store::HistoryStore;
use std::sync::Arc;

pub mod composer;
pub mod loader;

pub use composer::{deliver, SendOutcome, SendPhase, SendTicket};
pub use loader::{fetch_history, History, LoadOutcome, LoadTicket};

/// Fields of the new-contact form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    /// Contact display name
    pub name: String,
    /// Contact key (number)
    pub contact_key: String,
}

/// UI-facing simulator state
#[derive(Debug, Default)]
pub struct SimulatorState {
    registry: SessionRegistry,
    messages: Vec<Message>,
    input_text: String,
    phase: SendPhase,
    in_flight: usize,
    modal_open: bool,
    form: ContactForm,
    generation: u64,
    ids: LocalIdGenerator,
}

impl SimulatorState {
    /// Empty state: no sessions, nothing active
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions, newest first
    pub fn sessions(&self) -> &[Session] {
        self.registry.list_sessions()
    }

    /// The session registry
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The active session, if any
    pub fn active_session(&self) -> Option<&Session> {
        self.registry.active()
    }

    /// Visible transcript
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Current input field contents
    pub fn input_text(&self) -> &str {
        &self.input_text
    }

    /// Replace the input field contents
    pub fn set_input_text(&mut self, text: impl Into<String>) {
        self.input_text = text.into();
    }

    /// Whether a reply is being awaited
    pub fn is_typing(&self) -> bool {
        self.phase == SendPhase::Sending
    }

    /// Phase of the most recent send event
    pub fn send_phase(&self) -> SendPhase {
        self.phase
    }

    /// Number of sends still waiting for the reply service
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Whether the new-contact form is open
    pub fn modal_open(&self) -> bool {
        self.modal_open
    }

    /// Current new-contact form fields
    pub fn form(&self) -> &ContactForm {
        &self.form
    }

    /// Open the new-contact form
    pub fn open_modal(&mut self) {
        self.modal_open = true;
    }

    /// Close the new-contact form, discarding its fields
    pub fn close_modal(&mut self) {
        self.modal_open = false;
        self.form = ContactForm::default();
    }

    /// Set the form's name field
    pub fn set_form_name(&mut self, name: impl Into<String>) {
        self.form.name = name.into();
    }

    /// Set the form's contact key field
    pub fn set_form_contact_key(&mut self, contact_key: impl Into<String>) {
        self.form.contact_key = contact_key.into();
    }

    /// Submit the new-contact form
    ///
    /// With a blank field nothing happens and the form stays open.
    /// Otherwise the session is created, the form is cleared and closed,
    /// and the new session's load ticket is returned.
    pub fn submit_form(&mut self) -> Option<LoadTicket> {
        let name = self.form.name.clone();
        let contact_key = self.form.contact_key.clone();
        let ticket = self.create_session(&name, &contact_key)?;
        self.close_modal();
        Some(ticket)
    }

    /// Create a session and make it active
    ///
    /// Blank values are a silent no-op.
    pub fn create_session(&mut self, name: &str, contact_key: &str) -> Option<LoadTicket> {
        let label = chrono::Local::now().format("%H:%M").to_string();
        self.registry.create_session(name, contact_key, &label)?;
        self.activate()
    }

    /// Change the active session
    ///
    /// Selecting the already active session or an unknown id changes
    /// nothing. Any other change clears the transcript; a load ticket is
    /// returned unless the selection is `None`.
    pub fn select_session(&mut self, id: Option<SessionId>) -> Option<LoadTicket> {
        let current = self.registry.active().map(Session::id);
        if current == id {
            return None;
        }
        if !self.registry.select_session(id) {
            return None;
        }
        self.activate()
    }

    /// Reload the active session's history
    pub fn reload(&mut self) -> Option<LoadTicket> {
        self.registry.active()?;
        self.activate()
    }

    fn activate(&mut self) -> Option<LoadTicket> {
        self.generation += 1;
        self.messages.clear();

        let session = self.registry.active()?;
        tracing::debug!(
            session = %session.id(),
            generation = self.generation,
            "Active session changed"
        );
        Some(LoadTicket {
            generation: self.generation,
            session: session.id(),
            contact_key: session.contact_key().to_string(),
        })
    }
}

/// Simulator state wired to its remote collaborators
#[derive(Debug)]
pub struct Simulator {
    state: SimulatorState,
    store: Arc<dyn HistoryStore>,
    replies: Arc<dyn ReplyService>,
}

impl Simulator {
    /// Create a simulator with injected clients
    pub fn new(store: Arc<dyn HistoryStore>, replies: Arc<dyn ReplyService>) -> Self {
        Self {
            state: SimulatorState::new(),
            store,
            replies,
        }
    }

    /// Read access to the state
    pub fn state(&self) -> &SimulatorState {
        &self.state
    }

    /// Write access to the state, for callers running tickets themselves
    pub fn state_mut(&mut self) -> &mut SimulatorState {
        &mut self.state
    }

    /// Shared handle to the history store
    pub fn store(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.store)
    }

    /// Shared handle to the reply service
    pub fn replies(&self) -> Arc<dyn ReplyService> {
        Arc::clone(&self.replies)
    }

    /// Create a session and load its history
    ///
    /// Returns `Ok(None)` when the values are blank.
    ///
    /// # Errors
    ///
    /// Returns the history load error
    pub async fn create_session(
        &mut self,
        name: &str,
        contact_key: &str,
    ) -> Result<Option<LoadOutcome>> {
        match self.state.create_session(name, contact_key) {
            Some(ticket) => self.run_load(ticket).await.map(Some),
            None => Ok(None),
        }
    }

    /// Change the active session and load its history
    ///
    /// # Errors
    ///
    /// Returns the history load error
    pub async fn select_session(&mut self, id: Option<SessionId>) -> Result<LoadOutcome> {
        let changes = self.state.active_session().map(Session::id) != id;
        match self.state.select_session(id) {
            Some(ticket) => self.run_load(ticket).await,
            None if changes && id.is_none() => Ok(LoadOutcome::Cleared),
            None => Ok(LoadOutcome::Unchanged),
        }
    }

    /// Reload the active session's history
    ///
    /// # Errors
    ///
    /// Returns the history load error
    pub async fn reload(&mut self) -> Result<LoadOutcome> {
        match self.state.reload() {
            Some(ticket) => self.run_load(ticket).await,
            None => Ok(LoadOutcome::Unchanged),
        }
    }

    /// Send a message from the active session and wait for the reply
    ///
    /// Returns `None` when the send preconditions are not met.
    pub async fn send(&mut self, text: &str) -> Option<SendOutcome> {
        let ticket = self.state.begin_send(text)?;
        let result = deliver(self.replies.as_ref(), &ticket).await;
        Some(self.state.complete_send(&ticket, result))
    }

    async fn run_load(&mut self, ticket: LoadTicket) -> Result<LoadOutcome> {
        let result = fetch_history(self.store.as_ref(), ticket.contact_key()).await;
        self.state.apply_load(&ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulatorError;
    use crate::message::{Direction, MessageId};
    use crate::test_utils::{at, stored, FakeReplyService, FakeStore};

    fn simulator(store: FakeStore, replies: FakeReplyService) -> (Simulator, Arc<FakeStore>) {
        let store = Arc::new(store);
        let sim = Simulator::new(store.clone(), Arc::new(replies));
        (sim, store)
    }

    #[test]
    fn test_create_session_activates_and_clears() {
        let mut state = SimulatorState::new();
        let ticket = state.create_session("Ana", "5511").unwrap();
        assert_eq!(state.active_session().unwrap().id(), ticket.session());
        assert_eq!(ticket.contact_key(), "5511");
    }

    #[test]
    fn test_blank_create_leaves_state_unchanged() {
        let mut state = SimulatorState::new();
        let ticket = state.create_session("Ana", "5511").unwrap();
        state
            .apply_load(
                &ticket,
                Ok(History::Messages(vec![stored(
                    "1",
                    "Oi",
                    Direction::Inbound,
                    at(0),
                )])),
            )
            .unwrap();

        assert!(state.create_session("", "5512").is_none());
        assert_eq!(state.sessions().len(), 1);
        assert_eq!(state.active_session().unwrap().contact_key(), "5511");
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn test_select_same_session_is_unchanged() {
        let mut state = SimulatorState::new();
        let ticket = state.create_session("Ana", "5511").unwrap();
        assert!(state.select_session(Some(ticket.session())).is_none());
    }

    #[test]
    fn test_form_submission() {
        let mut state = SimulatorState::new();
        state.open_modal();
        state.set_form_name("Ana");
        assert!(state.submit_form().is_none());
        assert!(state.modal_open());

        state.set_form_contact_key("5511999990000");
        let ticket = state.submit_form().unwrap();
        assert!(!state.modal_open());
        assert_eq!(state.form(), &ContactForm::default());
        assert_eq!(ticket.contact_key(), "5511999990000");
    }

    #[test]
    fn test_close_modal_discards_fields() {
        let mut state = SimulatorState::new();
        state.open_modal();
        state.set_form_name("Ana");
        state.close_modal();
        assert!(!state.modal_open());
        assert!(state.form().name.is_empty());
        assert!(state.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_deselect_clears_without_remote_calls() {
        let (mut sim, store) = simulator(
            FakeStore::new().with_conversation(
                "5511",
                "1",
                vec![stored("1", "Oi", Direction::Inbound, at(0))],
            ),
            FakeReplyService::replying("ok"),
        );
        sim.create_session("Ana", "5511").await.unwrap();
        assert_eq!(sim.state().messages().len(), 1);
        let calls = store.calls();

        let outcome = sim.select_session(None).await.unwrap();
        assert_eq!(outcome, LoadOutcome::Cleared);
        assert!(sim.state().messages().is_empty());
        assert!(sim.state().active_session().is_none());
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test]
    async fn test_new_contact_yields_empty_transcript() {
        let (mut sim, _) = simulator(FakeStore::new(), FakeReplyService::replying("ok"));
        let outcome = sim.create_session("Ana", "5511").await.unwrap();
        assert_eq!(outcome, Some(LoadOutcome::NewContact));
        assert!(sim.state().messages().is_empty());
    }

    #[tokio::test]
    async fn test_existing_conversation_is_loaded_in_order() {
        let t1 = at(0);
        let t2 = at(30);
        let (mut sim, _) = simulator(
            FakeStore::new().with_conversation(
                "5511999990000",
                "17",
                vec![
                    stored("a", "Oi", Direction::Inbound, t1),
                    stored("b", "Olá!", Direction::Outbound, t2),
                ],
            ),
            FakeReplyService::replying("ok"),
        );

        let outcome = sim.create_session("Ana", "5511999990000").await.unwrap();
        assert_eq!(outcome, Some(LoadOutcome::Loaded(2)));

        let messages = sim.state().messages();
        assert_eq!(messages[0].id, MessageId::Remote("a".to_string()));
        assert_eq!(messages[0].created_at, t1);
        assert_eq!(messages[1].id, MessageId::Remote("b".to_string()));
        assert_eq!(messages[1].created_at, t2);
    }

    #[tokio::test]
    async fn test_switching_sessions_replaces_transcript() {
        let (mut sim, _) = simulator(
            FakeStore::new()
                .with_conversation("1", "c1", vec![stored("a", "A", Direction::Inbound, at(0))])
                .with_conversation("2", "c2", vec![stored("b", "B", Direction::Inbound, at(0))]),
            FakeReplyService::replying("ok"),
        );
        sim.create_session("Ana", "1").await.unwrap();
        sim.send("optimistic").await.unwrap();
        assert_eq!(sim.state().messages().len(), 3);

        sim.create_session("Bia", "2").await.unwrap();
        let bodies: Vec<&str> = sim
            .state()
            .messages()
            .iter()
            .map(|m| m.body.as_str())
            .collect();
        assert_eq!(bodies, vec!["B"]);
    }

    #[tokio::test]
    async fn test_send_without_active_session_is_a_no_op() {
        let replies = FakeReplyService::replying("ok");
        let (mut sim, _) = simulator(FakeStore::new(), replies);
        sim.state_mut().set_input_text("Oi");

        assert!(sim.send("Oi").await.is_none());
        assert_eq!(sim.state().input_text(), "Oi");
        assert!(sim.state().messages().is_empty());
    }

    #[tokio::test]
    async fn test_send_appends_optimistic_message_before_reply() {
        let (mut sim, _) = simulator(FakeStore::new(), FakeReplyService::replying("ok"));
        sim.create_session("Ana", "5511").await.unwrap();
        sim.state_mut().set_input_text("Oi");

        let ticket = sim.state_mut().submit_input().unwrap();

        let state = sim.state();
        assert_eq!(state.input_text(), "");
        assert!(state.is_typing());
        let last = state.messages().last().unwrap();
        assert_eq!(last.body, "Oi");
        assert_eq!(last.direction, Direction::Inbound);
        assert!(last.is_local());
        assert_eq!(ticket.request().message, "Oi");
    }

    #[tokio::test]
    async fn test_successful_reply_is_appended() {
        let (mut sim, _) = simulator(
            FakeStore::new(),
            FakeReplyService::replying("Olá! Como posso ajudar?"),
        );
        sim.create_session("Ana", "5511").await.unwrap();

        let outcome = sim.send("Oi").await.unwrap();
        assert_eq!(outcome, SendOutcome::Settled);

        let messages = sim.state().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].direction, Direction::Inbound);
        assert_eq!(messages[1].direction, Direction::Outbound);
        assert_eq!(messages[1].body, "Olá! Como posso ajudar?");
        assert_ne!(messages[0].id, messages[1].id);
        assert!(!sim.state().is_typing());
    }

    #[tokio::test]
    async fn test_failed_reply_keeps_optimistic_message() {
        let (mut sim, _) = simulator(
            FakeStore::new(),
            FakeReplyService::failing("limite excedido"),
        );
        sim.create_session("Ana", "5511").await.unwrap();

        let outcome = sim.send("Oi").await.unwrap();
        let SendOutcome::Failed(notice) = outcome else {
            panic!("expected failure");
        };
        assert!(notice.contains("limite excedido"));

        let messages = sim.state().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].direction, Direction::Inbound);
        assert_eq!(messages[0].body, "Oi");
        assert!(!sim.state().is_typing());
        assert_eq!(sim.state().send_phase(), SendPhase::Failed);
    }

    #[test]
    fn test_send_during_load_keeps_optimistic_message() {
        let mut state = SimulatorState::new();
        let load = state.create_session("Ana", "5511").unwrap();
        let send = state.begin_send("Oi").unwrap();

        let outcome = state
            .apply_load(
                &load,
                Ok(History::Messages(vec![stored(
                    "1",
                    "old",
                    Direction::Inbound,
                    at(0),
                )])),
            )
            .unwrap();
        assert_eq!(outcome, LoadOutcome::Loaded(1));

        assert_eq!(
            state.complete_send(&send, Ok("Olá".to_string())),
            SendOutcome::Settled
        );

        let transcript: Vec<(&str, Direction)> = state
            .messages()
            .iter()
            .map(|m| (m.body.as_str(), m.direction))
            .collect();
        assert_eq!(
            transcript,
            vec![
                ("old", Direction::Inbound),
                ("Oi", Direction::Inbound),
                ("Olá", Direction::Outbound),
            ]
        );
    }

    #[test]
    fn test_reply_before_load_keeps_send_order() {
        let mut state = SimulatorState::new();
        let load = state.create_session("Ana", "5511").unwrap();
        let send = state.begin_send("Oi").unwrap();
        state.complete_send(&send, Ok("Olá".to_string()));

        state.apply_load(&load, Ok(History::NotStarted)).unwrap();

        let bodies: Vec<&str> = state.messages().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["Oi", "Olá"]);
    }

    #[tokio::test]
    async fn test_late_load_does_not_overwrite_newer_session() {
        let store = FakeStore::new()
            .with_conversation("A", "ca", vec![stored("a", "from A", Direction::Inbound, at(0))])
            .with_conversation("B", "cb", vec![stored("b", "from B", Direction::Inbound, at(0))]);

        let mut state = SimulatorState::new();
        let load_a = state.create_session("Ana", "A").unwrap();
        let load_b = state.create_session("Bia", "B").unwrap();

        let result_b = fetch_history(&store, load_b.contact_key()).await;
        assert_eq!(
            state.apply_load(&load_b, result_b).unwrap(),
            LoadOutcome::Loaded(1)
        );

        let result_a = fetch_history(&store, load_a.contact_key()).await;
        assert_eq!(
            state.apply_load(&load_a, result_a).unwrap(),
            LoadOutcome::Stale
        );

        assert_eq!(state.messages().len(), 1);
        assert_eq!(state.messages()[0].body, "from B");
    }

    #[tokio::test]
    async fn test_reselecting_earlier_session_invalidates_its_old_load() {
        let store = FakeStore::new()
            .with_conversation("A", "ca", vec![stored("a", "from A", Direction::Inbound, at(0))]);

        let mut state = SimulatorState::new();
        let first_a = state.create_session("Ana", "A").unwrap();
        let a_id = first_a.session();
        state.create_session("Bia", "B").unwrap();
        let second_a = state.select_session(Some(a_id)).unwrap();

        let late = fetch_history(&store, first_a.contact_key()).await;
        assert_eq!(state.apply_load(&first_a, late).unwrap(), LoadOutcome::Stale);
        assert!(state.messages().is_empty());

        let fresh = fetch_history(&store, second_a.contact_key()).await;
        assert_eq!(
            state.apply_load(&second_a, fresh).unwrap(),
            LoadOutcome::Loaded(1)
        );
    }

    #[tokio::test]
    async fn test_unconfigured_store_error_surfaces_on_load() {
        let (mut sim, _) = simulator(
            FakeStore::failing_with(SimulatorError::StoreNotConfigured),
            FakeReplyService::replying("ok"),
        );
        let err = sim.create_session("Ana", "5511").await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
        assert_eq!(sim.state().sessions().len(), 1);

        let outcome = sim.send("Oi").await.unwrap();
        assert_eq!(outcome, SendOutcome::Settled);
    }

    #[tokio::test]
    async fn test_reload_reflects_persisted_messages() {
        let (mut sim, _) = simulator(
            FakeStore::new().with_conversation(
                "5511",
                "1",
                vec![stored("1", "stored", Direction::Inbound, at(0))],
            ),
            FakeReplyService::replying("ok"),
        );
        sim.create_session("Ana", "5511").await.unwrap();
        sim.send("local").await.unwrap();
        assert_eq!(sim.state().messages().len(), 3);

        assert_eq!(sim.reload().await.unwrap(), LoadOutcome::Loaded(1));
        assert!(sim.state().messages().iter().all(|m| !m.is_local()));
    }
}

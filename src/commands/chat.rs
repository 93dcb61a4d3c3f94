//! Interactive simulator handler.
//!
//! All state lives in one [`ChatLoop`] owned by the event loop task. User
//! lines come from a rustyline reader on a dedicated thread; history loads
//! and reply calls run as spawned tasks. Everything reaches the loop as an
//! [`AppEvent`] over a single channel, so completions are applied one at a
//! time in arrival order.

use crate::commands::special_commands::{
    parse_special_command, print_help, SessionSelector, SpecialCommand,
};
use crate::config::Config;
use crate::error::Result;
use crate::reply::{HttpReplyService, ReplyService};
use crate::render;
use crate::simulator::{
    deliver, fetch_history, History, LoadOutcome, LoadTicket, SendOutcome, SendTicket,
    SimulatorState,
};
use crate::store::{HistoryStore, SupabaseStore};

use rand::Rng;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};

/// Input to the event loop
#[derive(Debug)]
pub enum AppEvent {
    /// A line typed by the user
    Line(String),
    /// CTRL-C at the prompt
    Interrupted,
    /// CTRL-D, or the line reader stopped
    Eof,
    /// A history load finished
    HistoryLoaded {
        ticket: LoadTicket,
        result: Result<History>,
    },
    /// A reply call finished
    ReplyReceived {
        ticket: SendTicket,
        result: Result<String>,
    },
}

/// Whether the loop should keep running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Generate a random contact as `(contact_key, name)`
///
/// # Examples
///
/// ```
/// use wasim::commands::chat::random_contact;
///
/// let (key, name) = random_contact("55119");
/// assert!(key.starts_with("55119"));
/// assert_eq!(key.len(), 9);
/// assert!(name.starts_with("New Customer ("));
/// ```
pub fn random_contact(prefix: &str) -> (String, String) {
    let suffix: u32 = rand::rng().random_range(1000..=9999);
    (
        format!("{}{}", prefix, suffix),
        format!("New Customer ({})", suffix),
    )
}

/// The simulator's event loop state
pub struct ChatLoop {
    state: SimulatorState,
    store: Arc<dyn HistoryStore>,
    replies: Arc<dyn ReplyService>,
    events: UnboundedSender<AppEvent>,
    assistant_label: String,
    random_prefix: String,
    endpoint: String,
    store_configured: bool,
}

impl ChatLoop {
    /// Create a loop posting completions to `events`
    pub fn new(
        config: &Config,
        store: Arc<dyn HistoryStore>,
        replies: Arc<dyn ReplyService>,
        events: UnboundedSender<AppEvent>,
        store_configured: bool,
    ) -> Self {
        Self {
            state: SimulatorState::new(),
            store,
            replies,
            events,
            assistant_label: config.chat.assistant_label.clone(),
            random_prefix: config.chat.random_contact_prefix.clone(),
            endpoint: format!(
                "{}{}",
                config.reply.base_url.trim_end_matches('/'),
                config.reply.endpoint_path
            ),
            store_configured,
        }
    }

    /// Current simulator state
    pub fn state(&self) -> &SimulatorState {
        &self.state
    }

    /// Apply one event
    pub fn handle_event(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Line(line) => self.handle_line(&line),
            AppEvent::Interrupted if self.state.modal_open() => {
                self.state.close_modal();
                Flow::Continue
            }
            AppEvent::Interrupted => {
                println!("CTRL-C");
                Flow::Exit
            }
            AppEvent::Eof => {
                println!("CTRL-D");
                Flow::Exit
            }
            AppEvent::HistoryLoaded { ticket, result } => {
                self.finish_load(&ticket, result);
                Flow::Continue
            }
            AppEvent::ReplyReceived { ticket, result } => {
                self.finish_send(&ticket, result);
                Flow::Continue
            }
        }
    }

    /// Create a contact and start loading its history
    pub fn create_contact(&mut self, name: &str, contact_key: &str) {
        match self.state.create_session(name, contact_key) {
            Some(ticket) => self.start_load(ticket),
            None => render::print_error("Name and number are both required"),
        }
    }

    fn handle_line(&mut self, line: &str) -> Flow {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Flow::Continue;
        }

        let command = match parse_special_command(trimmed) {
            Ok(command) => command,
            Err(e) => {
                render::print_error(&e.to_string());
                return Flow::Continue;
            }
        };

        if self.state.modal_open() {
            return self.handle_form_line(trimmed, command);
        }

        match command {
            SpecialCommand::NewContactForm => self.state.open_modal(),
            SpecialCommand::NewContact { contact_key, name } => {
                self.create_contact(&name, &contact_key)
            }
            SpecialCommand::RandomContact => {
                let (contact_key, name) = random_contact(&self.random_prefix);
                self.create_contact(&name, &contact_key);
            }
            SpecialCommand::Cancel => render::print_error("No form is open"),
            SpecialCommand::List => render::print_sessions(&self.state),
            SpecialCommand::Select(selector) => self.select(selector),
            SpecialCommand::Back => {
                // Deselecting never needs a load
                let _ = self.state.select_session(None);
                render::print_transcript(&self.state, &self.assistant_label);
            }
            SpecialCommand::Reload => match self.state.reload() {
                Some(ticket) => self.start_load(ticket),
                None => render::print_error("No active conversation to reload"),
            },
            SpecialCommand::ShowStatus => {
                render::print_status(&self.state, &self.endpoint, self.store_configured)
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit => return Flow::Exit,
            SpecialCommand::None => self.send(line),
        }
        Flow::Continue
    }

    fn handle_form_line(&mut self, line: &str, command: SpecialCommand) -> Flow {
        match command {
            SpecialCommand::Cancel => self.state.close_modal(),
            SpecialCommand::Exit => return Flow::Exit,
            SpecialCommand::None if self.state.form().name.is_empty() => {
                self.state.set_form_name(line)
            }
            SpecialCommand::None => {
                self.state.set_form_contact_key(line);
                if let Some(ticket) = self.state.submit_form() {
                    self.start_load(ticket);
                }
            }
            _ => render::print_error("Finish the new-contact form or type '/cancel'"),
        }
        Flow::Continue
    }

    fn select(&mut self, selector: SessionSelector) {
        let registry = self.state.registry();
        let found = match &selector {
            SessionSelector::Position(position) => registry.nth(*position),
            SessionSelector::ContactKey(key) => registry.find_by_contact_key(key),
        };
        let Some(id) = found.map(|s| s.id()) else {
            render::print_error("No such conversation; type '/list' to see them");
            return;
        };

        match self.state.select_session(Some(id)) {
            Some(ticket) => self.start_load(ticket),
            None => render::print_transcript(&self.state, &self.assistant_label),
        }
    }

    fn send(&mut self, text: &str) {
        self.state.set_input_text(text);
        let Some(ticket) = self.state.submit_input() else {
            render::print_error("No active conversation. Type '/new' to create one");
            return;
        };
        render::print_typing(&self.assistant_label);

        let replies = Arc::clone(&self.replies);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = deliver(replies.as_ref(), &ticket).await;
            // The loop only goes away on exit
            let _ = events.send(AppEvent::ReplyReceived { ticket, result });
        });
    }

    fn start_load(&self, ticket: LoadTicket) {
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = fetch_history(store.as_ref(), ticket.contact_key()).await;
            let _ = events.send(AppEvent::HistoryLoaded { ticket, result });
        });
    }

    fn finish_load(&mut self, ticket: &LoadTicket, result: Result<History>) {
        match self.state.apply_load(ticket, result) {
            Ok(LoadOutcome::Stale) => {}
            Ok(_) => render::print_transcript(&self.state, &self.assistant_label),
            Err(e) => {
                render::print_error(&format!("Error loading history: {}", e));
                render::print_transcript(&self.state, &self.assistant_label);
            }
        }
    }

    fn finish_send(&mut self, ticket: &SendTicket, result: Result<String>) {
        match self.state.complete_send(ticket, result) {
            SendOutcome::Settled => {
                if let Some(reply) = self.state.messages().last() {
                    render::print_message(reply, &self.assistant_label);
                }
            }
            SendOutcome::Detached => render::print_info(&format!(
                "Reply for {} arrived after switching conversations; select it and /reload to see it",
                ticket.request().name
            )),
            SendOutcome::Failed(message) => render::print_error(&format!("Error: {}", message)),
        }
    }
}

/// Run rustyline on its own thread
///
/// The thread reads one line per prompt received on the returned sender
/// and stops when the sender is dropped or input ends.
fn spawn_line_reader(events: UnboundedSender<AppEvent>) -> std::sync::mpsc::Sender<String> {
    let (prompts, prompt_rx) = std::sync::mpsc::channel::<String>();

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                tracing::error!("Failed to start line editor: {}", e);
                let _ = events.send(AppEvent::Eof);
                return;
            }
        };

        while let Ok(prompt) = prompt_rx.recv() {
            let event = match rl.readline(&prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        if let Err(e) = rl.add_history_entry(line.as_str()) {
                            tracing::debug!("Failed to add history entry: {}", e);
                        }
                    }
                    AppEvent::Line(line)
                }
                Err(ReadlineError::Interrupted) => AppEvent::Interrupted,
                Err(ReadlineError::Eof) => AppEvent::Eof,
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    AppEvent::Eof
                }
            };
            let done = matches!(event, AppEvent::Eof);
            if events.send(event).is_err() || done {
                break;
            }
        }
    });

    prompts
}

/// Start the interactive simulator
///
/// # Arguments
///
/// * `config` - Global configuration
/// * `initial_contact` - Optional `(name, number)` to open on startup
///
/// # Errors
///
/// Returns error if the store or reply clients cannot be created
pub async fn run_chat(config: Config, initial_contact: Option<(String, String)>) -> Result<()> {
    tracing::info!("Starting interactive simulator");

    let store = SupabaseStore::from_config(&config.store)?;
    let store_configured = store.is_configured();
    let replies = HttpReplyService::new(&config.reply)?;
    let endpoint = replies.endpoint().to_string();

    let (events, mut event_rx) = mpsc::unbounded_channel();
    let mut chat = ChatLoop::new(
        &config,
        Arc::new(store),
        Arc::new(replies),
        events.clone(),
        store_configured,
    );

    render::print_welcome_banner(&endpoint, store_configured);

    if let Some((name, contact_key)) = initial_contact {
        chat.create_contact(&name, &contact_key);
    }

    let prompts = spawn_line_reader(events);
    if prompts.send(render::prompt(chat.state())).is_err() {
        return Ok(());
    }

    while let Some(event) = event_rx.recv().await {
        let wants_prompt = matches!(event, AppEvent::Line(_) | AppEvent::Interrupted);
        if chat.handle_event(event) == Flow::Exit {
            break;
        }
        if wants_prompt && prompts.send(render::prompt(chat.state())).is_err() {
            break;
        }
    }

    println!("Goodbye!");
    Ok(())
}

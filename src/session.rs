//! Session registry
//!
//! A [`Session`] is one simulated contact created by the tester during
//! this run. The registry keeps them newest-first and owns the
//! active-session pointer. Nothing here is persisted; only the messages
//! exchanged for a contact live remotely.

use std::fmt;

/// Registry-assigned session identifier
///
/// Contact keys may repeat, so sessions are addressed by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One simulated contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    name: String,
    contact_key: String,
    created_label: String,
}

impl Session {
    /// Registry identifier
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display name of the contact
    pub fn name(&self) -> &str {
        &self.name
    }

    /// External contact key (phone number) sent to the backend as `wa_id`
    pub fn contact_key(&self) -> &str {
        &self.contact_key
    }

    /// Display-only creation label
    pub fn created_label(&self) -> &str {
        &self.created_label
    }
}

/// In-memory list of sessions plus the active pointer
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
    active: Option<SessionId>,
    next_id: u64,
}

impl SessionRegistry {
    /// Create an empty registry with no active session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session, make it active, and return it
    ///
    /// Returns `None` without touching the registry when either value is
    /// blank. Values are stored trimmed. Duplicate contact keys are
    /// allowed and produce distinct sessions.
    ///
    /// # Examples
    ///
    /// ```
    /// use wasim::session::SessionRegistry;
    ///
    /// let mut registry = SessionRegistry::new();
    /// let session = registry.create_session("Ana", "5511999990000", "12:00").unwrap();
    /// assert_eq!(registry.active().map(|s| s.id()), Some(session.id()));
    ///
    /// assert!(registry.create_session("  ", "5511", "12:00").is_none());
    /// assert_eq!(registry.len(), 1);
    /// ```
    pub fn create_session(
        &mut self,
        name: &str,
        contact_key: &str,
        created_label: &str,
    ) -> Option<Session> {
        let name = name.trim();
        let contact_key = contact_key.trim();
        if name.is_empty() || contact_key.is_empty() {
            return None;
        }

        self.next_id += 1;
        let session = Session {
            id: SessionId(self.next_id),
            name: name.to_string(),
            contact_key: contact_key.to_string(),
            created_label: created_label.to_string(),
        };

        self.sessions.insert(0, session.clone());
        self.active = Some(session.id);
        tracing::debug!(
            session = %session.id,
            contact_key = %session.contact_key,
            "Created session"
        );
        Some(session)
    }

    /// Point the active session at `id`, or at nothing
    ///
    /// Returns `false` and leaves the pointer unchanged when `id` is not
    /// in the registry.
    pub fn select_session(&mut self, id: Option<SessionId>) -> bool {
        if let Some(id) = id {
            if self.get(id).is_none() {
                tracing::warn!(session = %id, "Ignoring selection of unknown session");
                return false;
            }
        }
        self.active = id;
        true
    }

    /// Sessions, most recently created first
    pub fn list_sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// The active session, if any
    pub fn active(&self) -> Option<&Session> {
        self.active.and_then(|id| self.get(id))
    }

    /// Look up a session by id
    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Most recently created session with the given contact key
    pub fn find_by_contact_key(&self, contact_key: &str) -> Option<&Session> {
        let contact_key = contact_key.trim();
        self.sessions.iter().find(|s| s.contact_key == contact_key)
    }

    /// Session at a 1-based position in [`list_sessions`](Self::list_sessions)
    pub fn nth(&self, position: usize) -> Option<&Session> {
        position
            .checked_sub(1)
            .and_then(|index| self.sessions.get(index))
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session has been created yet
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

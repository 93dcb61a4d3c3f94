//! Conversation loader
//!
//! Whenever the active session changes the visible transcript is replaced
//! by the stored conversation for the new contact. Loads are never
//! cancelled; instead every load carries a [`LoadTicket`] stamped with the
//! active-session generation it was issued for, and a completion whose
//! generation is no longer current is discarded.

use super::SimulatorState;
use crate::error::Result;
use crate::message::Message;
use crate::session::SessionId;
use crate::store::HistoryStore;

/// A pending history load for one activation of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub(super) generation: u64,
    pub(super) session: SessionId,
    pub(super) contact_key: String,
}

impl LoadTicket {
    /// Session the load was issued for
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Contact key to resolve
    pub fn contact_key(&self) -> &str {
        &self.contact_key
    }

    /// Active-session generation at issue time
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What the store holds for a contact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum History {
    /// No conversation exists yet for the contact key
    NotStarted,
    /// Messages of the existing conversation, oldest first
    Messages(Vec<Message>),
}

/// Effect of a load on the visible transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The active session was cleared; no remote calls were made
    Cleared,
    /// The selection did not change the active session
    Unchanged,
    /// The contact has no stored conversation; transcript is empty
    NewContact,
    /// The transcript was replaced with this many stored messages
    Loaded(usize),
    /// The result arrived after another session change and was dropped
    Stale,
}

/// Fetch the stored history for a contact key
///
/// Issues the two sequential store reads: conversation lookup, then the
/// ordered message listing.
///
/// # Errors
///
/// Propagates store errors from either read
pub async fn fetch_history(store: &dyn HistoryStore, contact_key: &str) -> Result<History> {
    match store.find_conversation(contact_key).await? {
        Some(conversation) => {
            let messages = store.list_messages(&conversation).await?;
            Ok(History::Messages(messages))
        }
        None => {
            tracing::debug!(contact_key = %contact_key, "No stored conversation yet");
            Ok(History::NotStarted)
        }
    }
}

impl SimulatorState {
    /// Apply a finished load to the transcript
    ///
    /// Results for a superseded generation are dropped, including errors.
    /// A current result replaces the stored part of the transcript; messages
    /// sent since the session was activated are kept after it, in send
    /// order. A current error is returned to the caller for display.
    ///
    /// # Errors
    ///
    /// Returns the load error when the ticket is still current
    pub fn apply_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<History>,
    ) -> Result<LoadOutcome> {
        if ticket.generation != self.generation {
            tracing::debug!(
                session = %ticket.session,
                issued = ticket.generation,
                current = self.generation,
                "Discarding stale history load"
            );
            return Ok(LoadOutcome::Stale);
        }

        // Messages sent since activation stay after the stored rows
        let pending: Vec<Message> = self.messages.drain(..).filter(Message::is_local).collect();

        match result {
            Ok(History::NotStarted) => {
                self.messages = pending;
                Ok(LoadOutcome::NewContact)
            }
            Ok(History::Messages(mut messages)) => {
                let count = messages.len();
                messages.extend(pending);
                self.messages = messages;
                Ok(LoadOutcome::Loaded(count))
            }
            Err(e) => {
                tracing::warn!(session = %ticket.session, "History load failed: {}", e);
                self.messages = pending;
                Err(e)
            }
        }
    }
}

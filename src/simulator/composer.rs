//! Message composer
//!
//! Sending is split in two so the caller decides how to wait for the
//! network: [`SimulatorState::begin_send`] performs the optimistic append
//! and hands back a [`SendTicket`]; [`deliver`] calls the reply service;
//! [`SimulatorState::complete_send`] applies the outcome.
//!
//! The optimistic message is never reconciled with the identifier the
//! store later assigns; the next history load replaces it.

use super::SimulatorState;
use crate::error::Result;
use crate::message::Message;
use crate::reply::{ReplyRequest, ReplyService};
use crate::session::SessionId;
use chrono::Utc;
use std::fmt;

/// Phase of the most recent send
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendPhase {
    /// Nothing sent yet
    #[default]
    Idle,
    /// Waiting for the reply service
    Sending,
    /// The last call to finish returned a reply
    Settled,
    /// The last call to finish failed
    Failed,
}

impl fmt::Display for SendPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Sending => write!(f, "sending"),
            Self::Settled => write!(f, "settled"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// An in-flight send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    pub(super) generation: u64,
    pub(super) session: SessionId,
    pub(super) request: ReplyRequest,
}

impl SendTicket {
    /// Session the message was sent from
    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Payload for the reply service
    pub fn request(&self) -> &ReplyRequest {
        &self.request
    }
}

/// Result of a finished send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply was appended to the transcript
    Settled,
    /// A reply arrived after the active session changed; it was not
    /// appended to the other contact's transcript
    Detached,
    /// The send failed with this error text
    Failed(String),
}

/// Deliver a ticket's message to the reply service
///
/// # Errors
///
/// Propagates reply service errors
pub async fn deliver(service: &dyn ReplyService, ticket: &SendTicket) -> Result<String> {
    service.send_message(&ticket.request).await
}

impl SimulatorState {
    /// Start sending `text` from the active session
    ///
    /// No-op returning `None` when `text` is blank or no session is active.
    /// Otherwise clears the input field, appends the optimistic inbound
    /// message, and raises the typing indicator.
    pub fn begin_send(&mut self, text: &str) -> Option<SendTicket> {
        if text.trim().is_empty() {
            return None;
        }
        let session = self.registry.active()?;
        let request = ReplyRequest {
            wa_id: session.contact_key().to_string(),
            name: session.name().to_string(),
            message: text.to_string(),
        };
        let ticket = SendTicket {
            generation: self.generation,
            session: session.id(),
            request,
        };

        self.input_text.clear();
        let now = Utc::now();
        let id = self.ids.next_id(now);
        self.messages.push(Message::inbound(id, text, now));
        self.phase = SendPhase::Sending;
        self.in_flight += 1;

        tracing::debug!(session = %ticket.session, "Message queued for delivery");
        Some(ticket)
    }

    /// Send whatever is in the input field
    pub fn submit_input(&mut self) -> Option<SendTicket> {
        let text = self.input_text.clone();
        self.begin_send(&text)
    }

    /// Apply the reply service's answer for a ticket
    ///
    /// Always lowers the typing indicator. A failure keeps the optimistic
    /// message and appends nothing.
    pub fn complete_send(&mut self, ticket: &SendTicket, result: Result<String>) -> SendOutcome {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            Ok(reply) => {
                self.phase = SendPhase::Settled;
                if ticket.generation != self.generation {
                    tracing::debug!(
                        session = %ticket.session,
                        "Reply arrived after session change, not appending"
                    );
                    return SendOutcome::Detached;
                }
                let now = Utc::now();
                let id = self.ids.next_id(now);
                self.messages.push(Message::outbound(id, reply, now));
                SendOutcome::Settled
            }
            Err(e) => {
                self.phase = SendPhase::Failed;
                tracing::warn!(session = %ticket.session, "Send failed: {}", e);
                SendOutcome::Failed(e.to_string())
            }
        }
    }
}

//! Remote history store abstraction
//!
//! The simulator only ever reads from the store: it resolves a contact key
//! to a conversation and lists that conversation's messages. Writes happen
//! on the backend side when it processes a simulated message.
//!
//! - [`HistoryStore`] is the seam the simulator depends on.
//! - [`supabase::SupabaseStore`] talks to a Supabase (PostgREST) project.

use crate::error::{Result, SimulatorError};
use crate::message::{Direction, Message, MessageId};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;

pub mod supabase;

pub use supabase::SupabaseStore;

/// Opaque store-side conversation identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    /// Wrap an identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as sent back to the store in filters
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build from a JSON value that may be a string or a number
    pub(crate) fn from_json(value: &serde_json::Value) -> Result<Self> {
        json_identifier(value).map(Self).ok_or_else(|| {
            SimulatorError::Store(format!("Unsupported conversation id: {}", value)).into()
        })
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read-only view of the remote history store
#[async_trait]
pub trait HistoryStore: Send + Sync + fmt::Debug {
    /// Resolve a contact key to its conversation, if one exists yet
    ///
    /// # Errors
    ///
    /// Returns error on transport failures, non-success responses, or when
    /// the store is not configured
    async fn find_conversation(&self, contact_key: &str) -> Result<Option<ConversationId>>;

    /// All messages of a conversation, ordered by creation time ascending
    ///
    /// # Errors
    ///
    /// Returns error on transport failures, non-success responses,
    /// undecodable rows, or when the store is not configured
    async fn list_messages(&self, conversation: &ConversationId) -> Result<Vec<Message>>;
}

/// Row of the messages table as returned by the store
#[derive(Debug, Deserialize)]
pub(crate) struct MessageRow {
    pub id: serde_json::Value,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub direction: Option<String>,
    pub created_at: String,
}

impl MessageRow {
    /// Convert a stored row into a transcript message
    pub(crate) fn into_message(self) -> Result<Message> {
        let id = json_identifier(&self.id).ok_or_else(|| {
            SimulatorError::Store(format!("Unsupported message id: {}", self.id))
        })?;
        let created_at = parse_timestamp(&self.created_at)?;
        let direction = Direction::from_store(self.direction.as_deref().unwrap_or_default());

        Ok(Message {
            id: MessageId::Remote(id),
            body: self.body.unwrap_or_default(),
            direction,
            created_at,
        })
    }
}

fn json_identifier(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a store timestamp
///
/// Accepts RFC 3339 with an offset (`timestamptz`) and naive timestamps
/// (`timestamp`), the latter interpreted as UTC.
///
/// # Errors
///
/// Returns a store error when neither format matches
///
/// # Examples
///
/// ```
/// use wasim::store::parse_timestamp;
///
/// let with_offset = parse_timestamp("2024-05-01T12:00:00.123456+00:00").unwrap();
/// let naive = parse_timestamp("2024-05-01T12:00:00.123456").unwrap();
/// assert_eq!(with_offset, naive);
/// ```
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    Err(SimulatorError::Store(format!("Invalid created_at timestamp: {}", value)).into())
}

/// Order messages by creation time, keeping store order for ties
pub(crate) fn sort_chronologically(messages: &mut [Message]) {
    messages.sort_by_key(|m| m.created_at);
}

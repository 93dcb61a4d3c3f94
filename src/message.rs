//! Chat message types
//!
//! A [`Message`] is one chat turn as shown in the transcript. Messages
//! loaded from the history store carry the store's identifier; messages
//! created locally (optimistic sends and received replies) carry a
//! locally generated one and are never reconciled with the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The simulated customer (the tester)
    Inbound,
    /// The AI backend
    Outbound,
}

impl Direction {
    /// Interpret a direction value stored by the backend
    ///
    /// Anything other than `inbound` is treated as the AI side.
    ///
    /// # Examples
    ///
    /// ```
    /// use wasim::message::Direction;
    ///
    /// assert_eq!(Direction::from_store("inbound"), Direction::Inbound);
    /// assert_eq!(Direction::from_store("outbound"), Direction::Outbound);
    /// assert_eq!(Direction::from_store("system"), Direction::Outbound);
    /// ```
    pub fn from_store(value: &str) -> Self {
        if value.eq_ignore_ascii_case("inbound") {
            Self::Inbound
        } else {
            Self::Outbound
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbound => write!(f, "inbound"),
            Self::Outbound => write!(f, "outbound"),
        }
    }
}

/// Message identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum MessageId {
    /// Temporary identifier assigned by this process
    Local(u64),
    /// Identifier assigned by the history store
    Remote(String),
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(id) => write!(f, "local-{}", id),
            Self::Remote(id) => write!(f, "{}", id),
        }
    }
}

/// One chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Local or store-assigned identifier
    pub id: MessageId,
    /// Message text
    pub body: String,
    /// Author side
    pub direction: Direction,
    /// Creation time; ascending order is conversation order
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a locally authored customer message
    pub fn inbound(id: MessageId, body: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            body: body.into(),
            direction: Direction::Inbound,
            created_at,
        }
    }

    /// Create an AI reply message
    pub fn outbound(id: MessageId, body: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            body: body.into(),
            direction: Direction::Outbound,
            created_at,
        }
    }

    /// Whether the message was created by this process rather than loaded
    pub fn is_local(&self) -> bool {
        matches!(self.id, MessageId::Local(_))
    }
}

/// Source of fresh local message identifiers
///
/// Identifiers are millisecond timestamps, bumped when two are requested
/// within the same millisecond so they stay strictly increasing.
#[derive(Debug, Default)]
pub struct LocalIdGenerator {
    last: u64,
}

impl LocalIdGenerator {
    /// Create a generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Next identifier for a message created at `now`
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use wasim::message::{LocalIdGenerator, MessageId};
    ///
    /// let mut ids = LocalIdGenerator::new();
    /// let now = Utc::now();
    /// let first = ids.next_id(now);
    /// let second = ids.next_id(now);
    /// assert_ne!(first, second);
    /// ```
    pub fn next_id(&mut self, now: DateTime<Utc>) -> MessageId {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        self.last = millis.max(self.last + 1);
        MessageId::Local(self.last)
    }
}

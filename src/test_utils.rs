//! Test utilities for wasim
//!
//! This module provides in-memory fakes for the history store and the
//! reply service, message builders, temporary file helpers, and assertion
//! helpers.

use crate::config::Config;
use crate::error::{Result, SimulatorError};
use crate::message::{Direction, Message, MessageId};
use crate::reply::{ReplyRequest, ReplyService};
use crate::store::{ConversationId, HistoryStore};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// Create a test configuration with default values
pub fn test_config() -> Config {
    Config::default()
}

/// Create a test configuration YAML string
pub fn test_config_yaml() -> String {
    r#"
reply:
  base_url: http://localhost:8000
  timeout_seconds: 30

store:
  url: https://project.supabase.co
  anon_key: test-anon-key

chat:
  assistant_label: Bruna
  random_contact_prefix: "55119"
"#
    .to_string()
}

/// Fixed instant `secs` seconds after 2024-05-01T12:00:00Z
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
        + chrono::Duration::seconds(secs)
}

/// A message as it would come back from the history store
pub fn stored(id: &str, body: &str, direction: Direction, created_at: DateTime<Utc>) -> Message {
    Message {
        id: MessageId::Remote(id.to_string()),
        body: body.to_string(),
        direction,
        created_at,
    }
}

/// In-memory [`HistoryStore`]
///
/// Counts every read so tests can assert which remote calls were made.
#[derive(Debug, Default)]
pub struct FakeStore {
    conversations: HashMap<String, String>,
    messages: HashMap<String, Vec<Message>>,
    failure: Mutex<Option<SimulatorError>>,
    fail_with: Option<String>,
    calls: AtomicUsize,
}

impl FakeStore {
    /// Store with no conversations
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a conversation for `contact_key` holding `messages`
    pub fn with_conversation(
        mut self,
        contact_key: &str,
        conversation_id: &str,
        messages: Vec<Message>,
    ) -> Self {
        self.conversations
            .insert(contact_key.to_string(), conversation_id.to_string());
        self.messages.insert(conversation_id.to_string(), messages);
        self
    }

    /// Store whose reads fail with a [`SimulatorError::Store`]
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Store whose first read fails with `error`; later reads fail with a
    /// generic store error
    pub fn failing_with(error: SimulatorError) -> Self {
        Self {
            failure: Mutex::new(Some(error)),
            fail_with: Some("unavailable".to_string()),
            ..Self::default()
        }
    }

    /// Number of reads issued so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn read(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.lock().expect("lock").take() {
            return Err(error.into());
        }
        match &self.fail_with {
            Some(message) => Err(SimulatorError::Store(message.clone()).into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl HistoryStore for FakeStore {
    async fn find_conversation(&self, contact_key: &str) -> Result<Option<ConversationId>> {
        self.read()?;
        Ok(self
            .conversations
            .get(contact_key)
            .map(|id| ConversationId::new(id.clone())))
    }

    async fn list_messages(&self, conversation: &ConversationId) -> Result<Vec<Message>> {
        self.read()?;
        Ok(self
            .messages
            .get(conversation.as_str())
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory [`ReplyService`] that records every request
#[derive(Debug)]
pub struct FakeReplyService {
    answer: std::result::Result<String, String>,
    requests: Mutex<Vec<ReplyRequest>>,
}

impl FakeReplyService {
    /// Service answering every message with `reply`
    pub fn replying(reply: &str) -> Self {
        Self {
            answer: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Service rejecting every message with `detail`
    pub fn failing(detail: &str) -> Self {
        Self {
            answer: Err(detail.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<ReplyRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ReplyService for FakeReplyService {
    async fn send_message(&self, request: &ReplyRequest) -> Result<String> {
        self.requests.lock().expect("lock").push(request.clone());
        match &self.answer {
            Ok(reply) => Ok(reply.clone()),
            Err(detail) => Err(SimulatorError::Reply(detail.clone()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_file() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "test.txt", "content");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content");
    }

    #[test]
    fn test_assert_error_contains_success() {
        let result: Result<()> = Err(SimulatorError::Config("test error message".into()).into());
        assert_error_contains(result, "test error");
    }

    #[test]
    #[should_panic(expected = "Expected error containing")]
    fn test_assert_error_contains_ok() {
        assert_error_contains(Ok(()), "error");
    }

    #[test]
    fn test_test_config_yaml_is_valid() {
        let config: Config = serde_yaml::from_str(&test_config_yaml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.reply.timeout_seconds, Some(30));
        assert!(config.store.has_credentials());
        assert!(test_config().validate().is_ok());
    }

    #[tokio::test]
    async fn test_fake_store_failing_with_once() {
        let store = FakeStore::failing_with(SimulatorError::StoreNotConfigured);
        let err = store.find_conversation("1").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimulatorError>(),
            Some(SimulatorError::StoreNotConfigured)
        ));
        assert_eq!(store.calls(), 1);
    }
}

//! Supabase (PostgREST) history store
//!
//! Queries the `conversations` and `messages` tables through the project's
//! REST endpoint (`{url}/rest/v1/{table}`), authenticating with the anon
//! key both as `apikey` and as a bearer token.
//!
//! A store built without credentials is kept in an unconfigured state:
//! construction succeeds so the rest of the simulator stays usable, and
//! every query fails with [`SimulatorError::StoreNotConfigured`].

use super::{sort_chronologically, ConversationId, HistoryStore, MessageRow};
use crate::config::StoreConfig;
use crate::error::{Result, SimulatorError};
use crate::message::Message;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use url::Url;

/// History store backed by a Supabase project
#[derive(Debug)]
pub struct SupabaseStore {
    connection: Option<Connection>,
    conversations_table: String,
    messages_table: String,
}

#[derive(Debug)]
struct Connection {
    client: Client,
    rest_base: Url,
    anon_key: String,
}

/// Row of the conversations table (only the selected column)
#[derive(Debug, Deserialize)]
struct ConversationRow {
    id: serde_json::Value,
}

impl SupabaseStore {
    /// Build a store from configuration
    ///
    /// Missing credentials are logged at error level and produce an
    /// unconfigured store rather than an error.
    ///
    /// # Errors
    ///
    /// Returns error if the project URL is present but invalid, or if the
    /// HTTP client cannot be created
    ///
    /// # Examples
    ///
    /// ```
    /// use wasim::config::StoreConfig;
    /// use wasim::store::SupabaseStore;
    ///
    /// let store = SupabaseStore::from_config(&StoreConfig::default()).unwrap();
    /// assert!(!store.is_configured());
    /// ```
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let connection = if config.has_credentials() {
            let url = config.url.as_deref().unwrap_or_default().trim();
            let anon_key = config.anon_key.as_deref().unwrap_or_default().trim();
            Some(Connection::new(url, anon_key)?)
        } else {
            tracing::error!(
                "History store credentials missing (store.url / store.anon_key); \
                 conversation history will be unavailable"
            );
            None
        };

        Ok(Self {
            connection,
            conversations_table: config.conversations_table.clone(),
            messages_table: config.messages_table.clone(),
        })
    }

    /// Whether the store has credentials and can issue queries
    pub fn is_configured(&self) -> bool {
        self.connection.is_some()
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| SimulatorError::StoreNotConfigured.into())
    }
}

impl Connection {
    fn new(url: &str, anon_key: &str) -> Result<Self> {
        let project = Url::parse(url)
            .map_err(|e| SimulatorError::Config(format!("Invalid store URL '{}': {}", url, e)))?;
        let rest_base = project
            .join("rest/v1/")
            .map_err(|e| SimulatorError::Config(format!("Invalid store URL '{}': {}", url, e)))?;

        let client = Client::builder()
            .user_agent(concat!("wasim/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SimulatorError::Store(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized history store: {}", rest_base);

        Ok(Self {
            client,
            rest_base,
            anon_key: anon_key.to_string(),
        })
    }

    fn get(&self, table: &str) -> Result<RequestBuilder> {
        let url = self
            .rest_base
            .join(table)
            .map_err(|e| SimulatorError::Store(format!("Invalid table name '{}': {}", table, e)))?;

        Ok(self
            .client
            .get(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Accept", "application/json"))
    }

    async fn fetch_rows<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<Vec<T>> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("History store request for {} failed: {}", what, e);
            SimulatorError::Store(format!("Request for {} failed: {}", what, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("History store returned {} for {}: {}", status, what, error_text);
            return Err(SimulatorError::Store(format!(
                "Store returned {} for {}: {}",
                status, what, error_text
            ))
            .into());
        }

        response.json().await.map_err(|e| {
            tracing::error!("Failed to decode {} rows: {}", what, e);
            SimulatorError::Store(format!("Failed to decode {} rows: {}", what, e)).into()
        })
    }
}

#[async_trait]
impl HistoryStore for SupabaseStore {
    async fn find_conversation(&self, contact_key: &str) -> Result<Option<ConversationId>> {
        let connection = self.connection()?;
        let wa_filter = format!("eq.{}", contact_key);
        let request = connection.get(&self.conversations_table)?.query(&[
            ("select", "id"),
            ("wa_id", wa_filter.as_str()),
            ("limit", "1"),
        ]);

        tracing::debug!(contact_key = %contact_key, "Resolving conversation");
        let rows: Vec<ConversationRow> = connection.fetch_rows(request, "conversation").await?;

        match rows.first() {
            Some(row) => ConversationId::from_json(&row.id).map(Some),
            None => Ok(None),
        }
    }

    async fn list_messages(&self, conversation: &ConversationId) -> Result<Vec<Message>> {
        let connection = self.connection()?;
        let conversation_filter = format!("eq.{}", conversation);
        let request = connection.get(&self.messages_table)?.query(&[
            ("select", "*"),
            ("conversation_id", conversation_filter.as_str()),
            ("order", "created_at.asc"),
        ]);

        tracing::debug!(conversation = %conversation, "Listing messages");
        let rows: Vec<MessageRow> = connection.fetch_rows(request, "messages").await?;

        let mut messages = rows
            .into_iter()
            .map(MessageRow::into_message)
            .collect::<Result<Vec<_>>>()?;
        sort_chronologically(&mut messages);

        tracing::debug!(
            conversation = %conversation,
            count = messages.len(),
            "Loaded messages"
        );
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> StoreConfig {
        StoreConfig {
            url: Some("https://project.supabase.co".to_string()),
            anon_key: Some("anon".to_string()),
            ..StoreConfig::default()
        }
    }

    #[test]
    fn test_store_without_credentials_is_unconfigured() {
        let store = SupabaseStore::from_config(&StoreConfig::default()).unwrap();
        assert!(!store.is_configured());
    }

    #[test]
    fn test_store_with_credentials_is_configured() {
        let store = SupabaseStore::from_config(&configured()).unwrap();
        assert!(store.is_configured());
    }

    #[test]
    fn test_rest_base_keeps_project_path() {
        let mut config = configured();
        config.url = Some("http://localhost:54321".to_string());
        let store = SupabaseStore::from_config(&config).unwrap();
        let connection = store.connection().unwrap();
        assert_eq!(
            connection.rest_base.as_str(),
            "http://localhost:54321/rest/v1/"
        );
    }

    #[test]
    fn test_invalid_store_url_is_an_error() {
        let mut config = configured();
        config.url = Some("not a url".to_string());
        assert!(SupabaseStore::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_store_queries_fail() {
        let store = SupabaseStore::from_config(&StoreConfig::default()).unwrap();

        let err = store.find_conversation("5511").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimulatorError>(),
            Some(SimulatorError::StoreNotConfigured)
        ));

        let err = store
            .list_messages(&ConversationId::new("1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SimulatorError>(),
            Some(SimulatorError::StoreNotConfigured)
        ));
    }
}

//! Configuration management for wasim
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, SimulatorError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure for wasim
///
/// Holds everything the entry point needs to build the reply service
/// client, the history store client, and the chat surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote reply service settings
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Remote history store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Reply service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    /// Base URL of the conversational backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the simulator endpoint, appended to `base_url`
    #[serde(default = "default_endpoint_path")]
    pub endpoint_path: String,

    /// Optional request timeout in seconds
    ///
    /// `None` waits indefinitely for a response or a transport error.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_endpoint_path() -> String {
    "/simulator/message".to_string()
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            endpoint_path: default_endpoint_path(),
            timeout_seconds: None,
        }
    }
}

impl ReplyConfig {
    /// Full URL of the simulator endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the base URL or the joined URL cannot be parsed
    ///
    /// # Examples
    ///
    /// ```
    /// use wasim::config::ReplyConfig;
    ///
    /// let config = ReplyConfig::default();
    /// let url = config.endpoint_url().unwrap();
    /// assert_eq!(url.as_str(), "http://localhost:8000/simulator/message");
    /// ```
    pub fn endpoint_url(&self) -> Result<Url> {
        let joined = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint_path
        );
        Url::parse(&joined).map_err(|e| {
            SimulatorError::Config(format!("Invalid reply endpoint '{}': {}", joined, e)).into()
        })
    }
}

/// History store configuration (Supabase REST)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`
    #[serde(default)]
    pub url: Option<String>,

    /// Anonymous API key sent as `apikey` and bearer token
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Table holding one row per contact
    #[serde(default = "default_conversations_table")]
    pub conversations_table: String,

    /// Table holding chat turns
    #[serde(default = "default_messages_table")]
    pub messages_table: String,

    /// Refuse to start without store credentials
    #[serde(default)]
    pub required: bool,
}

fn default_conversations_table() -> String {
    "conversations".to_string()
}

fn default_messages_table() -> String {
    "messages".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            conversations_table: default_conversations_table(),
            messages_table: default_messages_table(),
            required: false,
        }
    }
}

impl StoreConfig {
    /// Whether both the project URL and the API key are present and non-blank
    pub fn has_credentials(&self) -> bool {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.url) && present(&self.anon_key)
    }
}

/// Chat surface configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Label shown next to AI replies
    #[serde(default = "default_assistant_label")]
    pub assistant_label: String,

    /// Prefix for auto-generated contact numbers (`/random`)
    #[serde(default = "default_random_contact_prefix")]
    pub random_contact_prefix: String,
}

fn default_assistant_label() -> String {
    "Bruna".to_string()
}

fn default_random_contact_prefix() -> String {
    "55119".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            assistant_label: default_assistant_label(),
            random_contact_prefix: default_random_contact_prefix(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SimulatorError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| SimulatorError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("WASIM_BACKEND_URL") {
            tracing::debug!(base_url = %base_url, "Env override: WASIM_BACKEND_URL");
            self.reply.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("WASIM_REPLY_TIMEOUT_SECONDS") {
            match timeout.parse::<u64>() {
                Ok(v) => {
                    self.reply.timeout_seconds = Some(v);
                    tracing::debug!(timeout = v, "Env override: WASIM_REPLY_TIMEOUT_SECONDS");
                }
                Err(_) => {
                    tracing::warn!("Invalid WASIM_REPLY_TIMEOUT_SECONDS: {}", timeout);
                }
            }
        }

        if let Ok(url) = std::env::var("WASIM_SUPABASE_URL") {
            tracing::debug!(url = %url, "Env override: WASIM_SUPABASE_URL");
            self.store.url = Some(url);
        }

        if let Ok(key) = std::env::var("WASIM_SUPABASE_ANON_KEY") {
            tracing::debug!("Env override: WASIM_SUPABASE_ANON_KEY");
            self.store.anon_key = Some(key);
        }

        if let Ok(required) = std::env::var("WASIM_STORE_REQUIRED") {
            match required.parse::<bool>() {
                Ok(v) => {
                    self.store.required = v;
                    tracing::debug!(required = v, "Env override: WASIM_STORE_REQUIRED");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for WASIM_STORE_REQUIRED: {}", required);
                }
            }
        }

        if let Ok(label) = std::env::var("WASIM_ASSISTANT_LABEL") {
            self.chat.assistant_label = label;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.backend_url {
            tracing::debug!(base_url = %base_url, "CLI override: --backend-url");
            self.reply.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// Missing store credentials only fail validation when
    /// `store.required` is set; otherwise the store soft-fails at runtime.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.reply.base_url).map_err(|e| {
            SimulatorError::Config(format!(
                "reply.base_url '{}' is not a valid URL: {}",
                self.reply.base_url, e
            ))
        })?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(SimulatorError::Config(format!(
                "reply.base_url must use http or https, got '{}'",
                base.scheme()
            ))
            .into());
        }

        if !self.reply.endpoint_path.starts_with('/') {
            return Err(SimulatorError::Config(
                "reply.endpoint_path must start with '/'".to_string(),
            )
            .into());
        }

        if self.reply.timeout_seconds == Some(0) {
            return Err(SimulatorError::Config(
                "reply.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.store.conversations_table.trim().is_empty()
            || self.store.messages_table.trim().is_empty()
        {
            return Err(
                SimulatorError::Config("store table names cannot be empty".to_string()).into(),
            );
        }

        if let Some(url) = self.store.url.as_deref().filter(|u| !u.trim().is_empty()) {
            Url::parse(url).map_err(|e| {
                SimulatorError::Config(format!("store.url '{}' is not a valid URL: {}", url, e))
            })?;
        }

        if self.store.required && !self.store.has_credentials() {
            return Err(SimulatorError::Config(
                "store.required is set but store.url or store.anon_key is missing".to_string(),
            )
            .into());
        }

        if self.chat.random_contact_prefix.chars().any(|c| !c.is_ascii_digit()) {
            return Err(SimulatorError::Config(
                "chat.random_contact_prefix must contain only digits".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

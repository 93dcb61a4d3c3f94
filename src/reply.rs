//! Remote reply service
//!
//! The conversational backend exposes a simulator endpoint that accepts a
//! message as if it came from a WhatsApp contact and answers with the AI's
//! reply:
//!
//! ```text
//! POST {base_url}/simulator/message
//! {"wa_id": "5511999990000", "name": "Ana", "message": "Oi"}
//!
//! 200 {"reply": "Olá! Como posso ajudar?"}
//! 4xx/5xx {"detail": "limite excedido"}
//! ```

use crate::config::ReplyConfig;
use crate::error::{Result, SimulatorError};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Message used when a failed response carries no `detail`
pub const GENERIC_FAILURE: &str = "Failed to send message";

/// Payload posted to the simulator endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyRequest {
    /// Contact key of the simulated customer
    pub wa_id: String,
    /// Display name of the simulated customer
    pub name: String,
    /// Message text, sent as typed
    pub message: String,
}

/// The conversational backend, as seen by the message composer
#[async_trait]
pub trait ReplyService: Send + Sync + std::fmt::Debug {
    /// Deliver a customer message and return the AI's reply text
    ///
    /// # Errors
    ///
    /// Returns [`SimulatorError::Reply`] with the service's `detail` on a
    /// non-success status, [`SimulatorError::MalformedReply`] when a
    /// success response has no reply, and a transport error otherwise
    async fn send_message(&self, request: &ReplyRequest) -> Result<String>;
}

/// HTTP implementation of [`ReplyService`]
#[derive(Debug)]
pub struct HttpReplyService {
    client: Client,
    endpoint: Url,
}

#[derive(Debug, Deserialize)]
struct ReplyBody {
    #[serde(default)]
    reply: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl HttpReplyService {
    /// Create a client for the configured endpoint
    ///
    /// No timeout is applied unless `timeout_seconds` is set.
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint URL is invalid or the HTTP client
    /// cannot be created
    ///
    /// # Examples
    ///
    /// ```
    /// use wasim::config::ReplyConfig;
    /// use wasim::reply::HttpReplyService;
    ///
    /// let service = HttpReplyService::new(&ReplyConfig::default()).unwrap();
    /// assert_eq!(service.endpoint().path(), "/simulator/message");
    /// ```
    pub fn new(config: &ReplyConfig) -> Result<Self> {
        let endpoint = config.endpoint_url()?;

        let mut builder = Client::builder().user_agent(concat!("wasim/", env!("CARGO_PKG_VERSION")));
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }
        let client = builder
            .build()
            .map_err(|e| SimulatorError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized reply service: endpoint={}, timeout={:?}",
            endpoint,
            config.timeout_seconds
        );

        Ok(Self { client, endpoint })
    }

    /// The endpoint messages are posted to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyService for HttpReplyService {
    async fn send_message(&self, request: &ReplyRequest) -> Result<String> {
        tracing::debug!(
            wa_id = %request.wa_id,
            chars = request.message.chars().count(),
            "Posting simulated message"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Reply service request failed: {}", e);
                SimulatorError::Http(e)
            })?;

        let status = response.status();
        let text = response.text().await.map_err(SimulatorError::Http)?;

        if !status.is_success() {
            let message = failure_message(&text);
            tracing::error!("Reply service returned {}: {}", status, message);
            return Err(SimulatorError::Reply(message).into());
        }

        let body: ReplyBody = serde_json::from_str(&text).map_err(|e| {
            tracing::error!("Failed to parse reply service response: {}", e);
            SimulatorError::MalformedReply(e.to_string())
        })?;

        match body.reply {
            Some(serde_json::Value::String(reply)) => {
                tracing::debug!(chars = reply.chars().count(), "Received reply");
                Ok(reply)
            }
            Some(other) => Err(SimulatorError::MalformedReply(format!(
                "reply is not a string: {}",
                other
            ))
            .into()),
            None => Err(SimulatorError::MalformedReply("missing reply field".to_string()).into()),
        }
    }
}

/// Error text for a non-success response body
///
/// A string `detail` is used verbatim; structured details (validation
/// errors) are rendered as compact JSON; anything else falls back to
/// [`GENERIC_FAILURE`].
///
/// # Examples
///
/// ```
/// use wasim::reply::{failure_message, GENERIC_FAILURE};
///
/// assert_eq!(failure_message(r#"{"detail":"limite excedido"}"#), "limite excedido");
/// assert_eq!(failure_message("<html>502</html>"), GENERIC_FAILURE);
/// ```
pub fn failure_message(body: &str) -> String {
    let detail = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail);

    match detail {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Some(serde_json::Value::Null) | None => GENERIC_FAILURE.to_string(),
        Some(serde_json::Value::String(_)) => GENERIC_FAILURE.to_string(),
        Some(other) => other.to_string(),
    }
}

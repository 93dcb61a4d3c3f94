//! One-shot send: post a single message as a contact and print the reply.

use crate::config::Config;
use crate::error::{Result, SimulatorError};
use crate::reply::HttpReplyService;
use crate::simulator::{LoadOutcome, SendOutcome, Simulator};
use crate::store::SupabaseStore;
use std::sync::Arc;

/// Handle the send command
///
/// # Errors
///
/// Returns error if the clients cannot be created, the message is blank,
/// or the reply service call fails
pub async fn run_send(config: &Config, contact_key: &str, name: &str, message: &str) -> Result<()> {
    let store = SupabaseStore::from_config(&config.store)?;
    let replies = HttpReplyService::new(&config.reply)?;
    let mut simulator = Simulator::new(Arc::new(store), Arc::new(replies));

    let reply = send_once(&mut simulator, contact_key, name, message).await?;
    println!("{}", reply);
    Ok(())
}

/// Open a session for the contact, send `message`, and return the reply
///
/// A failing history load is logged and does not stop the send.
///
/// # Errors
///
/// Returns error if the contact or message is blank, or if the reply
/// service call fails
pub async fn send_once(
    simulator: &mut Simulator,
    contact_key: &str,
    name: &str,
    message: &str,
) -> Result<String> {
    match simulator.create_session(name, contact_key).await {
        Ok(Some(LoadOutcome::Loaded(count))) => {
            tracing::debug!(count, "Existing conversation loaded");
        }
        Ok(Some(_)) => tracing::debug!("No stored conversation for {}", contact_key),
        Ok(None) => {
            return Err(SimulatorError::Config(
                "Contact name and number must not be blank".to_string(),
            )
            .into())
        }
        Err(e) => tracing::warn!("Continuing without history: {}", e),
    }

    match simulator.send(message).await {
        Some(SendOutcome::Settled) => Ok(simulator
            .state()
            .messages()
            .last()
            .map(|m| m.body.clone())
            .unwrap_or_default()),
        Some(SendOutcome::Failed(message)) => Err(SimulatorError::Reply(message).into()),
        Some(SendOutcome::Detached) | None => {
            Err(SimulatorError::Config("Message must not be blank".to_string()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_error_contains, FakeReplyService, FakeStore};

    fn simulator(store: FakeStore, replies: FakeReplyService) -> Simulator {
        Simulator::new(Arc::new(store), Arc::new(replies))
    }

    #[tokio::test]
    async fn test_send_once_returns_reply() {
        let mut sim = simulator(FakeStore::new(), FakeReplyService::replying("Olá!"));
        let reply = send_once(&mut sim, "5511", "Ana", "Oi").await.unwrap();
        assert_eq!(reply, "Olá!");
    }

    #[tokio::test]
    async fn test_send_once_survives_history_failure() {
        let mut sim = simulator(FakeStore::failing("down"), FakeReplyService::replying("Olá!"));
        assert_eq!(
            send_once(&mut sim, "5511", "Ana", "Oi").await.unwrap(),
            "Olá!"
        );
    }

    #[tokio::test]
    async fn test_send_once_surfaces_detail() {
        let mut sim = simulator(FakeStore::new(), FakeReplyService::failing("limite excedido"));
        assert_error_contains(
            send_once(&mut sim, "5511", "Ana", "Oi").await,
            "limite excedido",
        );
    }

    #[tokio::test]
    async fn test_send_once_rejects_blank_input() {
        let mut sim = simulator(FakeStore::new(), FakeReplyService::replying("ok"));
        assert_error_contains(send_once(&mut sim, " ", "Ana", "Oi").await, "blank");
        assert_error_contains(send_once(&mut sim, "5511", "Ana", "  ").await, "blank");
    }
}

//! wasim - WhatsApp-style conversation simulator library
//!
//! This library lets a tester pose as customer contacts of a conversational
//! AI backend: it keeps a set of simulated conversations, loads their stored
//! history, forwards typed messages to the backend, and shows the replies.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: In-memory registry of simulated contacts
//! - `simulator`: State machine for the active conversation (history loads,
//!   optimistic sends, stale-result guard)
//! - `store`: History store abstraction and the Supabase implementation
//! - `reply`: Reply service abstraction and the HTTP implementation
//! - `render`: Terminal output
//! - `commands`: CLI command handlers
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wasim::{Config, HttpReplyService, Simulator, SupabaseStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/wasim.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let store = SupabaseStore::from_config(&config.store)?;
//!     let replies = HttpReplyService::new(&config.reply)?;
//!     let mut simulator = Simulator::new(Arc::new(store), Arc::new(replies));
//!
//!     simulator.create_session("Ana", "5511999990000").await?;
//!     simulator.send("Oi").await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod message;
pub mod render;
pub mod reply;
pub mod session;
pub mod simulator;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, SimulatorError};
pub use message::{Direction, Message, MessageId};
pub use reply::{HttpReplyService, ReplyRequest, ReplyService};
pub use session::{Session, SessionId, SessionRegistry};
pub use simulator::{Simulator, SimulatorState};
pub use store::{HistoryStore, SupabaseStore};

#[cfg(test)]
pub mod test_utils;

//! Command-line interface definition for wasim
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the interactive simulator, one-shot sends,
//! and stored history inspection.

use clap::{Parser, Subcommand};

/// wasim - WhatsApp-style conversation simulator
///
/// Poses as customer contacts, forwards their messages to a
/// conversational AI backend, and shows the replies.
#[derive(Parser, Debug, Clone)]
#[command(name = "wasim")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/wasim.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the reply service base URL
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for wasim
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive simulator
    Chat {
        /// Name of a contact to create on startup
        #[arg(short, long, requires = "phone")]
        name: Option<String>,

        /// Number (contact key) of a contact to create on startup
        #[arg(short, long, requires = "name")]
        phone: Option<String>,
    },

    /// Send a single message as a contact and print the reply
    Send {
        /// Number (contact key) to send as
        #[arg(short, long)]
        phone: String,

        /// Display name of the contact
        #[arg(short, long)]
        name: String,

        /// Message text
        #[arg(short, long)]
        message: String,
    },

    /// Show the stored conversation for a contact
    History {
        /// Number (contact key) to look up
        #[arg(short, long)]
        phone: String,

        /// Print the messages as JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/wasim.yaml".to_string()),
            verbose: false,
            backend_url: None,
            command: Commands::Chat {
                name: None,
                phone: None,
            },
        }
    }
}

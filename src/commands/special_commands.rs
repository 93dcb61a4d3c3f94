//! Special commands parser for the interactive simulator
//!
//! This module parses the commands that can be entered at the simulator
//! prompt. Special commands allow users to:
//! - Create contacts (through the form, directly, or at random)
//! - List and switch between conversations
//! - Reload the active conversation from the history store
//! - View status and help
//! - Exit the session
//!
//! Commands are prefixed with `/` and are case-insensitive. Arguments keep
//! their original case.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// How `/select` identifies a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSelector {
    /// 1-based position in `/list`
    Position(usize),
    /// Contact key (number)
    ContactKey(String),
}

/// Special commands that can be executed at the simulator prompt
///
/// These commands change which conversation is shown or provide
/// information, rather than being sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Open the new-contact form
    NewContactForm,

    /// Create a contact directly
    NewContact {
        /// Contact key (number)
        contact_key: String,
        /// Display name, may contain spaces
        name: String,
    },

    /// Create a contact with a generated number and name
    RandomContact,

    /// Close the new-contact form
    Cancel,

    /// List conversations
    List,

    /// Switch to another conversation
    Select(SessionSelector),

    /// Leave the active conversation
    Back,

    /// Reload the active conversation from the history store
    Reload,

    /// Display the simulator status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the simulator
    Exit,

    /// Not a special command; the line is a message
    None,
}

/// Parse user input to detect special commands
///
/// # Errors
///
/// Returns [`CommandError`] for unknown commands or bad arguments
///
/// # Examples
///
/// ```
/// use wasim::commands::special_commands::{parse_special_command, SessionSelector, SpecialCommand};
///
/// let cmd = parse_special_command("/select 2").unwrap();
/// assert_eq!(cmd, SpecialCommand::Select(SessionSelector::Position(2)));
///
/// let cmd = parse_special_command("Oi, tudo bem?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default().to_lowercase();
    let rest = parts.next().unwrap_or_default().trim();

    match command.as_str() {
        "/new" if rest.is_empty() => Ok(SpecialCommand::NewContactForm),
        "/new" => {
            let mut args = rest.splitn(2, char::is_whitespace);
            let contact_key = args.next().unwrap_or_default().to_string();
            let name = args.next().unwrap_or_default().trim().to_string();
            if name.is_empty() {
                return Err(CommandError::MissingArgument {
                    command: "/new".to_string(),
                    usage: "/new <number> <name>".to_string(),
                });
            }
            Ok(SpecialCommand::NewContact { contact_key, name })
        }

        "/random" if rest.is_empty() => Ok(SpecialCommand::RandomContact),
        "/cancel" if rest.is_empty() => Ok(SpecialCommand::Cancel),
        "/list" | "/ls" if rest.is_empty() => Ok(SpecialCommand::List),
        "/back" if rest.is_empty() => Ok(SpecialCommand::Back),
        "/reload" if rest.is_empty() => Ok(SpecialCommand::Reload),
        "/status" if rest.is_empty() => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" if rest.is_empty() => Ok(SpecialCommand::Help),
        "exit" | "quit" | "/exit" | "/quit" if rest.is_empty() => Ok(SpecialCommand::Exit),

        "/select" if rest.is_empty() => Err(CommandError::MissingArgument {
            command: "/select".to_string(),
            usage: "/select <position|number>".to_string(),
        }),
        "/select" => {
            if rest.split_whitespace().count() > 1 {
                return Err(CommandError::UnsupportedArgument {
                    command: "/select".to_string(),
                    arg: rest.to_string(),
                });
            }
            // Short numbers are list positions; anything longer is a contact key
            match rest.parse::<usize>() {
                Ok(position) if rest.len() <= 3 => {
                    Ok(SpecialCommand::Select(SessionSelector::Position(position)))
                }
                _ => Ok(SpecialCommand::Select(SessionSelector::ContactKey(
                    rest.to_string(),
                ))),
            }
        }

        "/random" | "/cancel" | "/list" | "/ls" | "/back" | "/reload" | "/status" | "/help"
        | "/?" | "/exit" | "/quit" => Err(CommandError::UnsupportedArgument {
            command: command.clone(),
            arg: rest.to_string(),
        }),

        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for the Simulator
==================================

CONTACTS:
  /new                  - Open the new-contact form (name, then number)
  /new <number> <name>  - Create a contact directly
  /random               - Create a contact with a generated number
  /cancel               - Close the new-contact form

CONVERSATIONS:
  /list                 - List conversations (newest first, * = active)
  /select <position>    - Switch to a conversation by list position
  /select <number>      - Switch to the conversation for a number
  /back                 - Leave the active conversation
  /reload               - Reload the active conversation from history

SESSION INFORMATION:
  /status               - Show simulator status
  /help                 - Show this help message
  /?                    - Same as /help

SESSION CONTROL:
  exit                  - Exit the simulator
  quit                  - Same as exit

NOTES:
  - Commands are case-insensitive
  - Regular text (not starting with /) is sent as the active contact
  - Replies to a conversation you switched away from appear on /reload
"#
    );
}

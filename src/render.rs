//! Terminal rendering for the simulator
//!
//! Everything printed to stdout goes through here. Logging goes to stderr,
//! so the transcript stays readable when `--verbose` is on.

use crate::message::{Direction, Message};
use crate::simulator::SimulatorState;
use chrono::Local;
use colored::Colorize;

/// Shown in place of an empty transcript
pub const EMPTY_TRANSCRIPT: &str = "This is a simulation. Messages sent here will be processed by the AI as if they came from this number.";

/// Shown when no session is active
pub const NO_SESSION: &str = "No active conversation. Type '/new' to start a simulated conversation with a customer.";

/// Print the welcome banner
pub fn print_welcome_banner(endpoint: &str, store_configured: bool) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║              WhatsApp Simulator - Welcome!                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!("Backend: {}", endpoint.cyan());
    if store_configured {
        println!("History: {}", "connected".green());
    } else {
        println!(
            "History: {}",
            "not configured (set store.url and store.anon_key)".yellow()
        );
    }
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

/// Prompt string reflecting the active session
pub fn prompt(state: &SimulatorState) -> String {
    if state.modal_open() {
        return if state.form().name.is_empty() {
            format!("{} ", "[new] name>".magenta())
        } else {
            format!("{} ", "[new] number>".magenta())
        };
    }
    match state.active_session() {
        Some(session) => format!("{} ", format!("[{}]>", session.name()).green()),
        None => format!("{} ", "[no contact]>".dimmed()),
    }
}

/// Render one transcript line
///
/// Timestamps are shown as local `HH:MM`.
pub fn format_message(message: &Message, assistant_label: &str) -> String {
    let time = message
        .created_at
        .with_timezone(&Local)
        .format("%H:%M")
        .to_string();
    match message.direction {
        Direction::Inbound => format!(
            "{} {} {}",
            time.dimmed(),
            "You:".green().bold(),
            message.body
        ),
        Direction::Outbound => format!(
            "{} {} {}",
            time.dimmed(),
            format!("{}:", assistant_label).cyan().bold(),
            message.body
        ),
    }
}

/// Print a single message
pub fn print_message(message: &Message, assistant_label: &str) {
    println!("{}", format_message(message, assistant_label));
}

/// Print the active session header and its whole transcript
pub fn print_transcript(state: &SimulatorState, assistant_label: &str) {
    let Some(session) = state.active_session() else {
        println!("{}", NO_SESSION.dimmed());
        return;
    };

    let status = if state.is_typing() {
        "typing...".cyan().bold()
    } else {
        "online".normal()
    };
    println!(
        "\n{} ({}) - {}",
        session.name().bold(),
        session.contact_key(),
        status
    );
    println!("{}", "─".repeat(64).dimmed());

    if state.messages().is_empty() {
        println!("{}", EMPTY_TRANSCRIPT.dimmed());
    } else {
        for message in state.messages() {
            print_message(message, assistant_label);
        }
    }
    println!();
}

/// Print the typing indicator
pub fn print_typing(assistant_label: &str) {
    println!("{}", format!("{} is typing...", assistant_label).cyan().italic());
}

/// Print the session list, marking the active one
pub fn print_sessions(state: &SimulatorState) {
    if state.sessions().is_empty() {
        println!("{}", "No conversations yet.".yellow());
        return;
    }

    let active = state.active_session().map(|s| s.id());
    println!("\nConversations:");
    for (index, session) in state.sessions().iter().enumerate() {
        let marker = if Some(session.id()) == active { "*" } else { " " };
        println!(
            "{} {:>2}. {} ({}) {}",
            marker.green().bold(),
            index + 1,
            session.name().bold(),
            session.contact_key(),
            session.created_label().dimmed()
        );
    }
    println!();
}

/// Print the status block
pub fn print_status(state: &SimulatorState, endpoint: &str, store_configured: bool) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                    Simulator Status                          ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    match state.active_session() {
        Some(session) => println!(
            "Active contact:  {} ({})",
            session.name().bold(),
            session.contact_key()
        ),
        None => println!("Active contact:  {}", "none".dimmed()),
    }
    println!("Conversations:   {}", state.sessions().len());
    println!("Messages shown:  {}", state.messages().len());
    println!("Last send:       {}", state.send_phase());
    println!("Awaiting reply:  {}", state.in_flight());
    println!("Backend:         {}", endpoint);
    println!(
        "History store:   {}",
        if store_configured {
            "connected".green()
        } else {
            "not configured".yellow()
        }
    );
    println!();
}

/// Print an informational notice
pub fn print_info(text: &str) {
    println!("{}", text.green());
}

/// Print an error notice
pub fn print_error(text: &str) {
    eprintln!("{}", text.red());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageId;
    use crate::test_utils::at;

    #[test]
    fn test_format_inbound_message() {
        let message = Message::inbound(MessageId::Local(1), "Oi", at(0));
        let line = format_message(&message, "Bruna");
        assert!(line.contains("You:"));
        assert!(line.ends_with("Oi"));
    }

    #[test]
    fn test_format_outbound_message_uses_assistant_label() {
        let message = Message::outbound(MessageId::Local(2), "Olá!", at(0));
        let line = format_message(&message, "Bruna");
        assert!(line.contains("Bruna:"));
        assert!(line.ends_with("Olá!"));
    }

    #[test]
    fn test_prompt_follows_active_session_and_form() {
        let mut state = SimulatorState::new();
        assert!(prompt(&state).contains("no contact"));

        state.create_session("Ana", "5511").unwrap();
        assert!(prompt(&state).contains("[Ana]>"));

        state.open_modal();
        assert!(prompt(&state).contains("name>"));
        state.set_form_name("Bia");
        assert!(prompt(&state).contains("number>"));
    }
}

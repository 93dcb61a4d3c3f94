use crate::config::Config;
use crate::error::Result;
use crate::simulator::{fetch_history, History};
use crate::store::{HistoryStore, SupabaseStore};
use colored::Colorize;
use prettytable::{format, Table};

/// Handle the history command
pub async fn handle_history(config: &Config, contact_key: &str, json: bool) -> Result<()> {
    let store = SupabaseStore::from_config(&config.store)?;
    show_history(&store, contact_key, json, &config.chat.assistant_label).await
}

/// Print the stored conversation for `contact_key`
pub async fn show_history(
    store: &dyn HistoryStore,
    contact_key: &str,
    json: bool,
    assistant_label: &str,
) -> Result<()> {
    let messages = match fetch_history(store, contact_key).await? {
        History::Messages(messages) => messages,
        History::NotStarted => Vec::new(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!(
            "{}",
            format!("No stored conversation for {}.", contact_key).yellow()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Sent".bold(),
        "From".bold(),
        "Message".bold()
    ]);

    for message in &messages {
        let from = match message.direction {
            crate::message::Direction::Inbound => "customer".green(),
            crate::message::Direction::Outbound => assistant_label.cyan(),
        };
        let body = if message.body.chars().count() > 60 {
            format!("{}...", message.body.chars().take(57).collect::<String>())
        } else {
            message.body.clone()
        };
        let sent = message.created_at.format("%Y-%m-%d %H:%M").to_string();

        table.add_row(prettytable::row![message.id.to_string().cyan(), sent, from, body]);
    }

    println!("\nConversation with {}:", contact_key.bold());
    table.printstd();
    println!();

    Ok(())
}

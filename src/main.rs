//! wasim - WhatsApp-style conversation simulator
//!
#![doc = "wasim - WhatsApp-style conversation simulator"]
#![doc = "Main entry point for the wasim application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wasim::cli::{Cli, Commands};
use wasim::commands;
use wasim::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/wasim.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { name, phone } => {
            tracing::info!("Starting interactive simulator");
            let initial_contact = name.zip(phone);
            if let Some((name, phone)) = &initial_contact {
                tracing::debug!("Opening contact {} ({})", name, phone);
            }
            commands::chat::run_chat(config, initial_contact).await?;
            Ok(())
        }
        Commands::Send {
            phone,
            name,
            message,
        } => {
            tracing::info!("Sending a single message");
            commands::send::run_send(&config, &phone, &name, &message).await?;
            Ok(())
        }
        Commands::History { phone, json } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(&config, &phone, json).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never interleave with the transcript.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "wasim=debug" } else { "wasim=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

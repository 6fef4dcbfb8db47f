//! ragdesk - terminal client for a document question-answering service
//!
#![doc = "Main entry point for the ragdesk application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ragdesk::cli::{Cli, Commands};
use ragdesk::commands;
use ragdesk::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Ask { question, session } => {
            tracing::info!("Starting one-shot question");
            commands::chat::run_ask(config, question, session).await?;
            Ok(())
        }
        Commands::Chat { resume } => {
            if let Some(id) = &resume {
                tracing::debug!("Resuming session: {}", id);
            }
            commands::chat::run_chat(config, resume).await?;
            Ok(())
        }
        Commands::History { command } => {
            tracing::info!("Starting history command");
            commands::history::handle_history(&config, command)?;
            Ok(())
        }
        Commands::Upload { files } => {
            tracing::info!("Starting upload of {} file(s)", files.len());
            commands::upload::run_upload(config, files).await?;
            Ok(())
        }
        Commands::Prefs { command } => {
            commands::prefs::handle_prefs(&config, command)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` wins over the `--verbose` default.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "ragdesk=debug" } else { "ragdesk=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

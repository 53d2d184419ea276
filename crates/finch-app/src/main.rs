//! Finch application binary - composition root.
//!
//! 1. Parse CLI arguments and resolve the config path
//! 2. Load configuration from TOML and apply env/flag overrides
//! 3. Initialize tracing
//! 4. Run the requested subcommand: the forwarding proxy or the chat loop

mod chat;
mod cli;

use clap::Parser;

use finch_api::routes;
use finch_api::state::AppState;
use finch_core::FinchConfig;

use cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config. Tracing is not up yet, so a load failure is reported below.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = if config_file.exists() {
        match FinchConfig::load(&config_file) {
            Ok(c) => (c, None),
            Err(e) => (FinchConfig::default(), Some(e)),
        }
    } else {
        (FinchConfig::default(), None)
    };
    args.apply_overrides(&mut config);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting Finch v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        None => tracing::info!(path = %config_file.display(), "Configuration resolved"),
    }

    match args.command {
        Command::Serve { .. } => {
            let state = AppState::new(config.proxy.clone())?;
            routes::start_server(&config.proxy, state).await?;
        }
        Command::Chat { .. } => {
            chat::run(&config).await?;
        }
    }

    Ok(())
}

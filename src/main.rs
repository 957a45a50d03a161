//! mmf - MapMyFitness API client
//!
#![doc = "mmf - MapMyFitness API client"]
#![doc = "Main entry point for the mmf command-line tool."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mapmyfitness::cli::{AuthCommand, Cli, Commands};
use mapmyfitness::commands;
use mapmyfitness::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    init_tracing(cli.verbose);

    // Listing the catalog needs neither credentials nor storage
    if let Commands::Endpoints { group } = &cli.command {
        commands::endpoints::run_endpoints(group.as_deref())?;
        return Ok(());
    }

    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;
    config.validate()?;

    match cli.command {
        Commands::Auth { command } => match command {
            AuthCommand::Login => {
                tracing::info!("Starting OAuth handshake");
                commands::auth::login(&config).await?;
            }
            AuthCommand::Status => commands::auth::status(&config).await?,
            AuthCommand::Logout => commands::auth::logout(&config).await?,
        },
        Commands::Call {
            path,
            params,
            method,
            headers,
        } => {
            commands::call::run_call(&config, &path, params, &method, &headers).await?;
        }
        Commands::Endpoint { route, params } => {
            commands::endpoint::run_endpoint(&config, &route, params).await?;
        }
        Commands::Endpoints { .. } => {}
    }

    Ok(())
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "mapmyfitness=debug"
    } else {
        "mapmyfitness=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

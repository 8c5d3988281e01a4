//! onpm - Offline npm
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use onpm::cli::{Cli, Commands};
use onpm::config::ConfigManager;
use onpm::error::OnpmResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> OnpmResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("onpm=warn"),
        1 => EnvFilter::new("onpm=info"),
        _ => EnvFilter::new("onpm=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time();
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    debug!("Using config at {}", config_manager.path().display());

    match cli.command {
        Commands::Install(args) => onpm::cli::commands::install(args, &config).await,
        Commands::Upgrade => onpm::cli::commands::upgrade(&config).await,
        Commands::Cache(args) => onpm::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            onpm::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

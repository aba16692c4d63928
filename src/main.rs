//! Wheelmirror - caching mirror for Python package indexes
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wheelmirror::cli::args::{ConfigAction, ConfigArgs};
use wheelmirror::cli::{Cli, Commands};
use wheelmirror::config::{Config, ConfigManager};
use wheelmirror::error::MirrorResult;
use wheelmirror::logging;

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

async fn run() -> MirrorResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    // `config init` must work even when the existing file is broken
    let initializing = matches!(
        cli.command,
        Commands::Config(ConfigArgs {
            action: Some(ConfigAction::Init { .. })
        })
    );
    let config = if initializing {
        config_manager.load().await.unwrap_or_default()
    } else {
        config_manager.load().await?
    };

    init_logging(cli.verbose, &config)?;

    match cli.command {
        Commands::Serve(args) => wheelmirror::cli::commands::serve(args, &config).await,
        Commands::Config(args) => {
            wheelmirror::cli::commands::config(args, &config_manager, &config).await
        }
        Commands::Cache(args) => wheelmirror::cli::commands::cache(args, &config).await,
    }
}

/// RUST_LOG wins over `-v` when set
fn init_logging(verbose: u8, config: &Config) -> MirrorResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging::default_directive(verbose)));
    let log_file = config.general.log_file.as_deref();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(logging::log_writer(log_file)?)
        .with_ansi(log_file.is_none())
        .with_target(false);

    // Timestamps only when the lines outlive the terminal
    if config.general.log_format == "json" {
        builder.json().init();
    } else if log_file.is_some() {
        builder.init();
    } else {
        builder.without_time().init();
    }
    Ok(())
}

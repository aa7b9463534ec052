//! Fresca - Transparent stale-while-revalidate request cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use fresca::cli::{commands, Cli, Commands};
use fresca::config::ConfigManager;
use fresca::error::FrescaResult;
use std::process::ExitCode;
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

async fn run() -> FrescaResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("fresca=warn"),
        1 => EnvFilter::new("fresca=info"),
        _ => EnvFilter::new("fresca=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;
    let store_root = ConfigManager::resolve_store_root(cli.store_root.as_deref(), &config);

    match cli.command {
        Commands::Status => commands::status(store_root).await,
        Commands::List(args) => commands::list(args, store_root).await,
        Commands::Show(args) => commands::show(args, &config, store_root).await,
        Commands::Install(args) => commands::install(args, &config, store_root).await,
        Commands::Purge(args) => commands::purge(args, store_root).await,
    }
}

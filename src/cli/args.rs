//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Fresca - Transparent stale-while-revalidate request cache
///
/// Inspects and manages the generation-scoped cache stores the agent
/// serves intercepted requests from.
#[derive(Parser, Debug)]
#[command(name = "fresca")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "FRESCA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache store root directory (overrides config)
    #[arg(long, global = true, env = "FRESCA_STORE_ROOT")]
    pub store_root: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the current generation and store summary
    Status,

    /// List cache generations and their contents
    List(ListArgs),

    /// Show one stored response
    Show(ShowArgs),

    /// Seed the current generation's store from the manifest
    Install(InstallArgs),

    /// Delete cache stores left behind by older generations
    Purge(PurgeArgs),
}

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned table
    Table,
    /// JSON document
    Json,
    /// One name per line
    Plain,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

/// Arguments for the show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Path of the stored resource (e.g. /entry/one.html)
    pub path: String,

    /// Generation to look in (defaults to the current one)
    #[arg(short, long)]
    pub generation: Option<String>,

    /// Print the stored body instead of the metadata summary
    #[arg(long)]
    pub body: bool,
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Override the configured origin
    #[arg(long)]
    pub origin: Option<String>,
}

/// Arguments for the purge command
#[derive(Parser, Debug)]
pub struct PurgeArgs {
    /// Report what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_show() {
        let cli = Cli::parse_from(["fresca", "show", "/entry/one.html", "--body"]);
        match cli.command {
            Commands::Show(args) => {
                assert_eq!(args.path, "/entry/one.html");
                assert!(args.body);
                assert_eq!(args.generation, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn store_root_is_global() {
        let cli = Cli::parse_from(["fresca", "--store-root", "/tmp/fresca", "status"]);
        assert_eq!(cli.store_root, Some(PathBuf::from("/tmp/fresca")));
    }
}

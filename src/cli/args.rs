//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// onpm - Offline npm
///
/// Installs packages from a local cache, falling back to npm and
/// caching whatever npm installed.
#[derive(Parser, Debug)]
#[command(name = "onpm")]
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
    #[arg(short, long, global = true, env = "ONPM_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install packages, from the cache when possible
    #[command(visible_alias = "i")]
    Install(InstallArgs),

    /// Upgrade onpm itself
    Upgrade,

    /// Inspect or populate the package cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
pub struct InstallArgs {
    /// Packages to install: `name` or `name@version`
    #[arg(required = true)]
    pub packages: Vec<String>,

    /// Record installed packages in `dependencies`
    #[arg(short = 'S', long)]
    pub save: bool,

    /// Record installed packages in `devDependencies`
    #[arg(short = 'D', long, conflicts_with = "save")]
    pub save_dev: bool,

    /// Project directory to install into (defaults to current directory)
    #[arg(long)]
    pub prefix: Option<PathBuf>,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached packages and versions
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the cache directory
    Path,

    /// Copy an installed package into the cache
    Store {
        /// Package name
        name: String,

        /// Installed package directory (defaults to ./node_modules/<name>)
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

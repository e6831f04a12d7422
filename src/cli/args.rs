//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// datacache - URL-addressed dataset cache
///
/// Downloads remote files once into a per-dataset directory and prints
/// their local paths.
#[derive(Parser, Debug)]
#[command(name = "datacache")]
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
    #[arg(short, long, global = true, env = "DATACACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download missing files and print their local paths
    Fetch(FetchArgs),

    /// List files cached for a dataset
    List(ListArgs),

    /// Show or change where a dataset is cached
    Location(LocationArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Dataset key (e.g. grace)
    pub dataset: String,

    /// Source URLs or absolute local paths
    pub urls: Vec<String>,

    /// Read additional URLs from a file, one per line ("-" for stdin)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Username for protected sources
    #[arg(short, long)]
    pub username: Option<String>,

    /// Password for protected sources
    #[arg(short, long, env = "DATACACHE_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// URL prefix credentials may be sent to (repeatable)
    #[arg(long = "auth-url")]
    pub auth_urls: Vec<String>,

    /// Use the session transport: request, follow redirects, then re-request
    /// with credentials at the final location
    #[arg(long)]
    pub session: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Dataset key
    pub dataset: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the location command
#[derive(Parser, Debug)]
pub struct LocationArgs {
    /// Dataset key
    pub dataset: String,

    /// Record a new cache directory for the dataset
    #[arg(long)]
    pub set: Option<PathBuf>,
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

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., transport.timeout_secs)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for list command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one path per line)
    Plain,
}

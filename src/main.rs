//! datacache - URL-addressed dataset cache
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use datacache::cli::{Cli, Commands};
use datacache::config::ConfigManager;
use datacache::error::CacheResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
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

fn run() -> CacheResult<()> {
    let cli = Cli::parse();

    let manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = manager.load()?;

    init_logging(cli.verbose, &config.general.log_format);

    match cli.command {
        Commands::Fetch(args) => datacache::cli::commands::fetch(args, manager, &config),
        Commands::List(args) => datacache::cli::commands::list(args, manager),
        Commands::Location(args) => datacache::cli::commands::location(args, manager),
        Commands::Config(args) => datacache::cli::commands::config(args, &manager, &config),
    }
}

/// 0 = warn, 1 = info, 2+ = debug. Logs go to stderr so stdout stays
/// parseable.
fn init_logging(verbose: u8, format: &str) {
    let filter = match verbose {
        0 => EnvFilter::new("datacache=warn"),
        1 => EnvFilter::new("datacache=info"),
        _ => EnvFilter::new("datacache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}

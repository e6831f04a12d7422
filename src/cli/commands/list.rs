//! List command - show what is cached for a dataset

use crate::cache::{CachedEntry, ContentCache};
use crate::cli::args::{ListArgs, OutputFormat};
use crate::config::ConfigManager;
use crate::error::CacheResult;
use crate::ui;
use chrono::{DateTime, Local, Utc};
use console::style;
use serde::Serialize;
use std::path::PathBuf;

/// Cached file as reported in JSON output
#[derive(Debug, Serialize)]
struct ListedEntry {
    url: String,
    path: PathBuf,
    size: u64,
    modified: Option<DateTime<Utc>>,
}

impl From<&CachedEntry> for ListedEntry {
    fn from(entry: &CachedEntry) -> Self {
        Self {
            url: entry.url.to_string(),
            path: entry.path.clone(),
            size: entry.size,
            modified: entry.modified.map(DateTime::<Utc>::from),
        }
    }
}

/// Execute the list command
pub fn execute(args: ListArgs, manager: ConfigManager) -> CacheResult<()> {
    let config = manager.load()?;
    let cache = ContentCache::new(manager, config.transport);
    let entries = cache.cached_entries(&args.dataset)?;

    if entries.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => {
                ui::step_info(&format!("Nothing cached for '{}'", args.dataset));
            }
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&entries),
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Plain => print_plain(&entries),
    }

    Ok(())
}

fn print_table(entries: &[CachedEntry]) {
    println!(
        "{:<10} {:<17} {}",
        style("SIZE").bold(),
        style("MODIFIED").bold(),
        style("URL").bold()
    );
    println!("{}", "-".repeat(77));

    let mut total = 0;
    for entry in entries {
        let modified = entry
            .modified
            .map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<10} {:<17} {}",
            format_bytes(entry.size),
            modified,
            entry.url
        );
        total += entry.size;
    }

    println!();
    println!("{} file(s), {}", entries.len(), format_bytes(total));
}

fn print_json(entries: &[CachedEntry]) -> CacheResult<()> {
    let listed: Vec<ListedEntry> = entries.iter().map(ListedEntry::from).collect();
    let json = serde_json::to_string_pretty(&listed)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(entries: &[CachedEntry]) {
    for entry in entries {
        println!("{}", entry.path.display());
    }
}

/// Format bytes as human-readable string
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b >= GB => format!("{:.1} GB", b as f64 / GB as f64),
        b if b >= MB => format!("{:.1} MB", b as f64 / MB as f64),
        b if b >= KB => format!("{:.1} KB", b as f64 / KB as f64),
        b => format!("{} B", b),
    }
}

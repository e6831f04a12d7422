//! Location command - show or record where a dataset is cached

use crate::cli::args::LocationArgs;
use crate::config::registry::{create_root, normalize_key};
use crate::config::{resolve_data_location, ConfigManager, LocationRegistry};
use crate::error::{CacheError, CacheResult};
use crate::ui;
use std::path::{Path, PathBuf};

/// Execute the location command
pub fn execute(args: LocationArgs, manager: ConfigManager) -> CacheResult<()> {
    match args.set {
        Some(path) => set_location(&manager, &args.dataset, &path),
        None => {
            let root = resolve_data_location(&manager, &args.dataset)?;
            println!("{}", root.display());
            Ok(())
        }
    }
}

fn set_location(manager: &ConfigManager, dataset: &str, path: &Path) -> CacheResult<()> {
    let key = normalize_key(dataset)?;
    let location = absolute(path)?;

    let previous = manager.data_location(&key)?;
    create_root(&key, &location)?;
    manager.set_data_location(&key, &location)?;

    ui::step_ok_detail(
        &format!("Location of '{}' set", key),
        &location.display().to_string(),
    );
    if let Some(previous) = previous.filter(|p| *p != location) {
        ui::step_warn_hint(
            &format!("Files under {} are no longer used", previous.display()),
            "Move them to the new location to keep them cached",
        );
    }

    Ok(())
}

fn absolute(path: &Path) -> CacheResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd =
        std::env::current_dir().map_err(|e| CacheError::io("getting current directory", e))?;
    Ok(cwd.join(path))
}

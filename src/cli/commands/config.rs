//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{CacheError, CacheResult};
use crate::ui;
use std::path::PathBuf;

/// Keys accepted by `config set`
const SETTABLE_KEYS: &[&str] = &[
    "general.root",
    "general.show_progress",
    "general.log_format",
    "transport.timeout_secs",
    "transport.max_redirects",
    "transport.user_agent",
];

/// Execute the config command
pub fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> CacheResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force)?,
        Some(ConfigAction::Set { key, value }) => {
            let mut config = config.clone();
            set_value(&mut config, &key, &value)?;
            manager.save(&config)?;
            ui::step_ok(&format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> CacheResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn init_config(manager: &ConfigManager, force: bool) -> CacheResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default())?;
    ui::step_ok_detail("Configuration initialized", &path.display().to_string());

    Ok(())
}

/// Apply a dot-separated key to `config`
fn set_value(config: &mut Config, key: &str, value: &str) -> CacheResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "root"] => config.general.root = Some(PathBuf::from(value)),
        ["general", "show_progress"] => config.general.show_progress = parse_bool(value)?,
        ["general", "log_format"] => {
            if value != "text" && value != "json" {
                return Err(CacheError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )));
            }
            config.general.log_format = value.to_string();
        }

        ["transport", "timeout_secs"] => config.transport.timeout_secs = parse_u32(value)?.into(),
        ["transport", "max_redirects"] => config.transport.max_redirects = parse_u32(value)?,
        ["transport", "user_agent"] => config.transport.user_agent = value.to_string(),

        _ => {
            return Err(CacheError::User(format!(
                "Unknown config key: {}. Valid keys: {}",
                key,
                SETTABLE_KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> CacheResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(CacheError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u32(value: &str) -> CacheResult<u32> {
    value
        .parse()
        .map_err(|_| CacheError::User(format!("Invalid number: {}", value)))
}

//! Config command feature.
//!
//! This module owns and handles the "panel-clean config" command behavior.

use crate::config::Config;
use crate::theme::Theme;
use std::path::PathBuf;

pub(crate) fn handle_config(show: bool, reset: bool, path: Option<PathBuf>) -> anyhow::Result<()> {
    if reset {
        let config = Config::default();
        let written = match path {
            Some(path) => {
                config.save_to(&path)?;
                path
            }
            None => config.save()?,
        };
        println!("Configuration reset to defaults: {}", written.display());
        return Ok(());
    }

    let location = match &path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };

    if !show {
        println!("Config file: {}", location.display());
        println!("Use --show to print it or --reset to restore defaults.");
        return Ok(());
    }

    let config = Config::load(path.as_deref())?;
    println!("{}", Theme::header("Current Configuration"));
    println!("{}", Theme::divider_bold(60));
    println!();
    println!("Paths:");
    println!("  Base dir:   {}", config.base_dir().display());
    println!("  Backup dir: {}", config.backup_dir().display());
    println!("  Database:   {}", config.database_path().display());
    println!();
    println!("Policy:");
    println!("  Upgrade pattern: {}", config.policy.upgrade_pattern);
    println!("  Active log:      {}", config.policy.active_log);
    println!();
    println!("Service:");
    println!("  Restart enabled: {}", config.service.enabled);
    println!("  Restart command: {}", config.service.restart_command.join(" "));
    println!("  Restart timeout: {}s", config.service.timeout_secs);
    println!();
    println!("Logging:");
    println!("  Level: {}", config.log.level);
    match &config.log.file {
        Some(file) => println!("  File:  {}", file.display()),
        None => println!("  File:  {}", Theme::muted("(stderr only)")),
    }
    println!();
    println!("Config file: {}", Theme::muted(&location.display().to_string()));
    Ok(())
}

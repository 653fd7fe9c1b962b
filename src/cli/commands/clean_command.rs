//! Clean command feature.
//!
//! This module owns and handles the "panel-clean clean" command behavior.

use super::scan_command::scan_with_progress;
use crate::catalog::PathCatalog;
use crate::cleaner::CleanExecutor;
use crate::config::Config;
use crate::output::{self, OutputMode};
use crate::report::CleanSelection;
use crate::service::{CommandRestarter, NoopRestarter, ServiceRestarter};
use crate::store::{MemoryStore, SettingsStore, SqliteStore, TaskRecordStore};
use anyhow::{bail, Context};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub(crate) struct CleanArgs {
    pub selection: Option<PathBuf>,
    pub defaults: bool,
    pub dry_run: bool,
    pub no_restart: bool,
    pub no_store: bool,
}

/// Parse a selection list. Any unknown category token rejects the whole list.
pub(crate) fn parse_selection(json: &str) -> anyhow::Result<Vec<CleanSelection>> {
    serde_json::from_str(json).context("Invalid selection list")
}

fn read_selection(source: &Path) -> anyhow::Result<Vec<CleanSelection>> {
    let json = if source == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read selection from stdin")?;
        buf
    } else {
        fs::read_to_string(source)
            .with_context(|| format!("Failed to read selection {}", source.display()))?
    };
    parse_selection(&json)
}

fn build_restarter(config: &Config, no_restart: bool) -> Box<dyn ServiceRestarter> {
    if no_restart || !config.service.enabled {
        return Box::new(NoopRestarter);
    }
    match CommandRestarter::new(&config.service.restart_command) {
        Some(restarter) => Box::new(
            restarter.with_timeout(Duration::from_secs(config.service.timeout_secs)),
        ),
        None => {
            tracing::warn!(
                command = ?config.service.restart_command,
                "restart command rejected, service will not be restarted"
            );
            Box::new(NoopRestarter)
        }
    }
}

pub(crate) fn handle_clean(
    config: &Config,
    args: CleanArgs,
    output_mode: OutputMode,
) -> anyhow::Result<()> {
    let catalog = PathCatalog::from_config(config).context("Invalid cleaning policy")?;

    let selection = match &args.selection {
        Some(source) => read_selection(source)?,
        None if args.defaults => {
            let report = scan_with_progress(&catalog, output_mode != OutputMode::Quiet)?;
            report.default_selection()
        }
        None => bail!("Either --selection or --defaults is required"),
    };

    if selection.is_empty() {
        if output_mode != OutputMode::Quiet {
            println!("Nothing selected.");
        }
        return Ok(());
    }

    let restarter = build_restarter(config, args.no_restart);

    let summary = if args.no_store || args.dry_run {
        let store = MemoryStore::new();
        run(&catalog, &store, &store, restarter.as_ref(), &selection, args.dry_run)
    } else {
        let db_path = config.database_path();
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open store {}", db_path.display()))?;
        run(&catalog, &store, &store, restarter.as_ref(), &selection, false)
    };

    output::print_summary(&summary, args.dry_run, output_mode);
    // The restart is already running; wait so its outcome is logged before exit
    restarter.wait();
    Ok(())
}

fn run(
    catalog: &PathCatalog,
    settings: &dyn SettingsStore,
    tasks: &dyn TaskRecordStore,
    restarter: &dyn ServiceRestarter,
    selection: &[CleanSelection],
    dry_run: bool,
) -> crate::cleaner::CleanSummary {
    CleanExecutor::new(catalog, settings, tasks, restarter)
        .dry_run(dry_run)
        .clean(selection)
}

//! Scan command feature.
//!
//! This module owns and handles the "panel-clean scan" command behavior.

use crate::catalog::PathCatalog;
use crate::config::Config;
use crate::output::{self, OutputMode};
use crate::progress;
use crate::report::CleanReport;
use crate::scanner;
use anyhow::Context;

/// Scan with a spinner unless output is quiet or machine-readable
pub(crate) fn scan_with_progress(
    catalog: &PathCatalog,
    show_progress: bool,
) -> anyhow::Result<CleanReport> {
    let spinner = if show_progress {
        progress::create_spinner("Scanning panel directories...")
    } else {
        progress::hidden()
    };

    let report = scanner::scan_all(catalog);
    progress::finish_and_clear(&spinner);

    report.with_context(|| format!("Failed to scan {}", catalog.base_dir().display()))
}

pub(crate) fn handle_scan(config: &Config, json: bool, output_mode: OutputMode) -> anyhow::Result<()> {
    let catalog = PathCatalog::from_config(config).context("Invalid cleaning policy")?;
    let report = scan_with_progress(&catalog, !json && output_mode != OutputMode::Quiet)?;

    if json {
        output::print_json(&report)?;
    } else {
        output::print_report(&report, output_mode);
    }
    Ok(())
}

//! Category cleaning feature.
//!
//! This module owns bulk cleaning of a selection list taken from a report.

use super::single_deletion::{drop_path, DeleteOutcome};
use crate::catalog::PathCatalog;
use crate::report::CleanSelection;
use crate::service::ServiceRestarter;
use crate::stats;
use crate::store::{SettingsStore, TaskRecordStore};
use chrono::Local;
use std::path::PathBuf;

/// Totals of one clean call.
///
/// `total_bytes` and `item_count` are what the statistics record: the
/// caller-supplied sizes and the number of selection items, not what was
/// found on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub total_bytes: u64,
    pub item_count: usize,
    /// Paths removed, or that would be removed in a dry run
    pub deleted: Vec<PathBuf>,
    pub skipped: usize,
    pub failed: usize,
    pub records_purged: usize,
    pub restart_requested: bool,
}

pub struct CleanExecutor<'a> {
    catalog: &'a PathCatalog,
    settings: &'a dyn SettingsStore,
    tasks: &'a dyn TaskRecordStore,
    restarter: &'a dyn ServiceRestarter,
    dry_run: bool,
}

impl<'a> CleanExecutor<'a> {
    pub fn new(
        catalog: &'a PathCatalog,
        settings: &'a dyn SettingsStore,
        tasks: &'a dyn TaskRecordStore,
        restarter: &'a dyn ServiceRestarter,
    ) -> Self {
        Self {
            catalog,
            settings,
            tasks,
            restarter,
            dry_run: false,
        }
    }

    /// Resolve everything but touch nothing: no deletes, no record purge,
    /// no statistics, no restart.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Process a selection list to completion.
    ///
    /// Failures of single items or paths are logged and counted; they never
    /// stop the batch and never fail the call.
    pub fn clean(&self, selection: &[CleanSelection]) -> CleanSummary {
        let mut summary = CleanSummary::default();

        for item in selection {
            summary.total_bytes = summary.total_bytes.saturating_add(item.size_bytes);
            summary.item_count += 1;

            let plan = match self.catalog.resolve(item.category, &item.name) {
                Ok(plan) => plan,
                Err(e) => {
                    tracing::warn!(
                        category = %item.category,
                        name = %item.name,
                        error = %e,
                        "skipping selection item"
                    );
                    summary.failed += 1;
                    continue;
                }
            };

            summary.restart_requested |= plan.restart;

            if self.dry_run {
                summary.deleted.extend(plan.paths);
                continue;
            }

            for path in &plan.paths {
                match drop_path(path, self.catalog) {
                    Some(DeleteOutcome::Deleted) => summary.deleted.push(path.clone()),
                    Some(DeleteOutcome::SkippedMissing | DeleteOutcome::SkippedBlocked) => {
                        summary.skipped += 1
                    }
                    None => summary.failed += 1,
                }
            }

            // Records go even when the file could not be removed
            for path in &plan.purge_records {
                match self.tasks.delete_records_for(path) {
                    Ok(n) => summary.records_purged += n,
                    Err(e) => {
                        tracing::error!(path = %path.display(), error = %e, "delete task records failed");
                        summary.failed += 1;
                    }
                }
            }
        }

        if self.dry_run {
            tracing::info!(
                items = summary.item_count,
                paths = summary.deleted.len(),
                "dry run, nothing removed"
            );
            return summary;
        }

        if let Err(e) = stats::record(
            self.settings,
            Local::now(),
            summary.total_bytes,
            summary.item_count,
        ) {
            tracing::error!(error = %e, "recording clean statistics failed");
        }

        if summary.restart_requested {
            self.restarter.restart();
        }

        tracing::info!(
            items = summary.item_count,
            bytes = summary.total_bytes,
            deleted = summary.deleted.len(),
            skipped = summary.skipped,
            failed = summary.failed,
            "clean finished"
        );

        summary
    }
}

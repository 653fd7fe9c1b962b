//! Single deletion feature.
//!
//! This module owns single-path deletion and precheck-based deletion.
//! Deletion is permanent: directories are removed recursively, symlinks are
//! removed as links and never followed.

use super::path_precheck::{precheck_path, PrecheckOutcome};
use crate::catalog::PathCatalog;
use crate::error::Result;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    SkippedMissing,
    SkippedBlocked,
}

pub fn delete_with_precheck(path: &Path, catalog: &PathCatalog) -> Result<DeleteOutcome> {
    match precheck_path(path, catalog) {
        PrecheckOutcome::Missing => return Ok(DeleteOutcome::SkippedMissing),
        PrecheckOutcome::OutsideRoots | PrecheckOutcome::Anchor => {
            return Ok(DeleteOutcome::SkippedBlocked)
        }
        PrecheckOutcome::Eligible => {}
    }

    match remove_path(path) {
        Ok(()) => Ok(DeleteOutcome::Deleted),
        // Gone between the precheck and the removal
        Err(_) if fs::symlink_metadata(path).is_err() => Ok(DeleteOutcome::SkippedMissing),
        Err(err) => Err(err.into()),
    }
}

fn remove_path(path: &Path) -> std::io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Delete one path, logging the outcome. Never fails the caller.
pub fn drop_path(path: &Path, catalog: &PathCatalog) -> Option<DeleteOutcome> {
    tracing::debug!(path = %path.display(), "drop file");
    match delete_with_precheck(path, catalog) {
        Ok(DeleteOutcome::SkippedBlocked) => {
            tracing::warn!(path = %path.display(), "refusing to delete path outside the managed directories");
            Some(DeleteOutcome::SkippedBlocked)
        }
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "drop file failed");
            None
        }
    }
}

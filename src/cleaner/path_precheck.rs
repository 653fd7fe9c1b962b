//! Path precheck feature.
//!
//! This module owns path eligibility checks prior to deletion.

use crate::catalog::PathCatalog;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrecheckOutcome {
    Eligible,
    Missing,
    /// Outside both configured directories
    OutsideRoots,
    /// The base or backup directory itself
    Anchor,
}

pub(crate) fn precheck_path(path: &Path, catalog: &PathCatalog) -> PrecheckOutcome {
    if !catalog.contains(path) {
        return PrecheckOutcome::OutsideRoots;
    }

    if catalog.is_anchor(path) {
        return PrecheckOutcome::Anchor;
    }

    // symlink_metadata so a dangling link still counts as present
    if std::fs::symlink_metadata(path).is_err() {
        return PrecheckOutcome::Missing;
    }

    PrecheckOutcome::Eligible
}

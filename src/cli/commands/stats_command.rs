//! Stats command feature.
//!
//! This module owns and handles the "panel-clean stats" command behavior.

use crate::config::Config;
use crate::output;
use crate::stats::CleanupStats;
use crate::store::SqliteStore;
use anyhow::Context;

pub(crate) fn handle_stats(config: &Config, json: bool) -> anyhow::Result<()> {
    let db_path = config.database_path();
    let stats = if db_path.exists() {
        let store = SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open store {}", db_path.display()))?;
        CleanupStats::load(&store)?
    } else {
        CleanupStats::default()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        output::print_stats(&stats);
    }
    Ok(())
}

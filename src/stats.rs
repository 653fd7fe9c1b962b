//! Last-clean statistics kept in the settings store.

use crate::error::Result;
use crate::store::SettingsStore;
use chrono::{DateTime, Local};
use serde::Serialize;

pub const LAST_CLEAN_TIME: &str = "LastCleanTime";
pub const LAST_CLEAN_SIZE: &str = "LastCleanSize";
pub const LAST_CLEAN_DATA: &str = "LastCleanData";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub last_clean_time: Option<String>,
    pub last_clean_size: u64,
    pub last_clean_data: u64,
}

impl CleanupStats {
    pub fn load(store: &dyn SettingsStore) -> Result<Self> {
        let number = |key: &str| -> Result<u64> {
            Ok(store
                .get(key)?
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0))
        };

        Ok(Self {
            last_clean_time: store.get(LAST_CLEAN_TIME)?,
            last_clean_size: number(LAST_CLEAN_SIZE)?,
            last_clean_data: number(LAST_CLEAN_DATA)?,
        })
    }
}

/// Overwrite the three statistics keys with one call's totals.
///
/// Each key is written even if an earlier write failed; the first error is
/// returned after all three were attempted.
pub fn record(
    store: &dyn SettingsStore,
    at: DateTime<Local>,
    total_bytes: u64,
    item_count: usize,
) -> Result<()> {
    let writes = [
        (LAST_CLEAN_TIME, at.format(TIME_FORMAT).to_string()),
        (LAST_CLEAN_SIZE, total_bytes.to_string()),
        (LAST_CLEAN_DATA, item_count.to_string()),
    ];

    let mut first_error = None;
    for (key, value) in writes {
        if let Err(e) = store.update(key, &value) {
            tracing::error!(key, error = %e, "failed to update clean statistics");
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    #[test]
    fn test_record_overwrites() {
        let store = MemoryStore::new();
        let at = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();

        record(&store, at, 1024, 3).unwrap();
        record(&store, at, 10, 1).unwrap();

        let stats = CleanupStats::load(&store).unwrap();
        assert_eq!(stats.last_clean_time.as_deref(), Some("2024-03-09 14:05:00"));
        assert_eq!(stats.last_clean_size, 10);
        assert_eq!(stats.last_clean_data, 1);
    }

    #[test]
    fn test_load_empty_store() {
        let stats = CleanupStats::load(&MemoryStore::new()).unwrap();
        assert_eq!(stats, CleanupStats::default());
    }
}

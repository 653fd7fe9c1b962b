//! Category tokens shared by the scan report and the clean request.
//!
//! The string form of each variant is a wire contract: it appears in the
//! report's `category` field and must be echoed back unchanged in a clean
//! selection.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "1panel_original")]
    Original,
    #[serde(rename = "upgrade")]
    Upgrade,

    #[serde(rename = "snapshot")]
    Snapshot,
    #[serde(rename = "snapshot_tmp")]
    SnapshotTmp,
    #[serde(rename = "snapshot_local")]
    SnapshotLocal,

    #[serde(rename = "rollback")]
    Rollback,
    #[serde(rename = "rollback_app")]
    RollbackApp,
    #[serde(rename = "rollback_database")]
    RollbackDatabase,
    #[serde(rename = "rollback_website")]
    RollbackWebsite,

    #[serde(rename = "cache")]
    Cache,

    #[serde(rename = "unused")]
    Unused,
    #[serde(rename = "old_original")]
    OldOriginal,
    #[serde(rename = "old_apps_bak")]
    OldAppsBak,
    #[serde(rename = "old_download")]
    OldDownload,
    #[serde(rename = "old_upgrade")]
    OldUpgrade,

    #[serde(rename = "upload")]
    Upload,
    #[serde(rename = "upload_tmp")]
    UploadTmp,
    #[serde(rename = "upload_app")]
    UploadApp,
    #[serde(rename = "upload_database")]
    UploadDatabase,
    #[serde(rename = "upload_website")]
    UploadWebsite,
    #[serde(rename = "upload_directory")]
    UploadDirectory,

    #[serde(rename = "download")]
    Download,
    #[serde(rename = "download_app")]
    DownloadApp,
    #[serde(rename = "download_database")]
    DownloadDatabase,
    #[serde(rename = "download_website")]
    DownloadWebsite,
    #[serde(rename = "download_directory")]
    DownloadDirectory,

    #[serde(rename = "system_log")]
    SystemLog,
    #[serde(rename = "docker_log")]
    DockerLog,
    #[serde(rename = "task_log")]
    TaskLog,
}

/// Sub-directory names reserved for the per-kind upload/download categories.
pub const RESERVED_KINDS: [&str; 4] = ["app", "database", "website", "directory"];

impl Category {
    pub const ALL: [Category; 29] = [
        Category::Original,
        Category::Upgrade,
        Category::Snapshot,
        Category::SnapshotTmp,
        Category::SnapshotLocal,
        Category::Rollback,
        Category::RollbackApp,
        Category::RollbackDatabase,
        Category::RollbackWebsite,
        Category::Cache,
        Category::Unused,
        Category::OldOriginal,
        Category::OldAppsBak,
        Category::OldDownload,
        Category::OldUpgrade,
        Category::Upload,
        Category::UploadTmp,
        Category::UploadApp,
        Category::UploadDatabase,
        Category::UploadWebsite,
        Category::UploadDirectory,
        Category::Download,
        Category::DownloadApp,
        Category::DownloadDatabase,
        Category::DownloadWebsite,
        Category::DownloadDirectory,
        Category::SystemLog,
        Category::DockerLog,
        Category::TaskLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Original => "1panel_original",
            Category::Upgrade => "upgrade",
            Category::Snapshot => "snapshot",
            Category::SnapshotTmp => "snapshot_tmp",
            Category::SnapshotLocal => "snapshot_local",
            Category::Rollback => "rollback",
            Category::RollbackApp => "rollback_app",
            Category::RollbackDatabase => "rollback_database",
            Category::RollbackWebsite => "rollback_website",
            Category::Cache => "cache",
            Category::Unused => "unused",
            Category::OldOriginal => "old_original",
            Category::OldAppsBak => "old_apps_bak",
            Category::OldDownload => "old_download",
            Category::OldUpgrade => "old_upgrade",
            Category::Upload => "upload",
            Category::UploadTmp => "upload_tmp",
            Category::UploadApp => "upload_app",
            Category::UploadDatabase => "upload_database",
            Category::UploadWebsite => "upload_website",
            Category::UploadDirectory => "upload_directory",
            Category::Download => "download",
            Category::DownloadApp => "download_app",
            Category::DownloadDatabase => "download_database",
            Category::DownloadWebsite => "download_website",
            Category::DownloadDirectory => "download_directory",
            Category::SystemLog => "system_log",
            Category::DockerLog => "docker_log",
            Category::TaskLog => "task_log",
        }
    }

    /// Report section this category is shown under
    pub fn section(&self) -> Section {
        match self {
            Category::Upload
            | Category::UploadTmp
            | Category::UploadApp
            | Category::UploadDatabase
            | Category::UploadWebsite
            | Category::UploadDirectory => Section::Upload,
            Category::Download
            | Category::DownloadApp
            | Category::DownloadDatabase
            | Category::DownloadWebsite
            | Category::DownloadDirectory => Section::Download,
            Category::SystemLog | Category::DockerLog | Category::TaskLog => Section::Log,
            _ => Section::System,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::UnknownCategory(s.to_string()))
    }
}

/// The four report sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    System,
    Upload,
    Download,
    Log,
}

impl Section {
    pub fn title(&self) -> &'static str {
        match self {
            Section::System => "System",
            Section::Upload => "Uploads",
            Section::Download => "Downloads",
            Section::Log => "Logs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_tokens() {
        for category in Category::ALL {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);

            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_unknown_token() {
        assert!(matches!(
            "snapshots".parse::<Category>(),
            Err(Error::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_sections() {
        assert_eq!(Category::Cache.section(), Section::System);
        assert_eq!(Category::UploadTmp.section(), Section::Upload);
        assert_eq!(Category::Download.section(), Section::Download);
        assert_eq!(Category::TaskLog.section(), Section::Log);
    }
}

//! Integration tests for panel-clean
//!
//! These tests verify end-to-end scan and clean workflows against a fake
//! panel installation in a temporary directory.

use panel_clean::catalog::PathCatalog;
use panel_clean::category::Category;
use panel_clean::cleaner::CleanExecutor;
use panel_clean::report::CleanSelection;
use panel_clean::scanner;
use panel_clean::service::ServiceRestarter;
use panel_clean::size;
use panel_clean::stats::CleanupStats;
use panel_clean::store::{MemoryStore, SettingsStore, SqliteStore, TaskRecordStore};
use panel_clean::Error;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

fn create_test_dir() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Records restarts; optionally simulates the restart command failing.
#[derive(Default)]
struct RecordingRestarter {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl ServiceRestarter for RecordingRestarter {
    fn restart(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            // Failures are only logged by real restarters
            eprintln!("restart failed (simulated)");
        }
    }
}

/// Store whose every write fails
struct BrokenStore;

impl SettingsStore for BrokenStore {
    fn get(&self, _key: &str) -> panel_clean::Result<Option<String>> {
        Ok(None)
    }

    fn update(&self, _key: &str, _value: &str) -> panel_clean::Result<()> {
        Err(Error::Io(io::Error::new(io::ErrorKind::Other, "read-only database")))
    }
}

impl TaskRecordStore for BrokenStore {
    fn delete_records_for(&self, _path: &Path) -> panel_clean::Result<usize> {
        Err(Error::Io(io::Error::new(io::ErrorKind::Other, "read-only database")))
    }
}

struct Panel {
    _temp_dir: TempDir,
    base: PathBuf,
    backup: PathBuf,
}

impl Panel {
    fn new() -> Self {
        let temp_dir = create_test_dir();
        let base = temp_dir.path().join("opt");
        let backup = temp_dir.path().join("backup");
        fs::create_dir_all(&base).unwrap();
        fs::create_dir_all(&backup).unwrap();
        Self {
            _temp_dir: temp_dir,
            base,
            backup,
        }
    }

    fn catalog(&self) -> PathCatalog {
        PathCatalog::new(&self.base, &self.backup).unwrap()
    }

    fn file(&self, relative: &str, bytes: usize) -> PathBuf {
        let path = self.base.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, vec![b'x'; bytes]).unwrap();
        path
    }

    fn dir(&self, relative: &str) -> PathBuf {
        let path = self.base.join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }
}

fn clean(
    catalog: &PathCatalog,
    store: &MemoryStore,
    restarter: &RecordingRestarter,
    selection: &[CleanSelection],
) -> panel_clean::CleanSummary {
    CleanExecutor::new(catalog, store, store, restarter).clean(selection)
}

#[test]
fn test_dir_size_matches_sum_of_files() {
    let panel = Panel::new();
    panel.file("1panel/log/a.log", 10);
    panel.file("1panel/log/nested/b.log", 20);
    panel.file("1panel/log/nested/deeper/c.log", 30);

    assert_eq!(size::dir_size(&panel.base.join("1panel/log")).unwrap(), 60);
}

#[test]
fn test_upgrade_scenario_holds_newest_package() {
    let panel = Panel::new();
    for name in ["upgrade_20230101", "upgrade_20230215", "upgrade_20230301"] {
        panel.file(&format!("1panel/tmp/upgrade/{}/1panel.tar.gz", name), 4);
    }

    let report = scanner::scan_all(&panel.catalog()).unwrap();
    let upgrade = report.top_level(Category::Upgrade).unwrap();
    let names: Vec<&str> = upgrade.children.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["upgrade_20230301", "upgrade_20230215", "upgrade_20230101"]
    );

    assert!(!upgrade.children[0].is_selected_by_default);
    assert!(!upgrade.children[0].is_recommended);
    for node in &upgrade.children[1..] {
        assert!(node.is_selected_by_default);
        assert!(node.is_recommended);
    }
    assert_eq!(upgrade.size_bytes, 12);
}

#[test]
fn test_scan_never_offers_active_log() {
    let panel = Panel::new();
    panel.file("1panel/log/1Panel.log", 5);
    panel.file("1panel/log/archive/1Panel.log", 5);
    panel.file("1panel/log/archive/old.log", 5);

    let report = scanner::scan_all(&panel.catalog()).unwrap();
    let log = report.top_level(Category::SystemLog).unwrap();

    let mut names = Vec::new();
    log.walk(&mut |n| names.push(n.name.clone()));
    assert!(names.iter().all(|n| !n.ends_with("1Panel.log")));
    assert!(names.contains(&"archive/old.log".to_string()));
}

#[test]
fn test_scan_umbrella_skips_reserved_kinds() {
    let panel = Panel::new();
    panel.file("1panel/uploads/app/redis.tar.gz", 3);
    panel.file("1panel/uploads/stray.zip", 2);
    panel.file("1panel/download/website/site.tar.gz", 1);

    let report = scanner::scan_all(&panel.catalog()).unwrap();

    let upload_names: Vec<(Category, &str)> = report
        .upload_clean
        .iter()
        .map(|n| (n.category, n.name.as_str()))
        .collect();
    assert!(upload_names.contains(&(Category::Upload, "stray.zip")));
    assert!(!upload_names.contains(&(Category::Upload, "app")));

    let app = report
        .upload_clean
        .iter()
        .find(|n| n.category == Category::UploadApp)
        .unwrap();
    assert_eq!(app.size_bytes, 3);

    assert!(report
        .download_clean
        .iter()
        .all(|n| !(n.category == Category::Download && n.name == "website")));
}

#[test]
fn test_rollback_removes_all_staging_roots() {
    let panel = Panel::new();
    let app = panel.file("1panel/tmp/app/redis/a.tar.gz", 1);
    let database = panel.file("1panel/tmp/database/mysql/b.sql", 1);
    let website = panel.file("1panel/tmp/website/blog/c.tar.gz", 1);
    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();

    clean(
        &panel.catalog(),
        &store,
        &restarter,
        &[CleanSelection::new(Category::Rollback, "redis", 3)],
    );

    assert!(!app.exists());
    assert!(!database.exists());
    assert!(!website.exists());
    assert!(!panel.base.join("1panel/tmp/app").exists());
    assert!(panel.base.join("1panel/tmp").exists());
}

#[test]
fn test_unused_without_prior_scan() {
    let panel = Panel::new();
    panel.file("original/bin/1panel", 1);
    panel.file("1panel/resource/apps_bak/app.tar", 1);
    panel.file("1panel/tmp/download/pkg.tar", 1);
    let stale_upgrade = panel.dir("1panel/tmp/upgrade_20220101");
    let current_upgrade = panel.dir("1panel/tmp/upgrade");
    let keep = panel.file("1panel/tmp/system/snap.tar.gz", 1);
    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();

    clean(
        &panel.catalog(),
        &store,
        &restarter,
        &[CleanSelection::new(Category::Unused, "", 0)],
    );

    assert!(!panel.base.join("original").exists());
    assert!(!panel.base.join("1panel/resource/apps_bak").exists());
    assert!(!panel.base.join("1panel/tmp/download").exists());
    assert!(!stale_upgrade.exists());
    assert!(current_upgrade.exists());
    assert!(keep.exists());
}

#[test]
fn test_upgrade_wildcard_keeps_unprefixed_entries() {
    let panel = Panel::new();
    let old = panel.file("1panel/tmp/upgrade/upgrade_20230101/pkg", 1);
    let newer = panel.file("1panel/tmp/upgrade/upgrade_20230301/pkg", 1);
    let keep = panel.file("1panel/tmp/upgrade/keep_me/notes.txt", 1);
    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();

    clean(
        &panel.catalog(),
        &store,
        &restarter,
        &[CleanSelection::new(Category::Upgrade, "", 2)],
    );

    assert!(!old.exists());
    assert!(!newer.exists());
    assert!(keep.exists());
    assert!(panel.base.join("1panel/tmp/upgrade").exists());
}

#[test]
fn test_old_upgrade_wildcard_keeps_unprefixed_entries() {
    let panel = Panel::new();
    let stale = panel.dir("1panel/tmp/upgrade_20220101");
    let current = panel.dir("1panel/tmp/upgrade");
    let app = panel.file("1panel/tmp/app/redis/a.tar.gz", 1);
    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();

    let summary = clean(
        &panel.catalog(),
        &store,
        &restarter,
        &[CleanSelection::new(Category::OldUpgrade, "", 1)],
    );

    assert!(!stale.exists());
    assert!(current.exists());
    assert!(app.exists());
    assert_eq!(summary.deleted, vec![stale]);
}

#[test]
fn test_stats_overwritten_not_accumulated() {
    let panel = Panel::new();
    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();
    let catalog = panel.catalog();

    clean(
        &catalog,
        &store,
        &restarter,
        &[
            CleanSelection::new(Category::DockerLog, "a.log", 100),
            CleanSelection::new(Category::DockerLog, "b.log", 200),
        ],
    );
    clean(
        &catalog,
        &store,
        &restarter,
        &[CleanSelection::new(Category::SystemLog, "c.log", 7)],
    );

    let stats = CleanupStats::load(&store).unwrap();
    assert_eq!(stats.last_clean_size, 7);
    assert_eq!(stats.last_clean_data, 1);
}

#[test]
fn test_system_log_wildcard_keeps_active_log() {
    let panel = Panel::new();
    let app = panel.file("1panel/log/app.log", 1);
    let error = panel.file("1panel/log/error.log", 1);
    let active = panel.file("1panel/log/1Panel.log", 1);
    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();

    clean(
        &panel.catalog(),
        &store,
        &restarter,
        &[CleanSelection::new(Category::SystemLog, "", 2)],
    );

    assert!(!app.exists());
    assert!(!error.exists());
    assert!(active.exists());
}

#[test]
fn test_cache_restart_once_and_failure_does_not_change_totals() {
    let panel = Panel::new();
    panel.file("1panel/cache/badger/000001.vlog", 8);
    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();
    restarter.fail.store(true, Ordering::SeqCst);

    let summary = clean(
        &panel.catalog(),
        &store,
        &restarter,
        &[
            CleanSelection::new(Category::Cache, "", 8),
            CleanSelection::new(Category::Cache, "whatever", 1),
        ],
    );

    assert_eq!(restarter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(summary.total_bytes, 9);
    assert_eq!(summary.item_count, 2);

    let stats = CleanupStats::load(&store).unwrap();
    assert_eq!(stats.last_clean_size, 9);
    assert_eq!(stats.last_clean_data, 2);
    assert!(!panel.base.join("1panel/cache").exists());
}

#[test]
fn test_store_failures_do_not_abort_batch() {
    let panel = Panel::new();
    let task = panel.file("1panel/task/shell/1.log", 1);
    let later = panel.file("1panel/log/later.log", 1);
    let restarter = RecordingRestarter::default();

    let summary = CleanExecutor::new(&panel.catalog(), &BrokenStore, &BrokenStore, &restarter)
        .clean(&[
            CleanSelection::new(Category::TaskLog, "shell/1.log", 3),
            CleanSelection::new(Category::SystemLog, "/etc/passwd", 5),
            CleanSelection::new(Category::SystemLog, "later.log", 7),
        ]);

    assert!(summary.failed >= 1);
    assert_eq!(summary.failed, 2);
    assert!(!task.exists());
    assert!(!later.exists());
    assert_eq!(summary.item_count, 3);
    assert_eq!(summary.total_bytes, 15);
}

#[test]
fn test_missing_paths_are_silent() {
    let panel = Panel::new();
    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();

    let summary = clean(
        &panel.catalog(),
        &store,
        &restarter,
        &[
            CleanSelection::new(Category::Snapshot, "gone.tar.gz", 1),
            CleanSelection::new(Category::UploadApp, "", 1),
        ],
    );

    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 3);
    assert_eq!(summary.item_count, 2);
}

#[test]
fn test_task_log_wildcard_purges_records_with_sqlite() {
    let panel = Panel::new();
    let first = panel.file("1panel/task/shell/1.log", 1);
    let second = panel.file("1panel/task/curl/2.log", 1);
    let store = SqliteStore::open(&panel.base.join("1panel/db/clean.db")).unwrap();
    store.add_task_record("backup", &first).unwrap();
    store.add_task_record("curl", &second).unwrap();
    store
        .add_task_record("unrelated", Path::new("/var/log/other.log"))
        .unwrap();
    let restarter = RecordingRestarter::default();

    let summary = CleanExecutor::new(&panel.catalog(), &store, &store, &restarter)
        .clean(&[CleanSelection::new(Category::TaskLog, "", 2)]);

    assert_eq!(summary.records_purged, 2);
    let left = store.list_task_records().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].task_name, "unrelated");
    assert!(!panel.base.join("1panel/task").exists());

    let stats = CleanupStats::load(&store).unwrap();
    assert_eq!(stats.last_clean_size, 2);
}

#[test]
fn test_default_selection_end_to_end() {
    let panel = Panel::new();
    for name in ["upgrade_20230101", "upgrade_20230301"] {
        panel.file(&format!("1panel/tmp/upgrade/{}/pkg", name), 2);
    }
    panel.file("1panel/tmp/docker_logs/c1.log", 3);
    panel.file("1panel/log/1Panel.log", 4);
    panel.file("1panel/log/old.log", 5);
    let cache = panel.file("1panel/cache/db", 6);
    let task = panel.file("1panel/task/shell/1.log", 7);
    let catalog = panel.catalog();

    let report = scanner::scan_all(&catalog).unwrap();
    let selection = report.default_selection();

    assert!(selection.iter().all(|s| s.category != Category::Cache));
    assert!(selection.iter().all(|s| s.category != Category::TaskLog));
    assert!(selection
        .iter()
        .any(|s| s.category == Category::Upgrade && s.name == "upgrade_20230101"));

    let store = MemoryStore::new();
    let restarter = RecordingRestarter::default();
    clean(&catalog, &store, &restarter, &selection);

    assert!(!panel.base.join("1panel/tmp/upgrade/upgrade_20230101").exists());
    assert!(panel.base.join("1panel/tmp/upgrade/upgrade_20230301").exists());
    assert!(!panel.base.join("1panel/tmp/docker_logs/c1.log").exists());
    assert!(!panel.base.join("1panel/log/old.log").exists());
    assert!(panel.base.join("1panel/log/1Panel.log").exists());
    assert!(cache.exists());
    assert!(task.exists());
    assert_eq!(restarter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_scan_missing_base_dir_fails() {
    let temp_dir = create_test_dir();
    let catalog = PathCatalog::new(temp_dir.path().join("nope"), temp_dir.path().join("b")).unwrap();
    assert!(scanner::scan_all(&catalog).is_err());
}

#[cfg(unix)]
#[test]
fn test_cli_clean_runs_restart_command_before_exit() {
    use std::process::Command;

    let panel = Panel::new();
    let cache = panel.file("1panel/cache/badger/000001.vlog", 4);
    let dir = panel._temp_dir.path();
    let marker = dir.join("restarted");
    let script = dir.join("restart.sh");
    fs::write(&script, format!("echo restarted >> '{}'\n", marker.display())).unwrap();

    let config = dir.join("config.toml");
    fs::write(
        &config,
        format!(
            "[paths]\nbase_dir = '{}'\nbackup_dir = '{}'\n\n[service]\nrestart_command = ['sh', '{}']\ntimeout_secs = 30\n",
            panel.base.display(),
            panel.backup.display(),
            script.display()
        ),
    )
    .unwrap();
    let selection = dir.join("selection.json");
    fs::write(&selection, r#"[{"category":"cache","name":"","sizeBytes":4}]"#).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_panel-clean"))
        .arg("clean")
        .arg("--config")
        .arg(&config)
        .arg("--selection")
        .arg(&selection)
        .arg("--no-store")
        .env_remove(panel_clean::logging::LOG_ENV)
        .output()
        .unwrap();

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(!cache.exists());
    assert_eq!(fs::read_to_string(&marker).unwrap(), "restarted\n");
    assert!(String::from_utf8_lossy(&output.stderr).contains("service restarted"));
}

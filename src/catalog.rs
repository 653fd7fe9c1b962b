//! Path catalog: where each category scans from and what a deletion of it
//! must remove.
//!
//! Every root is expressed relative to one of two configured directories,
//! the application base directory and the backup directory.

use crate::category::{Category, RESERVED_KINDS};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::tree::{Defaults, Exclusion, Holdback, TraversalOptions};
use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Default glob for version-stamped upgrade package directories
pub const DEFAULT_UPGRADE_PATTERN: &str = "upgrade_20*";

/// Name of the log file the panel is currently writing
pub const DEFAULT_ACTIVE_LOG: &str = "1Panel.log";

/// Prefix swept by wildcard upgrade deletes
pub const UPGRADE_PREFIX: &str = "upgrade_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Base,
    Backup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Immediate subdirectories only
    Shallow,
    /// Every file and directory, nested
    Deep,
    /// Size of the root, no children
    Flat,
}

#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub category: Category,
    pub anchor: Anchor,
    pub relative: &'static str,
    pub strategy: Strategy,
    /// Flags of the synthetic node standing for the whole location
    pub group: Defaults,
    /// Flags of the entries found under it
    pub defaults: Defaults,
}

const fn entry(
    category: Category,
    anchor: Anchor,
    relative: &'static str,
    strategy: Strategy,
    group: Defaults,
    defaults: Defaults,
) -> CatalogEntry {
    CatalogEntry {
        category,
        anchor,
        relative,
        strategy,
        group,
        defaults,
    }
}

use Anchor::{Backup, Base};
use Strategy::{Deep, Flat, Shallow};

const ON: Defaults = Defaults::ON;
const OFF: Defaults = Defaults::OFF;
const HINT: Defaults = Defaults::RECOMMENDED;

/// Categories with a location of their own. Coarse tokens are absent here;
/// they resolve through the entries of their members.
pub const ENTRIES: &[CatalogEntry] = &[
    entry(Category::Original, Base, "1panel_original", Shallow, ON, ON),
    entry(Category::Upgrade, Base, "1panel/tmp/upgrade", Shallow, HINT, ON),
    entry(Category::SnapshotTmp, Base, "1panel/tmp/system", Deep, HINT, ON),
    entry(Category::SnapshotLocal, Backup, "system", Deep, HINT, ON),
    entry(Category::RollbackApp, Base, "1panel/tmp/app", Deep, HINT, ON),
    entry(Category::RollbackDatabase, Base, "1panel/tmp/database", Deep, HINT, ON),
    entry(Category::RollbackWebsite, Base, "1panel/tmp/website", Deep, HINT, ON),
    entry(Category::Cache, Base, "1panel/cache", Flat, OFF, OFF),
    entry(Category::OldOriginal, Base, "original", Deep, OFF, ON),
    entry(Category::OldAppsBak, Base, "1panel/resource/apps_bak", Deep, OFF, ON),
    entry(Category::OldDownload, Base, "1panel/tmp/download", Deep, OFF, ON),
    entry(Category::OldUpgrade, Base, "1panel/tmp", Shallow, OFF, ON),
    entry(Category::Upload, Base, "1panel/uploads", Deep, HINT, ON),
    entry(Category::UploadTmp, Base, "1panel/tmp/upload", Deep, HINT, ON),
    entry(Category::UploadApp, Base, "1panel/uploads/app", Deep, HINT, ON),
    entry(Category::UploadDatabase, Base, "1panel/uploads/database", Deep, HINT, ON),
    entry(Category::UploadWebsite, Base, "1panel/uploads/website", Deep, HINT, ON),
    entry(Category::UploadDirectory, Base, "1panel/uploads/directory", Deep, HINT, ON),
    entry(Category::Download, Base, "1panel/download", Deep, HINT, ON),
    entry(Category::DownloadApp, Base, "1panel/download/app", Deep, HINT, ON),
    entry(Category::DownloadDatabase, Base, "1panel/download/database", Deep, HINT, ON),
    entry(Category::DownloadWebsite, Base, "1panel/download/website", Deep, HINT, ON),
    entry(Category::DownloadDirectory, Base, "1panel/download/directory", Deep, HINT, ON),
    entry(Category::SystemLog, Base, "1panel/log", Deep, HINT, ON),
    entry(Category::DockerLog, Base, "1panel/tmp/docker_logs", Deep, HINT, ON),
    entry(Category::TaskLog, Base, "1panel/task", Deep, OFF, OFF),
];

/// How a selection of a category turns into filesystem removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeleteRule {
    /// `root/name`
    Item,
    /// `root/name` for each member
    FanOut(&'static [Category]),
    /// Every member root, `name` ignored; optionally sweep upgrade packages
    /// out of another member's root as well
    Wholesale {
        roots: &'static [Category],
        sweep_upgrades: Option<Category>,
    },
    /// Empty name sweeps upgrade packages out of the root
    UpgradeWildcard,
    /// Empty name removes every entry except the active log
    LogWildcard,
    /// `root/name`, plus the upload staging root when name is empty
    UploadUmbrella,
    /// `root/name`, plus the task records that point at what was removed
    TaskLog,
    /// `root/name`, then restart the service once the batch is done
    Cache,
}

fn delete_rule(category: Category) -> DeleteRule {
    match category {
        Category::Snapshot => DeleteRule::FanOut(&[Category::SnapshotTmp, Category::SnapshotLocal]),
        Category::Rollback => DeleteRule::Wholesale {
            roots: &[
                Category::RollbackApp,
                Category::RollbackDatabase,
                Category::RollbackWebsite,
            ],
            sweep_upgrades: None,
        },
        Category::Unused => DeleteRule::Wholesale {
            roots: &[
                Category::OldOriginal,
                Category::OldAppsBak,
                Category::OldDownload,
            ],
            sweep_upgrades: Some(Category::OldUpgrade),
        },
        Category::Upgrade | Category::OldUpgrade => DeleteRule::UpgradeWildcard,
        Category::SystemLog => DeleteRule::LogWildcard,
        Category::Upload => DeleteRule::UploadUmbrella,
        Category::TaskLog => DeleteRule::TaskLog,
        Category::Cache => DeleteRule::Cache,
        _ => DeleteRule::Item,
    }
}

/// Concrete work for one selection item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletePlan {
    pub paths: Vec<PathBuf>,
    /// Paths whose task execution records must be purged after deletion
    pub purge_records: Vec<PathBuf>,
    pub restart: bool,
}

#[derive(Debug, Clone)]
pub struct PathCatalog {
    base_dir: PathBuf,
    backup_dir: PathBuf,
    upgrade_pattern: GlobMatcher,
    active_log: String,
}

impl PathCatalog {
    pub fn new(base_dir: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            base_dir: base_dir.into(),
            backup_dir: backup_dir.into(),
            upgrade_pattern: Glob::new(DEFAULT_UPGRADE_PATTERN)?.compile_matcher(),
            active_log: DEFAULT_ACTIVE_LOG.to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.base_dir(), config.backup_dir())?
            .with_upgrade_pattern(&config.policy.upgrade_pattern)?
            .with_active_log(&config.policy.active_log))
    }

    pub fn with_upgrade_pattern(mut self, pattern: &str) -> Result<Self> {
        self.upgrade_pattern = Glob::new(pattern)?.compile_matcher();
        Ok(self)
    }

    pub fn with_active_log(mut self, name: &str) -> Self {
        self.active_log = name.to_string();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn active_log(&self) -> &str {
        &self.active_log
    }

    pub fn entry(&self, category: Category) -> Option<&'static CatalogEntry> {
        ENTRIES.iter().find(|e| e.category == category)
    }

    /// Absolute scan root of a category; `None` for coarse tokens
    pub fn root(&self, category: Category) -> Option<PathBuf> {
        self.entry(category).map(|e| {
            let anchor = match e.anchor {
                Anchor::Base => &self.base_dir,
                Anchor::Backup => &self.backup_dir,
            };
            anchor.join(e.relative)
        })
    }

    /// Traversal policy for a category's scan
    pub fn traversal(&self, category: Category) -> TraversalOptions {
        let defaults = self
            .entry(category)
            .map(|e| e.defaults)
            .unwrap_or(Defaults::ON);
        let options = TraversalOptions::new(category, defaults);

        match category {
            Category::Upgrade => options
                .exclude(Exclusion::NotUpgradePackage(self.upgrade_pattern.clone()))
                .hold_back(Holdback::Newest),
            Category::OldUpgrade => {
                options.exclude(Exclusion::NotUpgradePackage(self.upgrade_pattern.clone()))
            }
            Category::SystemLog => options.exclude(Exclusion::ActiveLog(self.active_log.clone())),
            Category::Upload | Category::Download => {
                options.exclude(Exclusion::ReservedKinds(&RESERVED_KINDS))
            }
            _ => options,
        }
    }

    /// Whether `path` lies inside the base or backup directory
    pub fn contains(&self, path: &Path) -> bool {
        path.starts_with(&self.base_dir) || path.starts_with(&self.backup_dir)
    }

    /// Whether `path` is one of the two configured directories themselves
    pub fn is_anchor(&self, path: &Path) -> bool {
        path == self.base_dir || path == self.backup_dir
    }

    /// Resolve one selection item to the paths it removes.
    ///
    /// Wildcard forms list the directory now, so the plan reflects the
    /// filesystem at delete time rather than the report the name came from.
    pub fn resolve(&self, category: Category, name: &str) -> Result<DeletePlan> {
        let mut plan = DeletePlan::default();

        match delete_rule(category) {
            DeleteRule::Item => plan.paths.push(self.item_path(category, name)?),
            DeleteRule::FanOut(members) => {
                for member in members {
                    plan.paths.push(self.item_path(*member, name)?);
                }
            }
            DeleteRule::Wholesale {
                roots,
                sweep_upgrades,
            } => {
                plan.paths.extend(roots.iter().filter_map(|c| self.root(*c)));
                if let Some(member) = sweep_upgrades.and_then(|c| self.root(c)) {
                    plan.paths
                        .extend(entries_of(&member, |n| n.starts_with(UPGRADE_PREFIX)));
                }
            }
            DeleteRule::UpgradeWildcard => {
                if name.is_empty() {
                    let root = self.required_root(category)?;
                    plan.paths
                        .extend(entries_of(&root, |n| n.starts_with(UPGRADE_PREFIX)));
                } else {
                    plan.paths.push(self.item_path(category, name)?);
                }
            }
            DeleteRule::LogWildcard => {
                if name.is_empty() {
                    let root = self.required_root(category)?;
                    plan.paths
                        .extend(entries_of(&root, |n| n != self.active_log));
                } else {
                    plan.paths.push(self.item_path(category, name)?);
                }
            }
            DeleteRule::UploadUmbrella => {
                plan.paths.push(self.item_path(category, name)?);
                if name.is_empty() {
                    plan.paths.push(self.required_root(Category::UploadTmp)?);
                }
            }
            DeleteRule::TaskLog => {
                let path = self.item_path(category, name)?;
                if name.is_empty() {
                    // Listed before anything is removed
                    plan.purge_records.extend(entries_of(&path, |_| true));
                } else {
                    plan.purge_records.push(path.clone());
                }
                plan.paths.push(path);
            }
            DeleteRule::Cache => {
                plan.paths.push(self.item_path(category, name)?);
                plan.restart = true;
            }
        }

        Ok(plan)
    }

    fn required_root(&self, category: Category) -> Result<PathBuf> {
        self.root(category)
            .ok_or_else(|| Error::UnknownCategory(category.to_string()))
    }

    fn item_path(&self, category: Category, name: &str) -> Result<PathBuf> {
        let root = self.required_root(category)?;
        validate_name(name)?;
        if name.is_empty() {
            Ok(root)
        } else {
            Ok(root.join(name))
        }
    }
}

/// Names come from the caller; only plain relative paths are accepted.
///
/// `.` is refused as well: a name that points back at the root would turn
/// a single-item delete into a wildcard that bypasses the wildcard's own
/// filters (active log, upgrade prefix).
fn validate_name(name: &str) -> Result<()> {
    let safe = Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if safe {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

fn entries_of(dir: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "nothing to enumerate");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = read
        .flatten()
        .filter(|e| keep(&e.file_name().to_string_lossy()))
        .map(|e| e.path())
        .collect();
    paths.sort();
    paths
}

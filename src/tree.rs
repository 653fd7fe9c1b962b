//! Report tree nodes and the two traversal strategies that build them.
//!
//! Traversal is generic: category-specific policy (active log file, reserved
//! upload/download kinds, upgrade package naming, holding back the newest
//! package) is passed in through [`TraversalOptions`].

use crate::category::Category;
use crate::size;
use globset::GlobMatcher;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use walkdir::WalkDir;

/// One entry in the report tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanNode {
    pub id: String,
    pub label: String,
    /// Path relative to the category's traversal root; empty for group nodes
    pub name: String,
    pub size_bytes: u64,
    pub category: Category,
    pub is_selected_by_default: bool,
    pub is_recommended: bool,
    #[serde(default)]
    pub children: Vec<CleanNode>,
}

impl CleanNode {
    fn entry(label: &str, name: String, size_bytes: u64, options: &TraversalOptions) -> Self {
        Self {
            id: new_id(),
            label: label.to_string(),
            name,
            size_bytes,
            category: options.category,
            is_selected_by_default: options.defaults.selected,
            is_recommended: options.defaults.recommended,
            children: Vec::new(),
        }
    }

    /// Synthetic "everything under this category" node sized by its children.
    pub fn group(category: Category, defaults: Defaults, children: Vec<CleanNode>) -> Self {
        let size_bytes = children.iter().map(|c| c.size_bytes).sum();
        Self {
            id: new_id(),
            label: category.as_str().to_string(),
            name: String::new(),
            size_bytes,
            category,
            is_selected_by_default: defaults.selected,
            is_recommended: defaults.recommended,
            children,
        }
    }

    /// Group node without children whose size was measured directly.
    pub fn flat(category: Category, size_bytes: u64, defaults: Defaults) -> Self {
        Self {
            id: new_id(),
            label: category.as_str().to_string(),
            name: String::new(),
            size_bytes,
            category,
            is_selected_by_default: defaults.selected,
            is_recommended: defaults.recommended,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth-first visit of this node and every descendant
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a CleanNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Initial UI state for the nodes a traversal produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    pub selected: bool,
    pub recommended: bool,
}

impl Defaults {
    pub const ON: Defaults = Defaults {
        selected: true,
        recommended: true,
    };
    pub const OFF: Defaults = Defaults {
        selected: false,
        recommended: false,
    };
    /// Suggested, but left for the user to tick
    pub const RECOMMENDED: Defaults = Defaults {
        selected: false,
        recommended: true,
    };
}

/// Named rules for entries a traversal must not report.
#[derive(Debug, Clone)]
pub enum Exclusion {
    /// Entry with exactly this name, at any depth (the log file being written)
    ActiveLog(String),
    /// Directories with these names directly under the traversal root
    ReservedKinds(&'static [&'static str]),
    /// Entry whose name does not match the upgrade package pattern
    NotUpgradePackage(GlobMatcher),
}

impl Exclusion {
    pub fn excludes(&self, name: &str, is_dir: bool, depth: usize) -> bool {
        match self {
            Exclusion::ActiveLog(active) => name == active,
            Exclusion::ReservedKinds(kinds) => depth == 1 && is_dir && kinds.contains(&name),
            Exclusion::NotUpgradePackage(matcher) => !matcher.is_match(name),
        }
    }
}

/// Entries a traversal reports but leaves unselected and unrecommended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holdback {
    /// First entry in traversal order: with names sorted descending, the
    /// newest version-stamped package, presumed to be in use
    Newest,
}

impl Holdback {
    pub fn holds(&self, position: usize) -> bool {
        match self {
            Holdback::Newest => position == 0,
        }
    }
}

/// Policy for one traversal.
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    pub category: Category,
    pub defaults: Defaults,
    pub exclusions: Vec<Exclusion>,
    /// Shallow traversal only
    pub holdback: Option<Holdback>,
}

impl TraversalOptions {
    pub fn new(category: Category, defaults: Defaults) -> Self {
        Self {
            category,
            defaults,
            exclusions: Vec::new(),
            holdback: None,
        }
    }

    pub fn exclude(mut self, exclusion: Exclusion) -> Self {
        self.exclusions.push(exclusion);
        self
    }

    pub fn hold_back(mut self, holdback: Holdback) -> Self {
        self.holdback = Some(holdback);
        self
    }

    fn is_excluded(&self, name: &str, is_dir: bool, depth: usize) -> bool {
        self.exclusions
            .iter()
            .any(|e| e.excludes(name, is_dir, depth))
    }
}

struct Listed {
    name: String,
    is_dir: bool,
    path: std::path::PathBuf,
}

/// Immediate children of `dir`, sorted by name. `None` when `dir` can't be read.
fn list_dir(dir: &Path) -> Option<Vec<Listed>> {
    std::fs::read_dir(dir).ok()?;

    let entries = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| Listed {
            name: e.file_name().to_string_lossy().into_owned(),
            is_dir: e.file_type().is_dir(),
            path: e.into_path(),
        })
        .collect();

    Some(entries)
}

/// Shallow strategy: one node per immediate subdirectory of `root`,
/// newest-looking (descending name) first. Files at this level are ignored.
pub fn list_top_level_dirs(root: &Path, options: &TraversalOptions) -> Vec<CleanNode> {
    let mut entries = match list_dir(root) {
        Some(entries) => entries,
        None => {
            tracing::debug!(root = %root.display(), "scan root unreadable, skipping");
            return Vec::new();
        }
    };
    entries.sort_by(|a, b| b.name.cmp(&a.name));

    let mut nodes: Vec<CleanNode> = Vec::new();
    for entry in entries {
        if options.is_excluded(&entry.name, entry.is_dir, 1) || !entry.is_dir {
            continue;
        }
        let size = match size::dir_size(&entry.path) {
            Ok(size) => size,
            Err(_) => continue,
        };

        let mut node = CleanNode::entry(&entry.name, entry.name.clone(), size, options);
        if options.holdback.is_some_and(|h| h.holds(nodes.len())) {
            node.is_selected_by_default = false;
            node.is_recommended = false;
        }
        nodes.push(node);
    }

    nodes
}

/// Deep strategy: every file and directory under `root`, nested, each
/// named by its path relative to `root`.
pub fn list_all_recursive(root: &Path, options: &TraversalOptions) -> Vec<CleanNode> {
    if list_dir(root).is_none() {
        tracing::debug!(root = %root.display(), "scan root unreadable, skipping");
        return Vec::new();
    }
    collect_recursive(root, root, 1, options)
}

fn collect_recursive(
    root: &Path,
    dir: &Path,
    depth: usize,
    options: &TraversalOptions,
) -> Vec<CleanNode> {
    let entries = match list_dir(dir) {
        Some(entries) => entries,
        None => return Vec::new(),
    };

    let mut nodes = Vec::new();
    for entry in entries {
        if options.is_excluded(&entry.name, entry.is_dir, depth) {
            continue;
        }

        let size = if entry.is_dir {
            size::dir_size(&entry.path)
        } else {
            size::file_size(&entry.path)
        };
        let size = match size {
            Ok(size) => size,
            Err(_) => continue,
        };

        let mut node = CleanNode::entry(&entry.name, relative_name(root, &entry.path), size, options);
        if entry.is_dir {
            node.children = collect_recursive(root, &entry.path, depth + 1, options);
        }
        nodes.push(node);
    }

    nodes
}

/// `path` relative to `root`, always '/'-separated
pub fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

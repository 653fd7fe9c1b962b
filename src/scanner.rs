use crate::catalog::{PathCatalog, Strategy};
use crate::category::Category;
use crate::error::{Error, Result};
use crate::report::CleanReport;
use crate::size;
use crate::tree::{self, CleanNode, Defaults};

/// Scan every catalog location and assemble the grouped report.
///
/// Individual locations that are missing or unreadable just come back
/// empty. The scan fails only when the base directory itself can't be
/// listed, since every location would silently be empty otherwise.
pub fn scan_all(catalog: &PathCatalog) -> Result<CleanReport> {
    let base = catalog.base_dir();
    std::fs::read_dir(base).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(base.to_path_buf()),
        _ => Error::Io(e),
    })?;

    let report = CleanReport {
        system_clean: scan_system(catalog),
        upload_clean: scan_umbrella(
            catalog,
            Category::Upload,
            &[
                Category::UploadTmp,
                Category::UploadApp,
                Category::UploadWebsite,
                Category::UploadDatabase,
                Category::UploadDirectory,
            ],
        ),
        download_clean: scan_umbrella(
            catalog,
            Category::Download,
            &[
                Category::DownloadApp,
                Category::DownloadWebsite,
                Category::DownloadDatabase,
                Category::DownloadDirectory,
            ],
        ),
        system_log_clean: vec![
            group(catalog, Category::SystemLog),
            group(catalog, Category::DockerLog),
            group(catalog, Category::TaskLog),
        ],
    };

    tracing::info!(
        base = %base.display(),
        total_bytes = report.total_bytes(),
        "scan finished"
    );
    Ok(report)
}

fn scan_system(catalog: &PathCatalog) -> Vec<CleanNode> {
    let snapshots = [Category::SnapshotTmp, Category::SnapshotLocal]
        .into_iter()
        .filter_map(|c| non_empty_group(catalog, c))
        .collect();

    let rollbacks = [
        Category::RollbackApp,
        Category::RollbackWebsite,
        Category::RollbackDatabase,
    ]
    .into_iter()
    .map(|c| group(catalog, c))
    .collect();

    let unused = [
        Category::OldOriginal,
        Category::OldAppsBak,
        Category::OldDownload,
        Category::OldUpgrade,
    ]
    .into_iter()
    .filter_map(|c| non_empty_group(catalog, c))
    .collect();

    vec![
        group(catalog, Category::Original),
        group(catalog, Category::Upgrade),
        CleanNode::group(Category::Snapshot, Defaults::ON, snapshots),
        CleanNode::group(Category::Rollback, Defaults::ON, rollbacks),
        flat(catalog, Category::Cache),
        CleanNode::group(Category::Unused, Defaults::ON, unused),
    ]
}

/// Per-kind groups first, then the umbrella root's own entries inline.
fn scan_umbrella(catalog: &PathCatalog, umbrella: Category, kinds: &[Category]) -> Vec<CleanNode> {
    let mut nodes: Vec<CleanNode> = kinds.iter().map(|c| group(catalog, *c)).collect();
    nodes.extend(scan_category(catalog, umbrella));
    nodes
}

/// Children of one catalog location, built with its traversal strategy
pub fn scan_category(catalog: &PathCatalog, category: Category) -> Vec<CleanNode> {
    let (entry, root) = match (catalog.entry(category), catalog.root(category)) {
        (Some(entry), Some(root)) => (entry, root),
        _ => return Vec::new(),
    };
    let options = catalog.traversal(category);

    match entry.strategy {
        Strategy::Shallow => tree::list_top_level_dirs(&root, &options),
        Strategy::Deep => tree::list_all_recursive(&root, &options),
        Strategy::Flat => Vec::new(),
    }
}

/// Flags of the node standing for a whole catalog location
fn group_defaults(catalog: &PathCatalog, category: Category) -> Defaults {
    catalog
        .entry(category)
        .map(|e| e.group)
        .unwrap_or(Defaults::RECOMMENDED)
}

fn group(catalog: &PathCatalog, category: Category) -> CleanNode {
    CleanNode::group(
        category,
        group_defaults(catalog, category),
        scan_category(catalog, category),
    )
}

fn non_empty_group(catalog: &PathCatalog, category: Category) -> Option<CleanNode> {
    let children = scan_category(catalog, category);
    if children.is_empty() {
        None
    } else {
        Some(CleanNode::group(category, group_defaults(catalog, category), children))
    }
}

fn flat(catalog: &PathCatalog, category: Category) -> CleanNode {
    let size = catalog
        .root(category)
        .and_then(|root| size::dir_size(&root).ok())
        .unwrap_or(0);
    CleanNode::flat(category, size, group_defaults(catalog, category))
}

//! Size probing for report nodes.
//!
//! Both measurements read metadata only. Symlinks are never followed, so a link
//! inside a scanned tree contributes nothing to the total.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Size in bytes of a single file (or of the link itself for a symlink).
pub fn file_size(path: &Path) -> Result<u64> {
    let meta = fs::symlink_metadata(path).map_err(|e| not_found_or_io(path, e))?;
    Ok(meta.len())
}

/// Recursive sum of every regular file under `path`.
///
/// Fails only when the root itself is missing or unreadable. Errors on
/// nested entries are skipped so a single unreadable subdirectory does not
/// hide the rest of the tree.
pub fn dir_size(path: &Path) -> Result<u64> {
    let meta = fs::symlink_metadata(path).map_err(|e| not_found_or_io(path, e))?;
    if meta.is_file() {
        return Ok(meta.len());
    }
    if !meta.is_dir() {
        return Ok(0);
    }

    // Surface an unreadable root instead of reporting an empty directory
    fs::read_dir(path).map_err(|e| not_found_or_io(path, e))?;

    let mut total = 0u64;
    for entry in WalkDir::new(path).follow_links(false).into_iter() {
        let entry = match entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(m) = entry.metadata() {
            total += m.len();
        }
    }

    Ok(total)
}

/// Human readable size, e.g. "1.5 MB"
pub fn format_size(bytes: u64) -> String {
    bytesize::to_string(bytes, false)
}

fn not_found_or_io(path: &Path, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::NotFound(path.to_path_buf())
    } else {
        Error::Io(err)
    }
}

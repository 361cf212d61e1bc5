//! Recursive file discovery with extension matching and ignore rules.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{IoError, Result};
use crate::formats::normalise_extension;

/// Recursively find files under `root` whose name ends in `.extension`.
///
/// A file is dropped when its full path contains any `ignore_dirs` entry or
/// its file name contains any `ignore_files` entry. Matching is by plain
/// substring. The result is sorted.
///
/// A missing `root` yields no files.
///
/// # Errors
///
/// Returns an I/O error if a directory under `root` cannot be listed.
pub fn find_files(
    root: &Path,
    extension: &str,
    ignore_dirs: &[String],
    ignore_files: &[String],
) -> Result<Vec<PathBuf>> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let suffix_lower = format!(".{}", normalise_extension(extension));

    let mut found = Vec::new();
    if root.is_dir() {
        walk(root, &mut found)?;
    }

    let mut files: Vec<PathBuf> = found
        .into_iter()
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy())
                .is_some_and(|name| name.ends_with(&suffix) || name.ends_with(&suffix_lower))
        })
        .filter(|path| {
            let full = path.to_string_lossy();
            !ignore_dirs.iter().any(|bad| full.contains(bad.as_str()))
        })
        .filter(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            !ignore_files.iter().any(|bad| name.contains(bad.as_str()))
        })
        .collect();
    files.sort();

    log::debug!(
        "Found {} '{}' files under {}",
        files.len(),
        extension,
        root.display()
    );
    Ok(files)
}

/// Every regular file under `root`. Symlinks are listed but not followed.
fn walk(root: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|err| IoError::ReadDir {
            path: err.path().unwrap_or(root).to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_file() {
            out.push(entry.into_path());
        }
    }
    Ok(())
}

//! Version discovery from a dataset's directory layout.

use std::path::Path;

use crate::error::{IoError, Result};

/// Sorted names of the subdirectories of `base`.
///
/// A `base` that does not exist has no versions.
///
/// # Errors
///
/// Returns an I/O error if `base` exists but cannot be listed.
pub fn list_versions(base: &Path) -> Result<Vec<String>> {
    if !base.exists() {
        log::debug!("Dataset path {} does not exist; no versions", base.display());
        return Ok(Vec::new());
    }

    let read_dir_err = |source| IoError::ReadDir {
        path: base.to_path_buf(),
        source,
    };

    let mut versions = Vec::new();
    for entry in std::fs::read_dir(base).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        if entry.path().is_dir() {
            versions.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    versions.sort();
    Ok(versions)
}

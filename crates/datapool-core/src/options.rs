//! Caller options for `load_dataset` and their validation against a row.

use std::collections::BTreeMap;

use crate::error::OptionError;
use crate::row::CatalogRow;

/// Options passed through `load_dataset` to the row's loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Resolution label to select, for rows with resolution metadata.
    pub resolution: Option<String>,
    /// `Some(true)` for static files, `Some(false)` for annual files.
    pub static_files: Option<bool>,
    /// Loader-specific options, passed through untouched.
    pub extra: BTreeMap<String, String>,
}

impl LoadOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
        self.resolution = Some(resolution.into());
        self
    }

    #[must_use]
    pub fn with_static(mut self, static_files: bool) -> Self {
        self.static_files = Some(static_files);
        self
    }

    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// Reject options that name structure `row` does not have.
///
/// Runs before any file is touched so a mismatch is reported as such rather
/// than as an empty file list.
///
/// # Errors
///
/// Returns [`OptionError::ResolutionNotApplicable`] or
/// [`OptionError::StaticNotApplicable`].
pub fn check_options(row: &CatalogRow, options: &LoadOptions) -> Result<(), OptionError> {
    if options.resolution.is_some() && !row.has_resolutions() {
        return Err(OptionError::ResolutionNotApplicable {
            dataset: row.dataset.clone(),
        });
    }
    if options.static_files.is_some() && !row.has_static_patterns() {
        return Err(OptionError::StaticNotApplicable {
            dataset: row.dataset.clone(),
        });
    }
    Ok(())
}

//! Flattening of the configuration into resolved catalog rows.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use datapool_shared::NoDataValue;
use serde_yaml::Value;

use crate::config::{Attributes, CatalogConfig, DatasetConfig};
use crate::error::{ConfigError, Result};
use crate::filter::Resolutions;
use crate::resolve::{decode, normalise_list, resolve};
use crate::versions::list_versions;

/// Loader used when a row names none.
pub const DEFAULT_LOADER: &str = "default";

/// One resolved (dataset, version, subdataset) entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub dataset: String,
    pub display_name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub version: String,
    pub subdataset: Option<String>,
    /// Base path of the dataset.
    pub path: PathBuf,
    /// Directory searched for files: `path/version[/subpath]`.
    pub full_path: PathBuf,
    /// Extension without a leading dot.
    pub extension: String,
    pub skip_lines: usize,
    pub no_data_value: Option<NoDataValue>,
    pub ignore_dirs: Vec<String>,
    pub ignore_files: Vec<String>,
    pub loader: String,
    pub resolutions: Option<Resolutions>,
    pub static_patterns: Vec<String>,
}

impl CatalogRow {
    /// True when the row matches `keyword` (already lowercased) on its
    /// dataset name, display name or any tag.
    pub(crate) fn matches_keyword(&self, keyword: &str) -> bool {
        self.dataset.to_lowercase().contains(keyword)
            || self.display_name.to_lowercase().contains(keyword)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(keyword))
    }

    #[must_use]
    pub fn has_resolutions(&self) -> bool {
        self.resolutions.is_some()
    }

    #[must_use]
    pub fn has_static_patterns(&self) -> bool {
        !self.static_patterns.is_empty()
    }
}

impl fmt::Display for CatalogRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.dataset, self.version)?;
        if let Some(subdataset) = &self.subdataset {
            write!(f, " [{subdataset}]")?;
        }
        write!(f, " ({} via {})", self.extension, self.loader)
    }
}

/// Resolve every row the configuration describes.
///
/// Datasets with `subdatasets` produce one row per declared (version,
/// subdataset); each declared version must exist as a directory. Other
/// datasets produce one row per version directory found on disk.
///
/// # Errors
///
/// Returns a configuration error for a missing or malformed attribute, a
/// declared version with no directory, or a duplicate entry.
pub fn build_rows(config: &CatalogConfig) -> Result<Vec<CatalogRow>> {
    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for dataset in &config.datasets {
        let versions = list_versions(&dataset.path)?;
        log::debug!(
            "Dataset '{}': {} version directories under {}",
            dataset.name,
            versions.len(),
            dataset.path.display()
        );

        let before = rows.len();
        match &dataset.subdatasets {
            Some(declared) => {
                for entry in declared {
                    if !versions.contains(&entry.version) {
                        return Err(ConfigError::VersionNotFound {
                            dataset: dataset.name.clone(),
                            version: entry.version.clone(),
                            path: dataset.path.clone(),
                            available: versions,
                        }
                        .into());
                    }
                    for (name, attributes) in &entry.subdatasets {
                        let ctx = RowContext::new(dataset, &entry.version, Some((name, attributes)));
                        rows.push(ctx.build()?);
                    }
                }
            },
            None => {
                for version in &versions {
                    rows.push(RowContext::new(dataset, version, None).build()?);
                }
            },
        }

        for row in &rows[before..] {
            let key = (row.dataset.clone(), row.version.clone(), row.subdataset.clone());
            if !seen.insert(key) {
                return Err(ConfigError::DuplicateEntry {
                    dataset: row.dataset.clone(),
                    version: row.version.clone(),
                    subdataset: row.subdataset.clone(),
                }
                .into());
            }
        }
    }

    log::info!(
        "Catalog built with {} rows from {} datasets",
        rows.len(),
        config.datasets.len()
    );
    Ok(rows)
}

struct RowContext<'a> {
    dataset: &'a DatasetConfig,
    version: &'a str,
    subdataset: Option<(&'a str, &'a Attributes)>,
}

impl<'a> RowContext<'a> {
    fn new(
        dataset: &'a DatasetConfig,
        version: &'a str,
        subdataset: Option<(&'a String, &'a Attributes)>,
    ) -> Self {
        Self {
            dataset,
            version,
            subdataset: subdataset.map(|(name, attributes)| (name.as_str(), attributes)),
        }
    }

    fn lookup(&self, key: &str) -> Option<&'a Value> {
        let dataset: &'a DatasetConfig = self.dataset;
        resolve(
            &dataset.attributes,
            self.subdataset.map(|(_, attributes)| attributes),
            self.version,
            key,
        )
        .map(|(_, value)| value)
    }

    fn invalid(&self, attribute: &str, message: String) -> ConfigError {
        ConfigError::InvalidAttribute {
            dataset: self.dataset.name.clone(),
            version: self.version.to_string(),
            subdataset: self.subdataset.map(|(name, _)| name.to_string()),
            attribute: attribute.to_string(),
            message,
        }
    }

    fn missing(&self, attribute: &str) -> ConfigError {
        ConfigError::MissingAttribute {
            dataset: self.dataset.name.clone(),
            version: self.version.to_string(),
            subdataset: self.subdataset.map(|(name, _)| name.to_string()),
            attribute: attribute.to_string(),
        }
    }

    fn text(&self, key: &str) -> Result<Option<String>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(Value::Number(number)) => Ok(Some(number.to_string())),
            Some(value) => decode::<String>(value)
                .map(Some)
                .map_err(|e| self.invalid(key, e).into()),
        }
    }

    fn required_text(&self, key: &str) -> Result<String> {
        self.text(key)?
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| self.missing(key).into())
    }

    fn list(&self, key: &str) -> Result<Vec<String>> {
        normalise_list(self.lookup(key)).map_err(|e| self.invalid(key, e).into())
    }

    fn build(&self) -> Result<CatalogRow> {
        let dataset = self.dataset;

        let version_path = dataset.path.join(self.version);
        let full_path = match self.subdataset {
            Some(_) => version_path.join(self.required_text("subpath")?),
            None => version_path,
        };
        let extension = self
            .required_text("extension")?
            .trim_start_matches('.')
            .to_string();

        let skip_lines = self
            .lookup("skip_lines")
            .map(decode::<usize>)
            .transpose()
            .map_err(|e| self.invalid("skip_lines", e))?
            .unwrap_or(0);
        let no_data_value = self
            .lookup("no_data_value")
            .map(decode::<NoDataValue>)
            .transpose()
            .map_err(|e| self.invalid("no_data_value", e))?;
        let resolutions = self
            .lookup("resolutions")
            .map(Resolutions::from_value)
            .transpose()
            .map_err(|e| self.invalid("resolutions", e))?;

        Ok(CatalogRow {
            dataset: dataset.name.clone(),
            display_name: dataset.display_name.clone(),
            description: dataset.description.clone(),
            tags: dataset.tags.clone(),
            version: self.version.to_string(),
            subdataset: self.subdataset.map(|(name, _)| name.to_string()),
            path: dataset.path.clone(),
            full_path,
            extension,
            skip_lines,
            no_data_value,
            ignore_dirs: self.list("ignore_dirs")?,
            ignore_files: self.list("ignore_files")?,
            loader: self.text("loader")?.unwrap_or_else(|| DEFAULT_LOADER.to_string()),
            resolutions,
            static_patterns: self.list("static_patterns")?,
        })
    }
}

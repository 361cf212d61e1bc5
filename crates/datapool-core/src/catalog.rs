//! The catalog index and the queries and loads run against it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::availability::{Availability, Notice};
use crate::config::CatalogConfig;
use crate::data::LoadedData;
use crate::describe::{CatalogDescription, VersionDescription};
use crate::error::{ConfigError, QueryError, Result};
use crate::filter::Resolutions;
use crate::loaders::LoaderRegistry;
use crate::options::{LoadOptions, check_options};
use crate::row::{CatalogRow, build_rows};

/// Environment variable naming the configuration file for [`DataCatalog::from_env`].
pub const CONFIG_ENV_VAR: &str = "DATAPOOL_CONFIG";

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|existing| existing == value) {
        values.push(value.to_string());
    }
}

/// Index of every (dataset, version, subdataset) entry a configuration
/// describes, plus the loaders that read them.
///
/// The index is built once at construction and never changes afterwards;
/// [`search`](Self::search) returns a new catalog.
#[derive(Debug, Clone)]
pub struct DataCatalog {
    config_path: Option<PathBuf>,
    rows: Vec<CatalogRow>,
    loaders: Arc<LoaderRegistry>,
}

impl DataCatalog {
    /// Build a catalog from a configuration file.
    ///
    /// Relative dataset paths are resolved against the working directory.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file is missing or malformed, or
    /// if a declared version directory does not exist.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading catalog configuration from {}", path.display());
        let config = CatalogConfig::from_path(path)?;
        let mut catalog = Self::from_config(&config)?;
        catalog.config_path = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// Build a catalog from the file named by `DATAPOOL_CONFIG`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EnvNotSet`] if the variable is unset, otherwise
    /// the same errors as [`from_path`](Self::from_path).
    pub fn from_env() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV_VAR).ok_or_else(|| ConfigError::EnvNotSet {
            var: CONFIG_ENV_VAR.to_string(),
        })?;
        Self::from_path(PathBuf::from(path))
    }

    /// Build a catalog from configuration text.
    ///
    /// When `base_dir` is given, relative dataset paths are joined onto it.
    ///
    /// # Errors
    ///
    /// Same as [`from_path`](Self::from_path), minus the file lookup.
    pub fn from_yaml_str(text: &str, base_dir: Option<&Path>) -> Result<Self> {
        let mut config = CatalogConfig::from_yaml_str(text)?;
        if let Some(base) = base_dir {
            config = config.with_base_dir(base);
        }
        Self::from_config(&config)
    }

    /// Build a catalog from an already parsed configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the rows cannot be resolved.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        Ok(Self {
            config_path: None,
            rows: build_rows(config)?,
            loaders: Arc::new(LoaderRegistry::new()),
        })
    }

    /// Replace the loader registry.
    #[must_use]
    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = Arc::new(loaders);
        self
    }

    #[must_use]
    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    #[must_use]
    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    /// Distinct dataset names in index order.
    #[must_use]
    pub fn datasets(&self) -> Vec<String> {
        let mut names = Vec::new();
        for row in &self.rows {
            push_unique(&mut names, &row.dataset);
        }
        names
    }

    /// Rows matching `dataset` and, when given, `version` and `subdataset`.
    #[must_use]
    pub fn find_rows(
        &self,
        dataset: &str,
        version: Option<&str>,
        subdataset: Option<&str>,
    ) -> Vec<&CatalogRow> {
        self.rows
            .iter()
            .filter(|row| row.dataset == dataset)
            .filter(|row| version.is_none_or(|v| row.version == v))
            .filter(|row| subdataset.is_none_or(|s| row.subdataset.as_deref() == Some(s)))
            .collect()
    }

    /// Distinct versions of `dataset`, in index order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoVersions`] if the dataset has no rows.
    pub fn available_versions(&self, dataset: &str) -> Result<Vec<String>> {
        let mut versions = Vec::new();
        for row in self.find_rows(dataset, None, None) {
            push_unique(&mut versions, &row.version);
        }
        if versions.is_empty() {
            return Err(QueryError::NoVersions {
                dataset: dataset.to_string(),
            }
            .into());
        }
        Ok(versions)
    }

    /// The greatest version string of `dataset`.
    ///
    /// Versions compare as plain strings, so `v10` sorts before `v2`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoVersions`] if the dataset has no rows.
    pub fn latest_version(&self, dataset: &str) -> Result<String> {
        let versions = self.available_versions(dataset)?;
        versions
            .into_iter()
            .max()
            .ok_or_else(|| {
                QueryError::NoVersions {
                    dataset: dataset.to_string(),
                }
                .into()
            })
    }

    fn version_or_latest(&self, dataset: &str, version: Option<&str>) -> Result<String> {
        match version {
            Some(version) => Ok(version.to_string()),
            None => self.latest_version(dataset),
        }
    }

    /// Subdataset names of a dataset version; the latest version when
    /// `version` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoVersions`] when no version is given and the
    /// dataset is unknown.
    pub fn available_subdatasets(
        &self,
        dataset: &str,
        version: Option<&str>,
    ) -> Result<Availability<Vec<String>>> {
        let version = self.version_or_latest(dataset, version)?;
        let mut names = Vec::new();
        for row in self.find_rows(dataset, Some(&version), None) {
            if let Some(subdataset) = &row.subdataset {
                push_unique(&mut names, subdataset);
            }
        }
        let availability = if names.is_empty() {
            Availability::Undefined(Notice::NoSubdatasets)
        } else {
            Availability::Available(names)
        };
        Ok(availability.warn_if_undefined())
    }

    /// Resolution metadata of a dataset version, optionally narrowed to one
    /// subdataset. When several rows match, the first one is used.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoEntry`] if nothing matches.
    pub fn available_resolutions(
        &self,
        dataset: &str,
        version: Option<&str>,
        subdataset: Option<&str>,
    ) -> Result<Availability<Resolutions>> {
        let version = self.version_or_latest(dataset, version)?;
        let rows = self.find_rows(dataset, Some(&version), subdataset);
        let Some(row) = rows.first() else {
            return Err(QueryError::NoEntry {
                dataset: dataset.to_string(),
                version,
                subdataset: subdataset.map(str::to_string),
            }
            .into());
        };
        let availability = match &row.resolutions {
            Some(resolutions) => Availability::Available(resolutions.clone()),
            None => Availability::Undefined(Notice::NoResolutions),
        };
        Ok(availability.warn_if_undefined())
    }

    /// Rows whose dataset name, display name or a tag contains any of
    /// `keywords`, case-insensitively.
    ///
    /// No keywords, or only blank ones, keeps every row. The returned catalog
    /// shares this catalog's loaders.
    #[must_use]
    pub fn search<S: AsRef<str>>(&self, keywords: &[S]) -> Self {
        let keywords: Vec<String> = keywords
            .iter()
            .map(|keyword| keyword.as_ref().trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();

        let rows: Vec<CatalogRow> = if keywords.is_empty() {
            self.rows.clone()
        } else {
            self.rows
                .iter()
                .filter(|row| keywords.iter().any(|keyword| row.matches_keyword(keyword)))
                .cloned()
                .collect()
        };
        log::info!("Search for {:?} matched {} of {} entries", keywords, rows.len(), self.len());

        Self {
            config_path: self.config_path.clone(),
            rows,
            loaders: Arc::clone(&self.loaders),
        }
    }

    /// The single row a load request refers to.
    ///
    /// `version` defaults to the latest. `subdataset` is required when the
    /// version has more than one and rejected when it has none.
    ///
    /// # Errors
    ///
    /// Returns a query error when no row, or more than one, matches.
    pub fn select_row(
        &self,
        dataset: &str,
        version: Option<&str>,
        subdataset: Option<&str>,
    ) -> Result<&CatalogRow> {
        let version = self.version_or_latest(dataset, version)?;
        let mut candidates = self.find_rows(dataset, Some(&version), None);
        if candidates.is_empty() {
            return Err(QueryError::NoEntry {
                dataset: dataset.to_string(),
                version,
                subdataset: None,
            }
            .into());
        }

        let mut available = Vec::new();
        for row in &candidates {
            if let Some(name) = &row.subdataset {
                push_unique(&mut available, name);
            }
        }

        if let Some(subdataset) = subdataset {
            if available.is_empty() {
                return Err(QueryError::SubdatasetsNotApplicable {
                    dataset: dataset.to_string(),
                }
                .into());
            }
            if !available.iter().any(|name| name == subdataset) {
                return Err(QueryError::SubdatasetNotFound {
                    dataset: dataset.to_string(),
                    version,
                    subdataset: subdataset.to_string(),
                    available,
                }
                .into());
            }
            candidates.retain(|row| row.subdataset.as_deref() == Some(subdataset));
        }

        match candidates.as_slice() {
            [row] => Ok(*row),
            _ if available.len() > 1 && subdataset.is_none() => {
                Err(QueryError::AmbiguousSubdataset {
                    dataset: dataset.to_string(),
                    version,
                    available,
                }
                .into())
            },
            rows => Err(QueryError::DuplicateRows {
                dataset: dataset.to_string(),
                version,
                count: rows.len(),
            }
            .into()),
        }
    }

    /// Load one dataset entry through its loader.
    ///
    /// The entry is selected as in [`select_row`](Self::select_row); options
    /// that name structure the entry lacks are rejected before its loader is
    /// called.
    ///
    /// # Errors
    ///
    /// Returns a query error if the entry cannot be selected, an option error
    /// if the options do not fit it, a configuration error if its loader is
    /// not registered, and whatever the loader returns.
    pub fn load_dataset(
        &self,
        dataset: &str,
        version: Option<&str>,
        subdataset: Option<&str>,
        options: &LoadOptions,
    ) -> Result<LoadedData> {
        let row = self.select_row(dataset, version, subdataset)?;
        check_options(row, options)?;
        let loader = self.loaders.get(&row.loader)?;
        log::info!("Loading {row}");
        let data = loader.load(self, row, options)?;
        log::debug!("Loaded {} records for {}", data.num_rows(), row.dataset);
        Ok(data)
    }

    /// Describe the catalog, one dataset, or one dataset version.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::NoVersions`] for an unknown dataset and
    /// [`QueryError::UnknownVersion`] for an unknown version.
    pub fn describe(&self, dataset: Option<&str>, version: Option<&str>) -> Result<CatalogDescription> {
        let Some(dataset) = dataset else {
            let mut datasets = self.datasets();
            datasets.sort();
            return Ok(CatalogDescription::Datasets(datasets));
        };

        let mut versions = self.available_versions(dataset)?;
        versions.sort();
        let Some(version) = version else {
            return Ok(CatalogDescription::Versions {
                dataset: dataset.to_string(),
                versions,
            });
        };

        if !versions.iter().any(|v| v == version) {
            return Err(QueryError::UnknownVersion {
                dataset: dataset.to_string(),
                version: version.to_string(),
                available: versions,
            }
            .into());
        }

        let rows = self.find_rows(dataset, Some(version), None);
        let mut subdatasets = Vec::new();
        for row in &rows {
            if let Some(name) = &row.subdataset {
                push_unique(&mut subdatasets, name);
            }
        }
        subdatasets.sort();

        Ok(CatalogDescription::Version(VersionDescription {
            dataset: dataset.to_string(),
            versions,
            version: version.to_string(),
            subdatasets,
            accepts_resolution: rows.iter().any(|row| row.has_resolutions()),
            accepts_static: rows.iter().any(|row| row.has_static_patterns()),
        }))
    }

    /// Print [`describe`](Self::describe) to standard output.
    ///
    /// # Errors
    ///
    /// Same as [`describe`](Self::describe).
    pub fn help(&self, dataset: Option<&str>, version: Option<&str>) -> Result<()> {
        let description = self.describe(dataset, version)?;
        print!("{description}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::error::DataPoolError;

    fn catalog_with_versions(versions: &[&str]) -> (TempDir, DataCatalog) {
        let dir = TempDir::new().unwrap();
        for version in versions {
            fs::create_dir_all(dir.path().join("flat").join(version)).unwrap();
        }
        let yaml = "datasets:\n  flat:\n    path: flat\n    extension: csv\n    tags: [Ocean]\n";
        let catalog = DataCatalog::from_yaml_str(yaml, Some(dir.path())).unwrap();
        (dir, catalog)
    }

    #[test]
    fn versions_compare_as_strings() {
        let (_dir, catalog) = catalog_with_versions(&["v1", "v10", "v2"]);
        assert_eq!(catalog.available_versions("flat").unwrap(), vec!["v1", "v10", "v2"]);
        assert_eq!(catalog.latest_version("flat").unwrap(), "v2");
    }

    #[test]
    fn unknown_dataset_has_no_versions() {
        let (_dir, catalog) = catalog_with_versions(&["v1"]);
        let err = catalog.available_versions("missing").unwrap_err();
        assert!(matches!(err, DataPoolError::Query(QueryError::NoVersions { .. })));
        assert_eq!(err.to_string(), "No versions found for dataset 'missing'");
    }

    #[test]
    fn flat_dataset_reports_undefined_structure() {
        let (_dir, catalog) = catalog_with_versions(&["v1"]);
        let subdatasets = catalog.available_subdatasets("flat", None).unwrap();
        assert_eq!(subdatasets.notice(), Some(Notice::NoSubdatasets));
        let resolutions = catalog.available_resolutions("flat", Some("v1"), None).unwrap();
        assert_eq!(resolutions.notice(), Some(Notice::NoResolutions));
    }

    #[test]
    fn search_leaves_source_untouched() {
        let (_dir, catalog) = catalog_with_versions(&["v1", "v2"]);
        assert_eq!(catalog.search(&["ocean"]).len(), 2);
        assert!(catalog.search(&["glacier"]).is_empty());
        assert_eq!(catalog.search::<&str>(&[]).len(), 2);
        assert_eq!(catalog.search(&["  "]).len(), 2);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn subdataset_on_flat_dataset_is_not_applicable() {
        let (_dir, catalog) = catalog_with_versions(&["v1"]);
        let err = catalog.select_row("flat", None, Some("a")).unwrap_err();
        assert!(err.is_not_applicable());
    }

    #[test]
    fn describe_rejects_unknown_version() {
        let (_dir, catalog) = catalog_with_versions(&["v2", "v1"]);
        let err = catalog.describe(Some("flat"), Some("v9")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Version 'v9' not found for dataset 'flat'. Available versions: [v1, v2]"
        );
    }
}

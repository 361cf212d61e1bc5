//! The catalog configuration document.
//!
//! ```yaml
//! datasets:
//!   bedmachine:
//!     path: /data/bedmachine
//!     display_name: BedMachine Antarctica
//!     tags: [topography, antarctica]
//!     extension: nc
//!     no_data_value: -9999
//!   measures_velocity:
//!     path: /data/measures
//!     loader: time_indexed
//!     subdatasets:
//!       v1:
//!         annual:
//!           subpath: annual
//!           extension: csv
//! ```
//!
//! Mapping order is preserved: rows are indexed in the order datasets,
//! versions and subdatasets appear in the document. Attribute values are kept
//! as raw YAML until [`crate::resolve`] picks the one that applies to a row.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{ConfigError, IoError, Result};

/// Optional attributes declared on a dataset or subdataset, keyed by name.
pub type Attributes = BTreeMap<String, Value>;

/// A parsed catalog configuration.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    /// Datasets in document order.
    pub datasets: Vec<DatasetConfig>,
}

/// One entry under `datasets`.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub name: String,
    pub path: PathBuf,
    pub display_name: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Dataset-level attributes (`extension`, `loader`, ...).
    pub attributes: Attributes,
    /// Explicit `version -> subdataset -> attributes` declarations, if any.
    pub subdatasets: Option<Vec<VersionDeclaration>>,
}

/// The subdatasets declared for one version.
#[derive(Debug, Clone)]
pub struct VersionDeclaration {
    pub version: String,
    pub subdatasets: Vec<(String, Attributes)>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    path: PathBuf,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    subdatasets: Option<Mapping>,
    #[serde(flatten)]
    attributes: Attributes,
}

impl CatalogConfig {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file does not exist or does not
    /// parse, and an I/O error if it cannot be read.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let text = std::fs::read_to_string(path).map_err(|source| IoError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Parse a configuration document.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the text is not YAML, has no
    /// `datasets` mapping, or a dataset entry is malformed.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let document: Value =
            serde_yaml::from_str(text).map_err(|source| ConfigError::Yaml { source })?;

        let Some(Value::Mapping(datasets)) = document.get("datasets") else {
            return Err(ConfigError::MissingDatasets.into());
        };

        let datasets = datasets
            .iter()
            .map(|(key, value)| parse_dataset(key_to_string(key), value))
            .collect::<Result<Vec<_>>>()?;

        log::debug!("Parsed catalog configuration with {} datasets", datasets.len());
        Ok(Self { datasets })
    }

    /// Resolve relative dataset paths against `base`.
    #[must_use]
    pub fn with_base_dir(mut self, base: &Path) -> Self {
        for dataset in &mut self.datasets {
            if dataset.path.is_relative() {
                dataset.path = base.join(&dataset.path);
            }
        }
        self
    }
}

/// String form of a YAML mapping key.
///
/// Version directories such as `2023` parse as numbers; they are compared as
/// the text they were written as.
pub(crate) fn key_to_string(key: &Value) -> String {
    match key {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Null => "null".to_string(),
        other => serde_yaml::to_string(other)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default(),
    }
}

fn parse_dataset(name: String, value: &Value) -> Result<DatasetConfig> {
    let invalid = |message: String| ConfigError::InvalidDataset {
        dataset: name.clone(),
        message,
    };

    let raw: RawDataset = serde_yaml::from_value(value.clone()).map_err(|e| invalid(e.to_string()))?;

    let subdatasets = raw
        .subdatasets
        .as_ref()
        .map(|versions| parse_subdatasets(versions).map_err(&invalid))
        .transpose()?;

    let attributes = raw
        .attributes
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();

    Ok(DatasetConfig {
        display_name: raw.display_name.unwrap_or_else(|| name.clone()),
        description: raw.description.unwrap_or_default(),
        tags: raw.tags.unwrap_or_default(),
        path: raw.path,
        attributes,
        subdatasets,
        name,
    })
}

fn parse_subdatasets(versions: &Mapping) -> std::result::Result<Vec<VersionDeclaration>, String> {
    versions
        .iter()
        .map(|(version, entries)| {
            let version = key_to_string(version);
            let subdatasets = match entries {
                Value::Mapping(entries) => entries
                    .iter()
                    .map(|(name, attributes)| {
                        let name = key_to_string(name);
                        parse_attributes(attributes)
                            .map(|attributes| (name.clone(), attributes))
                            .map_err(|e| format!("subdataset '{name}' in version '{version}': {e}"))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?,
                Value::Null => Vec::new(),
                _ => return Err(format!("subdatasets for version '{version}' must be a mapping")),
            };
            Ok(VersionDeclaration {
                version,
                subdatasets,
            })
        })
        .collect()
}

fn parse_attributes(value: &Value) -> std::result::Result<Attributes, String> {
    match value {
        Value::Null => Ok(Attributes::new()),
        Value::Mapping(mapping) => Ok(mapping
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key_to_string(key), value.clone()))
            .collect()),
        _ => Err("attributes must be a mapping".to_string()),
    }
}

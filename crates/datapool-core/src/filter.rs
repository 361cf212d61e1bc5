//! Static/annual partitioning and resolution-token filtering of discovered files.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::config::key_to_string;
use crate::error::OptionError;
use crate::resolve::describe;

/// Which files of a dataset to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Files that do not vary by year; their names contain a static pattern.
    Static,
    /// Per-year files; every file that is not static.
    Annual,
}

impl Mode {
    #[must_use]
    pub fn from_static_flag(static_files: bool) -> Self {
        if static_files { Mode::Static } else { Mode::Annual }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Static => "static",
            Mode::Annual => "annual",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution metadata: mode name, then resolution label, then the file-name
/// token that selects files of that resolution.
///
/// On a dataset the metadata is keyed by version first:
///
/// ```yaml
/// resolutions:
///   v1:
///     static: {1km: _1km_, 500m: _500m_}
///     annual: {1km: _1km_}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolutions(BTreeMap<String, BTreeMap<String, String>>);

impl Resolutions {
    /// Decode resolution metadata from its YAML form.
    ///
    /// Labels and tokens written as numbers are read as their text.
    ///
    /// # Errors
    ///
    /// Returns a message when the value is not a mapping of mappings of scalars.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let Value::Mapping(modes) = value else {
            return Err(format!("expected a mapping of modes, found {}", describe(value)));
        };

        let mut parsed = BTreeMap::new();
        for (mode, labels) in modes {
            let mode = key_to_string(mode);
            let Value::Mapping(labels) = labels else {
                return Err(format!(
                    "mode '{mode}' must map resolution labels to tokens, found {}",
                    describe(labels)
                ));
            };
            let mut tokens = BTreeMap::new();
            for (label, token) in labels {
                let token = match token {
                    Value::String(text) => text.clone(),
                    Value::Number(number) => number.to_string(),
                    other => {
                        return Err(format!(
                            "token for '{}' in mode '{mode}' must be text, found {}",
                            key_to_string(label),
                            describe(other)
                        ));
                    },
                };
                tokens.insert(key_to_string(label), token);
            }
            parsed.insert(mode, tokens);
        }
        Ok(Self(parsed))
    }

    /// Mode names, sorted.
    #[must_use]
    pub fn modes(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    /// Resolution labels defined for `mode`.
    #[must_use]
    pub fn labels(&self, mode: &str) -> Vec<String> {
        self.0
            .get(mode)
            .map(|labels| labels.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every resolution label across modes, sorted and deduplicated.
    #[must_use]
    pub fn all_labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self.0.values().flat_map(|m| m.keys().cloned()).collect();
        labels.sort();
        labels.dedup();
        labels
    }

    #[must_use]
    pub fn token(&self, mode: &str, label: &str) -> Option<&str> {
        self.0.get(mode)?.get(label).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, String>)> {
        self.0.iter().map(|(mode, labels)| (mode.as_str(), labels))
    }
}

impl fmt::Display for Resolutions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modes: Vec<String> = self
            .iter()
            .map(|(mode, labels)| {
                let labels: Vec<String> = labels
                    .iter()
                    .map(|(label, token)| format!("{label}={token}"))
                    .collect();
                format!("{mode}: {}", labels.join(", "))
            })
            .collect();
        f.write_str(&modes.join("; "))
    }
}

/// Narrow `files` to the requested mode and resolution.
///
/// Checks run in this order, each failing with its own [`OptionError`]:
/// resolution metadata without a `resolution`, a `resolution` without
/// metadata, static patterns without a `static_files` flag, and static files
/// requested without patterns. Files are then split into the static set
/// (name contains a pattern) or the annual remainder, and finally narrowed to
/// names containing the token for `resolution` in the selected mode.
///
/// # Errors
///
/// Returns an [`OptionError`] when the arguments do not fit the metadata.
pub fn filter_by_resolution_and_mode(
    files: Vec<PathBuf>,
    resolution: Option<&str>,
    static_files: Option<bool>,
    static_patterns: &[String],
    resolutions: Option<&Resolutions>,
) -> Result<Vec<PathBuf>, OptionError> {
    match (resolutions, resolution) {
        (Some(resolutions), None) => {
            return Err(OptionError::ResolutionRequired {
                available: resolutions.all_labels(),
            });
        },
        (None, Some(_)) => return Err(OptionError::ResolutionUndefined),
        _ => {},
    }
    if !static_patterns.is_empty() && static_files.is_none() {
        return Err(OptionError::StaticRequired);
    }
    let want_static = static_files.unwrap_or(false);
    if want_static && static_patterns.is_empty() {
        return Err(OptionError::StaticUndefined);
    }

    let is_static = |path: &Path| {
        let name = file_name(path);
        static_patterns.iter().any(|pattern| name.contains(pattern.as_str()))
    };
    let mut files: Vec<PathBuf> = files
        .into_iter()
        .filter(|path| is_static(path.as_path()) == want_static)
        .collect();

    if let (Some(resolution), Some(resolutions)) = (resolution, resolutions) {
        let mode = Mode::from_static_flag(want_static).as_str();
        if !resolutions.0.contains_key(mode) {
            return Err(OptionError::ModeNotFound {
                mode: mode.to_string(),
                available: resolutions.modes(),
            });
        }
        let Some(token) = resolutions.token(mode, resolution) else {
            return Err(OptionError::ResolutionNotFound {
                resolution: resolution.to_string(),
                mode: mode.to_string(),
                available: resolutions.labels(mode),
            });
        };
        files.retain(|path| file_name(path).contains(token));
    }

    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

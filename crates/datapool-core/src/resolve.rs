//! Three-tier attribute resolution: subdataset, then dataset, then default.
//!
//! Any attribute may be declared either as a plain value or as a mapping keyed
//! by version. The two tiers treat a version-keyed mapping that lacks the
//! requested version differently:
//!
//! * at subdataset level the whole mapping is returned as the value;
//! * at dataset level the lookup falls through to the default.
//!
//! Attributes whose natural value is itself a mapping (`resolutions`) rely on
//! the first rule to be declared un-versioned on a subdataset.

use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};

use crate::config::{Attributes, key_to_string};

/// A declared attribute value, classified by shape.
#[derive(Debug, Clone, Copy)]
pub enum Versioned<'a> {
    Scalar(&'a Value),
    ByVersion(&'a Mapping),
}

impl<'a> Versioned<'a> {
    /// Classify a declared value. `null` counts as not declared.
    #[must_use]
    pub fn classify(value: &'a Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Mapping(mapping) => Some(Self::ByVersion(mapping)),
            other => Some(Self::Scalar(other)),
        }
    }

    /// The entry for `version` in a version-keyed mapping.
    fn for_version(mapping: &'a Mapping, version: &str) -> Option<&'a Value> {
        mapping
            .iter()
            .find(|(key, _)| key_to_string(key) == version)
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
    }
}

/// Which tier a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Subdataset,
    Dataset,
}

/// Pick the value of `key` that applies to `version`.
///
/// Returns `None` when neither tier supplies a value, in which case the caller
/// applies its default.
#[must_use]
pub fn resolve<'a>(
    dataset: &'a Attributes,
    subdataset: Option<&'a Attributes>,
    version: &str,
    key: &str,
) -> Option<(Tier, &'a Value)> {
    if let Some(raw) = subdataset.and_then(|attributes| attributes.get(key)) {
        match Versioned::classify(raw) {
            Some(Versioned::Scalar(value)) => return Some((Tier::Subdataset, value)),
            Some(Versioned::ByVersion(mapping)) => {
                let value = Versioned::for_version(mapping, version).unwrap_or(raw);
                return Some((Tier::Subdataset, value));
            },
            None => {},
        }
    }

    match dataset.get(key).and_then(Versioned::classify)? {
        Versioned::Scalar(value) => Some((Tier::Dataset, value)),
        Versioned::ByVersion(mapping) => {
            Versioned::for_version(mapping, version).map(|value| (Tier::Dataset, value))
        },
    }
}

/// Decode a resolved value into `T`.
///
/// # Errors
///
/// Returns the decoder's message when the value does not have `T`'s shape.
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, String> {
    serde_yaml::from_value(value.clone()).map_err(|e| e.to_string())
}

/// Read a value as a list of strings, wrapping a single scalar.
///
/// # Errors
///
/// Returns a message when an element is not a string or number.
pub fn normalise_list(value: Option<&Value>) -> Result<Vec<String>, String> {
    let scalar_text = |value: &Value| match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(format!("expected a string, found {}", describe(other))),
    };
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items.iter().map(scalar_text).collect(),
        Some(other) => Ok(vec![scalar_text(other)?]),
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(yaml: &str) -> Attributes {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn text(resolved: Option<(Tier, &Value)>) -> Option<(Tier, &str)> {
        resolved.map(|(tier, value)| (tier, value.as_str().unwrap()))
    }

    #[test]
    fn subdataset_scalar_wins() {
        let dataset = attrs("extension: nc");
        let subdataset = attrs("extension: tif");
        assert_eq!(
            text(resolve(&dataset, Some(&subdataset), "v1", "extension")),
            Some((Tier::Subdataset, "tif"))
        );
    }

    #[test]
    fn dataset_scalar_is_fallback() {
        let dataset = attrs("extension: nc");
        let subdataset = attrs("subpath: a");
        assert_eq!(
            text(resolve(&dataset, Some(&subdataset), "v1", "extension")),
            Some((Tier::Dataset, "nc"))
        );
        assert_eq!(
            text(resolve(&dataset, None, "v1", "extension")),
            Some((Tier::Dataset, "nc"))
        );
    }

    #[test]
    fn version_keyed_lookup_at_both_tiers() {
        let dataset = attrs("extension: {v1: csv, v2: nc}");
        let subdataset = attrs("extension: {v1: tif}");
        assert_eq!(
            text(resolve(&dataset, Some(&subdataset), "v1", "extension")),
            Some((Tier::Subdataset, "tif"))
        );
        assert_eq!(
            text(resolve(&dataset, None, "v2", "extension")),
            Some((Tier::Dataset, "nc"))
        );
    }

    #[test]
    fn subdataset_miss_returns_whole_mapping() {
        let dataset = attrs("extension: csv");
        let subdataset = attrs("resolutions: {static: {1km: _1km}}");
        let (tier, value) = resolve(&dataset, Some(&subdataset), "v1", "resolutions").unwrap();
        assert_eq!(tier, Tier::Subdataset);
        assert!(value.is_mapping());
    }

    #[test]
    fn dataset_miss_falls_through_to_default() {
        let dataset = attrs("extension: {v1: csv}");
        assert!(resolve(&dataset, None, "v2", "extension").is_none());

        let dataset = attrs("resolutions: {static: {1km: _1km}}");
        assert!(resolve(&dataset, None, "v1", "resolutions").is_none());
    }

    #[test]
    fn numeric_version_keys_match_text() {
        let dataset = attrs("skip_lines: {2023: 4}");
        let (_, value) = resolve(&dataset, None, "2023", "skip_lines").unwrap();
        assert_eq!(decode::<usize>(value).unwrap(), 4);
    }

    #[test]
    fn null_counts_as_absent() {
        let dataset = attrs("loader: custom");
        let subdataset = attrs("loader: null");
        assert_eq!(
            text(resolve(&dataset, Some(&subdataset), "v1", "loader")),
            Some((Tier::Dataset, "custom"))
        );
    }

    #[test]
    fn lists_are_normalised() {
        assert!(normalise_list(None).unwrap().is_empty());
        assert_eq!(normalise_list(Some(&Value::from("raw"))).unwrap(), vec!["raw"]);
        let list: Value = serde_yaml::from_str("[raw, tmp]").unwrap();
        assert_eq!(normalise_list(Some(&list)).unwrap(), vec!["raw", "tmp"]);
        let bad: Value = serde_yaml::from_str("{a: 1}").unwrap();
        assert!(normalise_list(Some(&bad)).is_err());
    }
}

//! Parsing of `GeoJSON` documents and sequences into feature records.

use std::fmt;
use std::path::Path;

use datapool_shared::{FormatReadError, FormatResult, SourcePosition};
use geo_types::Geometry;
use geojson::{Feature, GeoJson, Geometry as GeoJsonGeometry, JsonObject, feature::Id};

/// One feature with its identifier, properties and optional geometry.
#[derive(Debug, Clone, Default)]
pub struct FeatureRecord {
    pub id: Option<String>,
    pub properties: JsonObject,
    pub geometry: Option<Geometry<f64>>,
}

impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = self.id.as_deref().unwrap_or("-");
        let geometry = if self.geometry.is_some() { "yes" } else { "no" };
        write!(
            f,
            "Feature(id={id}, properties={}, geometry={geometry})",
            self.properties.len()
        )
    }
}

/// Read and parse a `GeoJSON` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or holds no parseable features.
pub fn parse_geojson_file(path: impl AsRef<Path>) -> FormatResult<Vec<FeatureRecord>> {
    let path = path.as_ref();
    let context = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| FormatReadError::io(e, context.clone()))?;
    parse_geojson_bytes(&bytes, &context)
}

/// Parse raw bytes into feature records.
///
/// The bytes are first read as a single `GeoJSON` document and, failing that,
/// as a sequence with one document per line.
///
/// # Errors
///
/// Returns a parse error describing both attempts when neither succeeds.
pub fn parse_geojson_bytes(bytes: &[u8], context: &str) -> FormatResult<Vec<FeatureRecord>> {
    let document_err = match GeoJson::from_reader(bytes) {
        Ok(document) => return document_to_records(document, context),
        Err(err) => err.to_string(),
    };

    parse_sequence(bytes, context).map_err(|sequence_err| FormatReadError::Parse {
        message: format!(
            "Not a GeoJSON document ({document_err}) nor a GeoJSON sequence ({sequence_err})"
        ),
        position: None,
        context: Some(context.to_string()),
    })
}

fn document_to_records(document: GeoJson, context: &str) -> FormatResult<Vec<FeatureRecord>> {
    match document {
        GeoJson::FeatureCollection(collection) => collection
            .features
            .into_iter()
            .enumerate()
            .map(|(index, feature)| feature_to_record(feature, index, context))
            .collect(),
        GeoJson::Feature(feature) => Ok(vec![feature_to_record(feature, 0, context)?]),
        GeoJson::Geometry(geometry) => Ok(vec![FeatureRecord {
            geometry: Some(convert_geometry(geometry, 0, context)?),
            ..FeatureRecord::default()
        }]),
    }
}

fn feature_to_record(feature: Feature, index: usize, context: &str) -> FormatResult<FeatureRecord> {
    let geometry = feature
        .geometry
        .map(|geometry| convert_geometry(geometry, index, context))
        .transpose()?;

    let id = feature.id.map(|id| match id {
        Id::String(text) => text,
        Id::Number(number) => number.to_string(),
    });

    Ok(FeatureRecord {
        id,
        properties: feature.properties.unwrap_or_default(),
        geometry,
    })
}

fn convert_geometry(
    geometry: GeoJsonGeometry,
    index: usize,
    context: &str,
) -> FormatResult<Geometry<f64>> {
    Geometry::<f64>::try_from(geometry).map_err(|err| FormatReadError::Parse {
        message: format!("Feature {index} has an unusable geometry: {err}"),
        position: Some(SourcePosition {
            record: u64::try_from(index + 1).ok(),
            ..SourcePosition::default()
        }),
        context: Some(context.to_string()),
    })
}

fn parse_sequence(bytes: &[u8], context: &str) -> FormatResult<Vec<FeatureRecord>> {
    let mut records = Vec::new();

    for (idx, raw) in bytes.split(|b| *b == b'\n').enumerate() {
        let position = || SourcePosition {
            line: u64::try_from(idx + 1).ok(),
            ..SourcePosition::default()
        };
        let line = std::str::from_utf8(raw).map_err(|err| FormatReadError::Parse {
            message: format!("line is not valid UTF-8: {err}"),
            position: Some(position()),
            context: Some(context.to_string()),
        })?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let document = line
            .parse::<GeoJson>()
            .map_err(|err| FormatReadError::Parse {
                message: format!("invalid GeoJSON: {err}"),
                position: Some(position()),
                context: Some(context.to_string()),
            })?;
        records.extend(document_to_records(document, context)?);
    }

    if records.is_empty() {
        return Err(FormatReadError::Parse {
            message: "no GeoJSON features found".to_string(),
            position: None,
            context: Some(context.to_string()),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_feature_collection() {
        let data = br#"{
  "type": "FeatureCollection",
  "features": [
    {"type":"Feature","id":"gl-1","geometry":{"type":"Point","coordinates":[1.0,2.0]},"properties":{"name":"A"}},
    {"type":"Feature","geometry":null,"properties":{"value":42}}
  ]
}"#;

        let records = parse_geojson_bytes(data, "glaciers.geojson").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("gl-1"));
        assert!(records[0].geometry.is_some());
        assert_eq!(records[0].properties["name"], "A");
        assert!(records[1].geometry.is_none());
        assert_eq!(records[1].properties["value"], 42);
    }

    #[test]
    fn parse_bare_geometry() {
        let records =
            parse_geojson_bytes(br#"{"type":"Point","coordinates":[7.0,8.0]}"#, "point").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].properties.is_empty());
        assert!(records[0].geometry.is_some());
    }

    #[test]
    fn parse_sequence_skips_blank_lines() {
        let data = br#"{"type":"Feature","id":7,"geometry":{"type":"Point","coordinates":[0,0]},"properties":{"id":1}}

{"type":"Feature","geometry":{"type":"Point","coordinates":[1,1]},"properties":{"id":2}}
"#;

        let records = parse_geojson_bytes(data, "seq").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.as_deref(), Some("7"));
    }

    #[test]
    fn empty_input_is_parse_error() {
        let err = parse_geojson_bytes(b"\n\n", "empty").unwrap_err();
        assert!(matches!(err, FormatReadError::Parse { .. }));
        assert!(err.to_string().contains("no GeoJSON features found"));
    }

    #[test]
    fn invalid_input_reports_both_attempts() {
        let err = parse_geojson_bytes(b"not json", "broken.geojson").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("broken.geojson"));
        assert!(message.contains("Not a GeoJSON document"));
        assert!(message.contains("nor a GeoJSON sequence"));
    }

    #[test]
    fn record_display() {
        let record = FeatureRecord {
            id: Some("a".into()),
            ..FeatureRecord::default()
        };
        assert_eq!(record.to_string(), "Feature(id=a, properties=0, geometry=no)");
    }
}

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use arrow_array::{
    ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, RecordBatchOptions, StringArray,
};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use datapool_shared::{FormatReadError, FormatResult, NoDataValue};
use geo_types::Geometry;
use geojson::JsonValue;

use crate::parser::{FeatureRecord, parse_geojson_file};

/// Features held as an attribute table plus a parallel geometry column.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    /// One row per feature, one column per property name.
    pub properties: RecordBatch,
    /// Geometry of each feature, aligned with `properties` rows.
    pub geometries: Vec<Option<Geometry<f64>>>,
    /// Feature identifiers, aligned with `properties` rows.
    pub ids: Vec<Option<String>>,
}

impl FeatureTable {
    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.properties.num_rows()
    }

    /// Number of features that carry a geometry.
    #[must_use]
    pub fn geometry_count(&self) -> usize {
        self.geometries.iter().filter(|g| g.is_some()).count()
    }
}

/// Read several `GeoJSON` files into one feature table, in the order given.
///
/// # Errors
///
/// Returns an error if any file fails to read or parse.
pub fn read_geojson_files<P: AsRef<Path>>(
    paths: &[P],
    no_data: Option<&NoDataValue>,
) -> FormatResult<FeatureTable> {
    let mut records = Vec::new();
    for path in paths {
        records.extend(parse_geojson_file(path)?);
    }
    features_to_table(records, no_data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PropertyType {
    Null,
    Boolean,
    Int64,
    Float64,
    Utf8,
}

impl PropertyType {
    fn update(self, value: &JsonValue) -> Self {
        match (self, value) {
            (current, JsonValue::Null) => current,
            (Self::Null | Self::Boolean, JsonValue::Bool(_)) => Self::Boolean,
            (Self::Null | Self::Int64, JsonValue::Number(n)) if n.is_i64() => Self::Int64,
            (Self::Null | Self::Int64 | Self::Float64, JsonValue::Number(_)) => Self::Float64,
            _ => Self::Utf8,
        }
    }

    fn data_type(self) -> DataType {
        match self {
            Self::Null | Self::Utf8 => DataType::Utf8,
            Self::Boolean => DataType::Boolean,
            Self::Int64 => DataType::Int64,
            Self::Float64 => DataType::Float64,
        }
    }
}

/// Build a feature table from parsed records.
///
/// Property columns appear in the order they are first seen. Values equal to
/// `no_data` become nulls.
///
/// # Errors
///
/// Returns a schema error if the Arrow batch cannot be assembled.
pub fn features_to_table(
    records: Vec<FeatureRecord>,
    no_data: Option<&NoDataValue>,
) -> FormatResult<FeatureTable> {
    let mut names: Vec<String> = Vec::new();
    let mut types: HashMap<String, PropertyType> = HashMap::new();

    for record in &records {
        for (name, value) in &record.properties {
            let current = types.entry(name.clone()).or_insert_with(|| {
                names.push(name.clone());
                PropertyType::Null
            });
            if !is_no_data(value, no_data) {
                *current = current.update(value);
            }
        }
    }

    let schema: SchemaRef = Arc::new(Schema::new(
        names
            .iter()
            .map(|name| Field::new(name, types[name].data_type(), true))
            .collect::<Vec<_>>(),
    ));

    let columns: Vec<ArrayRef> = names
        .iter()
        .map(|name| {
            let values: Vec<Option<&JsonValue>> = records
                .iter()
                .map(|record| {
                    record
                        .properties
                        .get(name)
                        .filter(|value| !is_no_data(value, no_data))
                })
                .collect();
            build_array(types[name], &values)
        })
        .collect();

    let properties = RecordBatch::try_new_with_options(
        schema,
        columns,
        &RecordBatchOptions::new().with_row_count(Some(records.len())),
    )
    .map_err(|e| FormatReadError::Schema {
        message: format!("Failed to build feature table: {e}"),
        context: None,
    })?;

    let (ids, geometries) = records
        .into_iter()
        .map(|record| (record.id, record.geometry))
        .unzip();

    Ok(FeatureTable {
        properties,
        geometries,
        ids,
    })
}

fn is_no_data(value: &JsonValue, no_data: Option<&NoDataValue>) -> bool {
    let Some(sentinel) = no_data else {
        return false;
    };
    match value {
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| sentinel.matches_f64(v)),
        JsonValue::String(text) => sentinel.matches_text(text),
        _ => false,
    }
}

fn build_array(kind: PropertyType, values: &[Option<&JsonValue>]) -> ArrayRef {
    match kind {
        PropertyType::Boolean => Arc::new(
            values
                .iter()
                .map(|v| v.and_then(JsonValue::as_bool))
                .collect::<BooleanArray>(),
        ),
        PropertyType::Int64 => Arc::new(
            values
                .iter()
                .map(|v| v.and_then(JsonValue::as_i64))
                .collect::<Int64Array>(),
        ),
        PropertyType::Float64 => Arc::new(
            values
                .iter()
                .map(|v| v.and_then(JsonValue::as_f64))
                .collect::<Float64Array>(),
        ),
        PropertyType::Null | PropertyType::Utf8 => Arc::new(
            values
                .iter()
                .map(|v| v.and_then(json_to_text))
                .collect::<StringArray>(),
        ),
    }
}

fn json_to_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

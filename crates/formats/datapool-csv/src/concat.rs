//! Concatenation of tables read from several files.

use std::collections::HashMap;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow_array::{ArrayRef, RecordBatch, new_null_array};
use arrow_cast::cast;
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use datapool_shared::{FormatReadError, FormatResult};

/// Common type for a column that appears with different types in different files.
///
/// Integers widen to floats; any other disagreement falls back to text.
#[must_use]
pub fn unify_types(left: &DataType, right: &DataType) -> DataType {
    match (left, right) {
        (l, r) if l == r => l.clone(),
        (DataType::Null, other) | (other, DataType::Null) => other.clone(),
        (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64) => {
            DataType::Float64
        },
        _ => DataType::Utf8,
    }
}

/// Concatenate tables row-wise, unifying their schemas by column name.
///
/// Columns keep the order in which they are first seen. A column missing from
/// one table is filled with nulls for that table's rows, and a column whose
/// type differs between tables is cast to [`unify_types`].
///
/// # Errors
///
/// Returns an error if `tables` is empty or a column cannot be cast.
pub fn concat_tables(tables: &[RecordBatch]) -> FormatResult<RecordBatch> {
    let Some(first) = tables.first() else {
        return Err(FormatReadError::Schema {
            message: "No tables to concatenate".to_string(),
            context: None,
        });
    };
    if tables.len() == 1 {
        return Ok(first.clone());
    }

    let schema = unified_schema(tables);
    let aligned = tables
        .iter()
        .map(|table| align_to_schema(table, &schema))
        .collect::<FormatResult<Vec<_>>>()?;

    concat_batches(&schema, &aligned).map_err(|e| FormatReadError::Schema {
        message: format!("Failed to concatenate tables: {e}"),
        context: None,
    })
}

fn unified_schema(tables: &[RecordBatch]) -> SchemaRef {
    let mut fields: Vec<(String, DataType)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for table in tables {
        for field in table.schema().fields() {
            match positions.get(field.name()) {
                Some(&idx) => {
                    let unified = unify_types(&fields[idx].1, field.data_type());
                    fields[idx].1 = unified;
                },
                None => {
                    positions.insert(field.name().clone(), fields.len());
                    fields.push((field.name().clone(), field.data_type().clone()));
                },
            }
        }
    }

    Arc::new(Schema::new(
        fields
            .into_iter()
            .map(|(name, data_type)| Field::new(name, data_type, true))
            .collect::<Vec<_>>(),
    ))
}

fn align_to_schema(table: &RecordBatch, schema: &SchemaRef) -> FormatResult<RecordBatch> {
    let source = table.schema();
    let columns = schema
        .fields()
        .iter()
        .map(|field| match source.index_of(field.name()) {
            Ok(idx) => {
                let column = table.column(idx);
                if column.data_type() == field.data_type() {
                    Ok(column.clone())
                } else {
                    cast(column, field.data_type()).map_err(|e| FormatReadError::Schema {
                        message: format!(
                            "Cannot cast column '{}' from {} to {}: {e}",
                            field.name(),
                            column.data_type(),
                            field.data_type()
                        ),
                        context: None,
                    })
                }
            },
            Err(_) => Ok(new_null_array(field.data_type(), table.num_rows())),
        })
        .collect::<FormatResult<Vec<ArrayRef>>>()?;

    RecordBatch::try_new(schema.clone(), columns).map_err(|e| FormatReadError::Schema {
        message: format!("Failed to align table: {e}"),
        context: None,
    })
}

//! CSV parsing and conversion to Arrow record batches.

use std::path::Path;
use std::sync::Arc;

use arrow_array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_array::RecordBatchOptions;
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use csv::StringRecord;
use datapool_shared::{FormatReadError, FormatResult, SourcePosition};

use crate::concat::concat_tables;
use crate::options::CsvReadOptions;

/// Read one CSV file into a record batch.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid CSV, or has no
/// header to infer a schema from.
pub fn read_csv_file(path: impl AsRef<Path>, options: &CsvReadOptions) -> FormatResult<RecordBatch> {
    let path = path.as_ref();
    let context = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| FormatReadError::io(e, context.clone()))?;
    read_csv_bytes(&bytes, options, &context)
}

/// Read several CSV files and concatenate them in the order given.
///
/// Column sets may differ between files; see [`concat_tables`] for how the
/// schemas are unified.
///
/// # Errors
///
/// Returns an error if `paths` is empty or any file fails to read.
pub fn read_csv_files<P: AsRef<Path>>(
    paths: &[P],
    options: &CsvReadOptions,
) -> FormatResult<RecordBatch> {
    let tables = paths
        .iter()
        .map(|path| read_csv_file(path, options))
        .collect::<FormatResult<Vec<_>>>()?;
    concat_tables(&tables)
}

/// Parse CSV bytes into a record batch.
///
/// `context` names the source in error messages.
///
/// # Errors
///
/// Returns an error if the CSV is malformed or empty.
pub fn read_csv_bytes(
    bytes: &[u8],
    options: &CsvReadOptions,
    context: &str,
) -> FormatResult<RecordBatch> {
    let (headers, records) = parse_records(bytes, options, context)?;
    let schema = Arc::new(schema_from_records(headers, &records, options));
    records_to_batch(&schema, &records, options, context)
}

/// Infer the schema of CSV bytes without building the batch.
///
/// # Errors
///
/// Returns an error if the CSV is malformed or empty.
pub fn infer_schema(bytes: &[u8], options: &CsvReadOptions) -> FormatResult<Schema> {
    let (headers, records) = parse_records(bytes, options, "CSV input")?;
    Ok(schema_from_records(headers, &records, options))
}

fn skip_leading_lines(bytes: &[u8], count: usize) -> &[u8] {
    let mut rest = bytes;
    for _ in 0..count {
        match rest.iter().position(|b| *b == b'\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return &[],
        }
    }
    rest
}

fn parse_records(
    bytes: &[u8],
    options: &CsvReadOptions,
    context: &str,
) -> FormatResult<(Vec<String>, Vec<StringRecord>)> {
    let body = skip_leading_lines(bytes, options.skip_lines);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(options.has_header)
        .flexible(true)
        .from_reader(body);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| parse_error(&err, context))?;
        records.push(record);
    }

    let headers: Vec<String> = if options.has_header {
        let headers = reader.headers().map_err(|err| parse_error(&err, context))?;
        if headers.is_empty() {
            return Err(empty_file(context));
        }
        headers.iter().map(|h| h.trim().to_string()).collect()
    } else {
        // Generate column names if no header
        let width = records.iter().map(StringRecord::len).max().unwrap_or(0);
        if width == 0 {
            return Err(empty_file(context));
        }
        (0..width).map(|i| format!("column_{i}")).collect()
    };

    Ok((headers, records))
}

fn empty_file(context: &str) -> FormatReadError {
    FormatReadError::Schema {
        message: "Cannot infer schema from empty file".to_string(),
        context: Some(context.to_string()),
    }
}

fn parse_error(err: &csv::Error, context: &str) -> FormatReadError {
    let position = err.position().map(|pos| SourcePosition {
        line: Some(pos.line()),
        column: None,
        record: Some(pos.record()),
    });
    FormatReadError::Parse {
        message: err.to_string(),
        position,
        context: Some(context.to_string()),
    }
}

fn schema_from_records(
    headers: Vec<String>,
    records: &[StringRecord],
    options: &CsvReadOptions,
) -> Schema {
    let max_records = options.schema_infer_max_rec.unwrap_or(records.len());
    let sample = &records[..records.len().min(max_records)];

    let fields: Vec<Field> = headers
        .into_iter()
        .enumerate()
        .map(|(col_idx, name)| {
            let data_type = infer_column_type(sample, col_idx, options);
            Field::new(name, data_type, true)
        })
        .collect();

    Schema::new(fields)
}

/// Infer the data type of a column by sampling values
fn infer_column_type(records: &[StringRecord], col_idx: usize, options: &CsvReadOptions) -> DataType {
    let mut has_float = false;
    let mut has_int = false;
    let mut has_bool = false;
    let mut has_text = false;

    for value in records.iter().filter_map(|record| record.get(col_idx)) {
        if options.is_missing(value) {
            continue;
        }
        let value = value.trim();

        if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
            has_bool = true;
        } else if value.parse::<i64>().is_ok() {
            has_int = true;
        } else if value.parse::<f64>().is_ok() {
            has_float = true;
        } else {
            has_text = true;
        }
    }

    // Prioritize type inference: Text > Bool > Float > Int
    if has_text || (has_bool && (has_int || has_float)) {
        DataType::Utf8
    } else if has_bool {
        DataType::Boolean
    } else if has_float {
        DataType::Float64
    } else if has_int {
        DataType::Int64
    } else {
        DataType::Utf8
    }
}

fn records_to_batch(
    schema: &SchemaRef,
    records: &[StringRecord],
    options: &CsvReadOptions,
    context: &str,
) -> FormatResult<RecordBatch> {
    let columns = schema
        .fields()
        .iter()
        .enumerate()
        .map(|(col_idx, field)| build_array(field, col_idx, records, options, context))
        .collect::<FormatResult<Vec<ArrayRef>>>()?;

    RecordBatch::try_new_with_options(
        schema.clone(),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(records.len())),
    )
    .map_err(|e| FormatReadError::Schema {
        message: format!("Failed to create RecordBatch: {e}"),
        context: Some(context.to_string()),
    })
}

fn build_array(
    field: &Field,
    col_idx: usize,
    records: &[StringRecord],
    options: &CsvReadOptions,
    context: &str,
) -> FormatResult<ArrayRef> {
    let cells = ColumnCells {
        field,
        col_idx,
        records,
        options,
        context,
    };
    let array: ArrayRef = match field.data_type() {
        DataType::Int64 => Arc::new(Int64Array::from(cells.parse(|s| s.parse::<i64>().ok())?)),
        DataType::Float64 => Arc::new(Float64Array::from(cells.parse(|s| s.parse::<f64>().ok())?)),
        DataType::Boolean => Arc::new(BooleanArray::from(
            cells.parse(|s| s.to_ascii_lowercase().parse::<bool>().ok())?,
        )),
        _ => {
            let array: StringArray = records
                .iter()
                .map(|record| record.get(col_idx).filter(|raw| !options.is_missing(raw)))
                .collect();
            Arc::new(array)
        },
    };
    Ok(array)
}

/// One column of parsed records, converted cell by cell to its inferred type.
struct ColumnCells<'a> {
    field: &'a Field,
    col_idx: usize,
    records: &'a [StringRecord],
    options: &'a CsvReadOptions,
    context: &'a str,
}

impl ColumnCells<'_> {
    /// Missing cells become `None`; any other cell that does not parse is an error.
    fn parse<T>(&self, parse: impl Fn(&str) -> Option<T>) -> FormatResult<Vec<Option<T>>> {
        self.records
            .iter()
            .map(|record| {
                let Some(raw) = record
                    .get(self.col_idx)
                    .filter(|raw| !self.options.is_missing(raw))
                else {
                    return Ok(None);
                };
                parse(raw.trim())
                    .map(Some)
                    .ok_or_else(|| self.invalid_cell(record, raw))
            })
            .collect()
    }

    fn invalid_cell(&self, record: &StringRecord, raw: &str) -> FormatReadError {
        FormatReadError::Parse {
            message: format!(
                "'{raw}' in column '{}' is not a valid {}",
                self.field.name(),
                self.field.data_type()
            ),
            position: Some(SourcePosition {
                line: None,
                column: u64::try_from(self.col_idx + 1).ok(),
                record: record.position().map(csv::Position::record),
            }),
            context: Some(self.context.to_string()),
        }
    }
}

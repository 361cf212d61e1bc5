//! Display utilities for formatting CLI output.
//!
//! Table rows for catalog entries, formats and schemas, plus printing and
//! CSV export of loaded data.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use tabled::{Table, Tabled};

use datapool_core::formats::Format;
use datapool_core::{CatalogRow, GridDataset, LoadedData, Resolutions};

/// Table row for one catalog entry.
#[derive(Tabled)]
pub struct EntryRow {
    #[tabled(rename = "Dataset")]
    pub dataset: String,
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Subdataset")]
    pub subdataset: String,
    #[tabled(rename = "Extension")]
    pub extension: String,
    #[tabled(rename = "Loader")]
    pub loader: String,
    #[tabled(rename = "Tags")]
    pub tags: String,
    #[tabled(rename = "Path")]
    pub path: String,
}

impl From<&CatalogRow> for EntryRow {
    fn from(row: &CatalogRow) -> Self {
        Self {
            dataset: row.dataset.clone(),
            version: row.version.clone(),
            subdataset: row.subdataset.clone().unwrap_or_else(|| "-".to_string()),
            extension: row.extension.clone(),
            loader: row.loader.clone(),
            tags: row.tags.join(", "),
            path: row.full_path.display().to_string(),
        }
    }
}

/// Table row for one entry of the format registry.
#[derive(Tabled)]
pub struct FormatRow {
    #[tabled(rename = "Extension")]
    pub extension: String,
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "Read")]
    pub read: String,
}

/// Table row for displaying field/column information.
#[derive(Tabled)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub data_type: String,
    #[tabled(rename = "Nullable")]
    pub nullable: String,
}

#[derive(Tabled)]
pub struct ResolutionRow {
    #[tabled(rename = "Mode")]
    pub mode: String,
    #[tabled(rename = "Resolution")]
    pub label: String,
    #[tabled(rename = "File Token")]
    pub token: String,
}

#[derive(Tabled)]
pub struct VariableRow {
    #[tabled(rename = "Variable")]
    pub name: String,
    #[tabled(rename = "Dimensions")]
    pub dims: String,
    #[tabled(rename = "Shape")]
    pub shape: String,
    #[tabled(rename = "Missing")]
    pub missing: usize,
}

pub fn display_entries(rows: &[CatalogRow]) {
    if rows.is_empty() {
        println!("No matching catalog entries.");
        return;
    }
    let rows: Vec<EntryRow> = rows.iter().map(EntryRow::from).collect();
    println!("{}", Table::new(rows));
}

pub fn display_formats(formats: &[Format]) {
    println!("\nKnown Formats ({} total):\n", formats.len());
    let rows: Vec<FormatRow> = formats
        .iter()
        .map(|f| FormatRow {
            extension: f.extension.to_string(),
            long_name: f.long_name.to_string(),
            kind: f.kind.as_str().to_string(),
            read: f.read.as_str().to_string(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

pub fn display_resolutions(resolutions: &Resolutions) {
    let rows: Vec<ResolutionRow> = resolutions
        .iter()
        .flat_map(|(mode, labels)| {
            labels.iter().map(move |(label, token)| ResolutionRow {
                mode: mode.to_string(),
                label: label.clone(),
                token: token.clone(),
            })
        })
        .collect();
    println!("{}", Table::new(rows));
}

/// Field rows describing the columns of `batch`.
pub fn field_rows(batch: &RecordBatch) -> Vec<FieldRow> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|f| FieldRow {
            name: f.name().clone(),
            data_type: f.data_type().to_string(),
            nullable: if f.is_nullable() { "Yes" } else { "No" }.to_string(),
        })
        .collect()
}

fn display_batch(batch: &RecordBatch, head: usize) -> Result<()> {
    println!("\n=== Fields ===");
    println!("{}", Table::new(field_rows(batch)));

    if head > 0 && batch.num_rows() > 0 {
        let preview = batch.slice(0, head.min(batch.num_rows()));
        println!("\n=== First {} records ===", preview.num_rows());
        println!("{}", pretty_format_batches(&[preview])?);
    }
    Ok(())
}

fn display_grid(grid: &GridDataset) {
    let rows: Vec<VariableRow> = grid
        .variables
        .iter()
        .map(|(name, array)| VariableRow {
            name: name.clone(),
            dims: array.dims.join(", "),
            shape: format!("{:?}", array.shape),
            missing: array.missing_count(),
        })
        .collect();
    println!("{}", Table::new(rows));
}

/// Print a summary of `data` and its first `head` records.
///
/// # Errors
///
/// Returns an error if the preview cannot be formatted.
pub fn display_loaded(data: &LoadedData, head: usize) -> Result<()> {
    println!("Loaded {} ({} records)", data.kind(), data.num_rows());
    match data {
        LoadedData::Table(batch) => display_batch(batch, head)?,
        LoadedData::Features(features) => {
            println!("Features with geometry: {}", features.geometry_count());
            display_batch(&features.properties, head)?;
        },
        LoadedData::Grid(grid) => display_grid(grid),
    }
    Ok(())
}

/// Write the tabular part of `data` to a CSV file.
///
/// # Errors
///
/// Returns an error for gridded data, or if the file cannot be written.
pub fn write_csv(data: &LoadedData, path: &Path) -> Result<()> {
    let batch = match data {
        LoadedData::Table(batch) => batch,
        LoadedData::Features(features) => &features.properties,
        LoadedData::Grid(_) => anyhow::bail!("Gridded data cannot be written as CSV"),
    };
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = arrow_csv::Writer::new(file);
    writer.write(batch)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array};
    use arrow::datatypes::{DataType, Field, Schema};

    use super::*;

    fn batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("depth", DataType::Float64, true),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(Float64Array::from(vec![Some(1.5), None])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn field_rows_follow_schema() {
        let rows = field_rows(&batch());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "id");
        assert_eq!(rows[0].nullable, "No");
        assert_eq!(rows[1].data_type, "Float64");
    }

    #[test]
    fn csv_export_writes_header_and_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&LoadedData::Table(batch()), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "id,depth\n1,1.5\n2,\n");
    }

    #[test]
    fn grids_are_not_exported() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = write_csv(&LoadedData::Grid(GridDataset::new()), &dir.path().join("g.csv"));
        assert!(err.is_err());
    }
}

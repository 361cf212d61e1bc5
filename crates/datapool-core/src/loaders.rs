//! Loader registry and the built-in loaders.
//!
//! A row names its loader (`default` unless configured otherwise). The
//! catalog looks the name up in its [`LoaderRegistry`] and hands the loader the
//! catalog, the resolved row and the caller's [`LoadOptions`]. Loaders return
//! whatever [`LoadedData`] suits the files they read.
//!
//! Two loaders are always registered:
//!
//! * `default` dispatches on the row's extension to a [`FormatReader`] and
//!   reads static files only;
//! * `time_indexed` reads tabular files and, for annual files, stamps each
//!   file's rows with a date taken from the years in its name.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::{ArrayRef, Date32Array, RecordBatch};
use arrow_schema::{DataType, Field, Schema};
use datapool_csv::{CsvReadOptions, concat_tables, read_csv_file, read_csv_files};
use datapool_geojson::read_geojson_files;
use datapool_shared::{FormatReadError, NoDataValue};
use datapool_tiff::read_tiff_file;

use crate::catalog::DataCatalog;
use crate::data::{GridArray, GridDataset, LoadedData};
use crate::discovery::find_files;
use crate::error::{ConfigError, FormatError, OptionError, QueryError, Result};
use crate::filter::filter_by_resolution_and_mode;
use crate::formats::{find_format, normalise_extension};
use crate::options::LoadOptions;
use crate::row::{CatalogRow, DEFAULT_LOADER};
use crate::time::{date32_days, mid_year_date, year_range_from_file_name};

/// Name of the built-in time-stamping loader.
pub const TIME_INDEXED_LOADER: &str = "time_indexed";

/// Name of the column `time_indexed` appends to annual files.
pub const TIME_COLUMN: &str = "time";

/// Reads the files behind a catalog row.
pub trait Loader: Send + Sync {
    /// Load `row`.
    ///
    /// # Errors
    ///
    /// Returns an error if files cannot be found, filtered or read.
    fn load(
        &self,
        catalog: &DataCatalog,
        row: &CatalogRow,
        options: &LoadOptions,
    ) -> Result<LoadedData>;
}

impl<F> Loader for F
where
    F: Fn(&DataCatalog, &CatalogRow, &LoadOptions) -> Result<LoadedData> + Send + Sync,
{
    fn load(
        &self,
        catalog: &DataCatalog,
        row: &CatalogRow,
        options: &LoadOptions,
    ) -> Result<LoadedData> {
        self(catalog, row, options)
    }
}

/// Reads a list of files of one format.
pub trait FormatReader: Send + Sync {
    /// Read `files`, in order, using the row's reading attributes.
    ///
    /// # Errors
    ///
    /// Returns an error if any file cannot be read.
    fn read(&self, files: &[PathBuf], row: &CatalogRow, options: &LoadOptions)
    -> Result<LoadedData>;
}

impl<F> FormatReader for F
where
    F: Fn(&[PathBuf], &CatalogRow, &LoadOptions) -> Result<LoadedData> + Send + Sync,
{
    fn read(
        &self,
        files: &[PathBuf],
        row: &CatalogRow,
        options: &LoadOptions,
    ) -> Result<LoadedData> {
        self(files, row, options)
    }
}

/// Name to loader mapping.
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: BTreeMap<String, Arc<dyn Loader>>,
}

impl LoaderRegistry {
    /// A registry holding the built-in `default` and `time_indexed` loaders.
    #[must_use]
    pub fn new() -> Self {
        let mut loaders: BTreeMap<String, Arc<dyn Loader>> = BTreeMap::new();
        loaders.insert(DEFAULT_LOADER.to_string(), Arc::new(DefaultLoader::new()));
        loaders.insert(TIME_INDEXED_LOADER.to_string(), Arc::new(TimeIndexedLoader));
        Self { loaders }
    }

    /// Register `loader` under `name`, replacing any loader of that name.
    pub fn register(&mut self, name: impl Into<String>, loader: impl Loader + 'static) {
        let name = name.into();
        log::debug!("Registering loader '{name}'");
        self.loaders.insert(name, Arc::new(loader));
    }

    #[must_use]
    pub fn with_loader(mut self, name: impl Into<String>, loader: impl Loader + 'static) -> Self {
        self.register(name, loader);
        self
    }

    /// Look up a loader by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownLoader`] listing the registered names.
    pub fn get(&self, name: &str) -> std::result::Result<Arc<dyn Loader>, ConfigError> {
        self.loaders
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownLoader {
                name: name.to_string(),
                available: self.names(),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.loaders.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.loaders.keys().cloned().collect()
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("loaders", &self.names())
            .finish()
    }
}

/// Find the files behind `row` and narrow them by the caller's mode and resolution.
///
/// Custom loaders call this to get the same file list the built-in loaders see.
///
/// # Errors
///
/// Returns [`QueryError::NoFilesFound`] when nothing is found or nothing
/// survives filtering, and an [`OptionError`] when the options do not fit
/// the row's resolution or static metadata.
pub fn discover_files(row: &CatalogRow, options: &LoadOptions) -> Result<Vec<PathBuf>> {
    let no_files = || QueryError::NoFilesFound {
        root: row.full_path.clone(),
        extension: row.extension.clone(),
    };

    let files = find_files(
        &row.full_path,
        &row.extension,
        &row.ignore_dirs,
        &row.ignore_files,
    )?;
    if files.is_empty() {
        return Err(no_files().into());
    }

    let found = files.len();
    let files = filter_by_resolution_and_mode(
        files,
        options.resolution.as_deref(),
        options.static_files,
        &row.static_patterns,
        row.resolutions.as_ref(),
    )?;
    log::debug!(
        "{}: {} of {found} files kept after resolution/mode filtering",
        row,
        files.len()
    );
    if files.is_empty() {
        return Err(no_files().into());
    }
    Ok(files)
}

fn csv_options(row: &CatalogRow) -> CsvReadOptions {
    CsvReadOptions::new()
        .with_schema_infer_max_rec(None)
        .with_skip_lines(row.skip_lines)
        .with_no_data(row.no_data_value.clone())
}

fn read_failed(row: &CatalogRow) -> impl Fn(FormatReadError) -> FormatError + '_ {
    move |source| {
        FormatError::Read(source.with_additional_context(format!("dataset '{}'", row.dataset)))
    }
}

struct CsvReader;

impl FormatReader for CsvReader {
    fn read(&self, files: &[PathBuf], row: &CatalogRow, _: &LoadOptions) -> Result<LoadedData> {
        let table = read_csv_files(files, &csv_options(row)).map_err(read_failed(row))?;
        Ok(LoadedData::Table(table))
    }
}

struct GeoJsonReader;

impl FormatReader for GeoJsonReader {
    fn read(&self, files: &[PathBuf], row: &CatalogRow, _: &LoadOptions) -> Result<LoadedData> {
        let features =
            read_geojson_files(files, row.no_data_value.as_ref()).map_err(read_failed(row))?;
        Ok(LoadedData::Features(features))
    }
}

/// One grid variable per file, named by the file stem.
struct TiffReader;

impl FormatReader for TiffReader {
    fn read(&self, files: &[PathBuf], row: &CatalogRow, _: &LoadOptions) -> Result<LoadedData> {
        let sentinel = row.no_data_value.as_ref().and_then(NoDataValue::as_f64);
        let mut grid = GridDataset::new();
        for path in files {
            let mut array = GridArray::from(read_tiff_file(path).map_err(read_failed(row))?);
            if let Some(sentinel) = sentinel {
                array.mask(sentinel);
            }
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            if grid.variables.insert(name.clone(), array).is_some() {
                log::warn!("{row}: variable '{name}' replaced by {}", path.display());
            }
        }
        Ok(LoadedData::Grid(grid))
    }
}

/// Extension-dispatching loader for static files.
#[derive(Clone)]
pub struct DefaultLoader {
    readers: BTreeMap<String, Arc<dyn FormatReader>>,
}

impl DefaultLoader {
    /// A loader with the built-in CSV, `GeoJSON` and TIFF readers.
    #[must_use]
    pub fn new() -> Self {
        let geojson: Arc<dyn FormatReader> = Arc::new(GeoJsonReader);
        let mut readers: BTreeMap<String, Arc<dyn FormatReader>> = BTreeMap::new();
        readers.insert("csv".to_string(), Arc::new(CsvReader));
        for extension in datapool_geojson::EXTENSIONS {
            readers.insert((*extension).to_string(), Arc::clone(&geojson));
        }
        let tiff: Arc<dyn FormatReader> = Arc::new(TiffReader);
        for extension in datapool_tiff::EXTENSIONS {
            readers.insert((*extension).to_string(), Arc::clone(&tiff));
        }
        Self { readers }
    }

    /// Add or replace the reader for `extension`.
    #[must_use]
    pub fn with_reader(mut self, extension: &str, reader: impl FormatReader + 'static) -> Self {
        self.readers
            .insert(normalise_extension(extension), Arc::new(reader));
        self
    }

    /// Extensions with a reader, sorted.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        self.readers.keys().cloned().collect()
    }
}

impl Default for DefaultLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader for DefaultLoader {
    fn load(&self, _: &DataCatalog, row: &CatalogRow, options: &LoadOptions) -> Result<LoadedData> {
        if options.static_files == Some(false) {
            return Err(OptionError::AnnualNotSupported {
                loader: DEFAULT_LOADER.to_string(),
            }
            .into());
        }

        let extension = normalise_extension(&row.extension);
        let Some(reader) = self.readers.get(&extension) else {
            if let Some(format) = find_format(&extension) {
                log::warn!(
                    "{} files ({}) are known but have no reader: {}",
                    format.long_name,
                    format.kind,
                    format.read
                );
            }
            return Err(FormatError::UnsupportedExtension {
                extension,
                supported: self.extensions(),
            }
            .into());
        };

        let files = discover_files(row, options)?;
        log::info!("Loading {} '{extension}' files for {row}", files.len());
        reader.read(&files, row, options)
    }
}

/// Loader for tabular files that carry their year in the file name.
///
/// Annual files are read one at a time and given a `time` column holding
/// 2 July of the middle year named in the file; static files are read as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeIndexedLoader;

impl Loader for TimeIndexedLoader {
    fn load(&self, _: &DataCatalog, row: &CatalogRow, options: &LoadOptions) -> Result<LoadedData> {
        let extension = normalise_extension(&row.extension);
        if extension != "csv" {
            return Err(FormatError::UnsupportedExtension {
                extension,
                supported: vec!["csv".to_string()],
            }
            .into());
        }

        let files = discover_files(row, options)?;
        let read_options = csv_options(row);

        if options.static_files == Some(true) {
            let table = read_csv_files(&files, &read_options).map_err(read_failed(row))?;
            return Ok(LoadedData::Table(table));
        }

        let tables = files
            .iter()
            .map(|path| -> Result<RecordBatch> {
                let (start, end) = year_range_from_file_name(path)
                    .ok_or_else(|| FormatError::NoYearInFileName { path: path.clone() })?;
                let date = mid_year_date(start, end).ok_or_else(|| FormatError::TimeColumn {
                    message: format!("no calendar date for the years {start}-{end}"),
                })?;
                log::debug!("{}: years {start}-{end}, stamped {date}", path.display());

                let table = read_csv_file(path, &read_options).map_err(read_failed(row))?;
                Ok(with_time_column(&table, date32_days(date))?)
            })
            .collect::<Result<Vec<_>>>()?;

        let table = concat_tables(&tables).map_err(read_failed(row))?;
        Ok(LoadedData::Table(table))
    }
}

fn with_time_column(table: &RecordBatch, days: i32) -> std::result::Result<RecordBatch, FormatError> {
    let schema = table.schema();
    if schema.index_of(TIME_COLUMN).is_ok() {
        return Err(FormatError::TimeColumn {
            message: format!("file already has a '{TIME_COLUMN}' column"),
        });
    }

    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.push(Field::new(TIME_COLUMN, DataType::Date32, false));

    let time: ArrayRef = Arc::new(Date32Array::from(vec![days; table.num_rows()]));
    let mut columns: Vec<ArrayRef> = table.columns().to_vec();
    columns.push(time);

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns).map_err(|e| {
        FormatError::TimeColumn {
            message: e.to_string(),
        }
    })
}

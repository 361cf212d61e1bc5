//! CSV reading for `DataPool` tabular datasets.
//!
//! Files are parsed with the `csv` crate and materialised as a single Arrow
//! [`RecordBatch`](arrow_array::RecordBatch). Column types are inferred from a
//! sample of rows, cells equal to the dataset's no-data sentinel become nulls,
//! and several files are concatenated in the order given with their schemas
//! unified by column name.
//!
//! ```no_run
//! use datapool_csv::{CsvReadOptions, read_csv_files};
//! use datapool_shared::NoDataValue;
//!
//! let options = CsvReadOptions::new()
//!     .with_skip_lines(2)
//!     .with_no_data(Some(NoDataValue::Integer(-9999)));
//! let table = read_csv_files(&["stations/v2/a.csv", "stations/v2/b.csv"], &options)?;
//! println!("{} rows", table.num_rows());
//! # Ok::<(), datapool_shared::FormatReadError>(())
//! ```

mod concat;
mod options;
mod reader;

pub use concat::{concat_tables, unify_types};
pub use options::CsvReadOptions;
pub use reader::{infer_schema, read_csv_bytes, read_csv_file, read_csv_files};

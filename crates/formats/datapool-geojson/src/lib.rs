//! `GeoJSON` reading for `DataPool` vector datasets.
//!
//! Files may hold a `FeatureCollection`, a single `Feature`, a bare geometry,
//! or a newline-delimited sequence of any of those. Features from every file
//! are gathered into one [`FeatureTable`]: an Arrow batch of properties
//! alongside a parallel column of `geo-types` geometries.

mod parser;
mod table;

pub use parser::{FeatureRecord, parse_geojson_bytes, parse_geojson_file};
pub use table::{FeatureTable, features_to_table, read_geojson_files};

/// File extensions this crate reads.
pub const EXTENSIONS: &[&str] = &["geojson", "json"];

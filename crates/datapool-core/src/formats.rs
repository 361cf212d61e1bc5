//! Table of file formats the catalog knows about.
//!
//! Each entry names a file extension, the kind of data it holds and whether
//! the built-in readers can load it yet. The `default` loader consults this
//! table to describe extensions it has no reader for.
//!
//! # Examples
//!
//! ```
//! use datapool_core::formats::{DataKind, find_format};
//!
//! let csv = find_format(".CSV").expect("csv is a known format");
//! assert_eq!(csv.kind, DataKind::Tabular);
//! assert!(csv.read.is_supported());
//! ```

use std::fmt;

/// Read support status of a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// A built-in reader exists.
    Supported,
    /// Known format, reader not built in yet.
    Planned,
}

impl SupportStatus {
    /// Returns `true` if a built-in reader exists.
    ///
    /// ```
    /// use datapool_core::formats::SupportStatus;
    ///
    /// assert!(SupportStatus::Supported.is_supported());
    /// assert!(!SupportStatus::Planned.is_supported());
    /// ```
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, SupportStatus::Supported)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportStatus::Supported => "Supported",
            SupportStatus::Planned => "Planned",
        }
    }
}

impl fmt::Display for SupportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The shape of data a format holds, which decides the in-memory form it loads into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Rows and columns; loads into an Arrow table.
    Tabular,
    /// Features with geometries; loads into a feature table.
    Vector,
    /// Georeferenced bands; loads into a grid.
    Raster,
    /// Multi-dimensional variables; loads into a grid.
    Gridded,
}

impl DataKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Tabular => "tabular",
            DataKind::Vector => "vector",
            DataKind::Raster => "raster",
            DataKind::Gridded => "gridded",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known file format.
#[derive(Debug, Clone)]
pub struct Format {
    /// Extension without the leading dot, lowercase.
    pub extension: &'static str,
    /// Descriptive name for display.
    pub long_name: &'static str,
    pub kind: DataKind,
    pub read: SupportStatus,
}

impl Format {
    #[must_use]
    pub const fn new(
        extension: &'static str,
        long_name: &'static str,
        kind: DataKind,
        read: SupportStatus,
    ) -> Self {
        Self {
            extension,
            long_name,
            kind,
            read,
        }
    }
}

/// Returns every known format, supported or not.
#[must_use]
pub fn get_formats() -> Vec<Format> {
    use DataKind::{Gridded, Raster, Tabular, Vector};
    use SupportStatus::{Planned, Supported};

    vec![
        Format::new("csv", "Comma Separated Value", Tabular, Supported),
        Format::new("geojson", "GeoJSON", Vector, Supported),
        Format::new("json", "GeoJSON (.json)", Vector, Supported),
        Format::new("gpkg", "GeoPackage", Vector, Planned),
        Format::new("shp", "ESRI Shapefile", Vector, Planned),
        Format::new("tif", "GeoTIFF", Raster, Supported),
        Format::new("tiff", "GeoTIFF", Raster, Supported),
        Format::new("nc", "NetCDF", Gridded, Planned),
    ]
}

/// Normalise an extension: strip leading dots and lowercase.
#[must_use]
pub fn normalise_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// Finds a format by extension, ignoring case and a leading dot.
///
/// ```
/// use datapool_core::formats::find_format;
///
/// assert_eq!(find_format("nc").map(|f| f.long_name), Some("NetCDF"));
/// assert!(find_format("xlsx").is_none());
/// ```
#[must_use]
pub fn find_format(extension: &str) -> Option<Format> {
    let extension = normalise_extension(extension);
    get_formats()
        .into_iter()
        .find(|format| format.extension == extension)
}

/// Extensions that have a built-in reader.
#[must_use]
pub fn supported_extensions() -> Vec<&'static str> {
    get_formats()
        .into_iter()
        .filter(|format| format.read.is_supported())
        .map(|format| format.extension)
        .collect()
}

//! In-memory forms a loader can return.

use std::collections::BTreeMap;

use arrow_array::RecordBatch;
use datapool_geojson::FeatureTable;
use datapool_tiff::Raster;

use crate::formats::DataKind;

/// A loaded dataset.
#[derive(Debug, Clone)]
pub enum LoadedData {
    /// Tabular data as a single Arrow batch.
    Table(RecordBatch),
    /// Vector features.
    Features(FeatureTable),
    /// Raster or gridded variables.
    Grid(GridDataset),
}

impl LoadedData {
    #[must_use]
    pub fn kind(&self) -> DataKind {
        match self {
            LoadedData::Table(_) => DataKind::Tabular,
            LoadedData::Features(_) => DataKind::Vector,
            LoadedData::Grid(_) => DataKind::Gridded,
        }
    }

    /// Rows for tables and features; the length of the first dimension for grids.
    #[must_use]
    pub fn num_rows(&self) -> usize {
        match self {
            LoadedData::Table(batch) => batch.num_rows(),
            LoadedData::Features(features) => features.num_rows(),
            LoadedData::Grid(grid) => grid.first_dim_len(),
        }
    }

    #[must_use]
    pub fn as_table(&self) -> Option<&RecordBatch> {
        match self {
            LoadedData::Table(batch) => Some(batch),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_features(&self) -> Option<&FeatureTable> {
        match self {
            LoadedData::Features(features) => Some(features),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_grid(&self) -> Option<&GridDataset> {
        match self {
            LoadedData::Grid(grid) => Some(grid),
            _ => None,
        }
    }
}

/// Named variables sharing a grid.
#[derive(Debug, Clone, Default)]
pub struct GridDataset {
    pub variables: BTreeMap<String, GridArray>,
    /// Free-form metadata carried from the source files.
    pub attributes: BTreeMap<String, String>,
}

impl GridDataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, array: GridArray) -> Self {
        self.variables.insert(name.into(), array);
        self
    }

    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&GridArray> {
        self.variables.get(name)
    }

    fn first_dim_len(&self) -> usize {
        self.variables
            .values()
            .next()
            .and_then(|array| array.shape.first().copied())
            .unwrap_or(0)
    }
}

/// A dense n-dimensional array of `f64` values in row-major order.
///
/// Missing cells hold `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct GridArray {
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
}

impl GridArray {
    /// Build an array, checking that `values` fills `shape` exactly.
    ///
    /// # Errors
    ///
    /// Returns a message when the dimension names, shape and value count disagree.
    pub fn try_new(dims: Vec<String>, shape: Vec<usize>, values: Vec<f64>) -> Result<Self, String> {
        if dims.len() != shape.len() {
            return Err(format!(
                "{} dimension names given for a {}-dimensional shape",
                dims.len(),
                shape.len()
            ));
        }
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(format!(
                "shape {shape:?} needs {expected} values, got {}",
                values.len()
            ));
        }
        Ok(Self {
            dims,
            shape,
            values,
        })
    }

    /// Replace cells equal to `sentinel` with `NaN`.
    pub fn mask(&mut self, sentinel: f64) {
        for value in &mut self.values {
            #[allow(clippy::float_cmp)]
            if *value == sentinel {
                *value = f64::NAN;
            }
        }
    }

    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_nan()).count()
    }
}

impl From<Raster> for GridArray {
    /// Single-band images become `(y, x)`; others keep a trailing `band` axis.
    fn from(raster: Raster) -> Self {
        let (dims, shape) = if raster.bands == 1 {
            (vec!["y", "x"], vec![raster.height, raster.width])
        } else {
            (vec!["y", "x", "band"], vec![raster.height, raster.width, raster.bands])
        };
        Self {
            dims: dims.into_iter().map(String::from).collect(),
            shape,
            values: raster.values,
        }
    }
}

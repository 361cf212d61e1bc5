//! `datapool-core` is the catalog library of the `DataPool` project: it indexes
//! versioned geoscience datasets described by a YAML configuration and loads
//! them through pluggable loaders.
//!
//! This crate includes:
//! - **Configuration**: Parsing of the catalog document and per-entry attribute resolution.
//! - **Catalog**: The immutable index of (dataset, version, subdataset) rows and its queries.
//! - **Discovery**: Recursive file search with ignore rules and resolution/mode filtering.
//! - **Loaders**: The loader registry, the default per-extension loader and the time-indexed loader.
//! - **Format Registry**: A static registry of file formats and their support status.
//!
//! ```no_run
//! use datapool_core::{DataCatalog, LoadOptions};
//!
//! let catalog = DataCatalog::from_path("catalog.yaml")?;
//! let data = catalog.load_dataset("velocity", None, None, &LoadOptions::new().with_static(true))?;
//! println!("{} records", data.num_rows());
//! # Ok::<(), datapool_core::DataPoolError>(())
//! ```

pub mod availability;
pub mod catalog;
pub mod config;
pub mod data;
pub mod describe;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod formats;
pub mod loaders;
pub mod options;
pub mod resolve;
pub mod row;
pub mod time;
pub mod versions;

pub use availability::{Availability, Notice};
pub use catalog::{CONFIG_ENV_VAR, DataCatalog};
pub use data::{GridArray, GridDataset, LoadedData};
pub use datapool_geojson::FeatureTable;
pub use datapool_shared::NoDataValue;
pub use describe::CatalogDescription;
pub use error::{DataPoolError, ErrorKind, Result};
pub use filter::{Mode, Resolutions};
pub use loaders::{DefaultLoader, FormatReader, Loader, LoaderRegistry, TimeIndexedLoader};
pub use options::LoadOptions;
pub use row::CatalogRow;

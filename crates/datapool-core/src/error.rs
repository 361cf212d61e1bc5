//! Error types for catalog construction, queries and loading.
//!
//! Every failure surfaces as a [`DataPoolError`]. The category enums mirror the
//! points at which things go wrong: [`ConfigError`] while the catalog is built,
//! [`QueryError`] and [`OptionError`] while a request is matched against the
//! index, and [`FormatError`] / [`IoError`] while files are read. Use
//! [`DataPoolError::kind`] to branch on the failure class without matching on
//! individual variants.

use std::path::PathBuf;

use datapool_shared::FormatReadError;
use thiserror::Error;

/// Main error type for `DataPool` operations.
#[derive(Debug, Error)]
pub enum DataPoolError {
    /// Invalid or inconsistent catalog configuration
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A query named something the index does not hold, or matched too much
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Caller options do not fit the capabilities of the selected entry
    #[error(transparent)]
    Options(#[from] OptionError),

    /// Unsupported file format or a reader failure
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Filesystem errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Errors raised by custom loaders
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification of a [`DataPoolError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised while building the catalog from its configuration.
    Configuration,
    /// Unknown dataset, version or subdataset, or no files matched.
    NotFound,
    /// More than one entry matched a query that must be unique.
    Ambiguity,
    /// An option was given that the entry does not support, or a required one was omitted.
    CapabilityMismatch,
    /// The file extension has no reader.
    UnsupportedFormat,
    /// Reading files failed.
    Io,
    /// Anything else, typically from a custom loader.
    Other,
}

/// Errors raised while building a catalog.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Catalog configuration file not found: '{}'", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Environment variable {var} is not set")]
    EnvNotSet { var: String },

    #[error("Invalid catalog YAML: {source}")]
    Yaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Catalog configuration has no 'datasets' mapping")]
    MissingDatasets,

    /// A dataset entry does not have the expected shape
    #[error("Invalid entry for dataset '{dataset}': {message}")]
    InvalidDataset {
        /// The dataset key
        dataset: String,
        /// What is wrong with it
        message: String,
    },

    /// A resolved attribute does not decode to its expected type
    #[error("Invalid '{attribute}' for {}: {message}", location(dataset, version, subdataset.as_deref()))]
    InvalidAttribute {
        dataset: String,
        version: String,
        subdataset: Option<String>,
        attribute: String,
        message: String,
    },

    /// A required attribute resolved to nothing
    #[error("'{attribute}' must be specified for {}", location(dataset, version, subdataset.as_deref()))]
    MissingAttribute {
        dataset: String,
        version: String,
        subdataset: Option<String>,
        attribute: String,
    },

    /// A version declared under `subdatasets` has no directory
    #[error(
        "Version '{version}' for dataset '{dataset}' not found in directory '{}'. Available versions: [{}]",
        path.display(),
        available.join(", ")
    )]
    VersionNotFound {
        dataset: String,
        version: String,
        path: PathBuf,
        available: Vec<String>,
    },

    /// Two entries resolve to the same (dataset, version, subdataset)
    #[error("Duplicate catalog entry for {}", location(dataset, version, subdataset.as_deref()))]
    DuplicateEntry {
        dataset: String,
        version: String,
        subdataset: Option<String>,
    },

    /// A row names a loader that is not registered
    #[error("Loader '{name}' is not registered. Registered loaders: {}", available.join(", "))]
    UnknownLoader { name: String, available: Vec<String> },
}

/// Errors raised while matching a query against the catalog index.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("No versions found for dataset '{dataset}'")]
    NoVersions { dataset: String },

    #[error("Version '{version}' not found for dataset '{dataset}'. Available versions: [{}]", available.join(", "))]
    UnknownVersion {
        dataset: String,
        version: String,
        available: Vec<String>,
    },

    /// No row matches the requested combination
    #[error("No dataset entry found for {}", location(dataset, version, subdataset.as_deref()))]
    NoEntry {
        dataset: String,
        version: String,
        subdataset: Option<String>,
    },

    #[error(
        "Subdataset '{subdataset}' not found for dataset '{dataset}', version '{version}'. Available subdatasets: [{}]",
        available.join(", ")
    )]
    SubdatasetNotFound {
        dataset: String,
        version: String,
        subdataset: String,
        available: Vec<String>,
    },

    /// A subdataset was requested from a dataset that defines none
    #[error("'subdataset' is not applicable for dataset '{dataset}'. This dataset does not define any subdatasets.")]
    SubdatasetsNotApplicable { dataset: String },

    #[error(
        "Multiple subdatasets found for dataset '{dataset}', version '{version}': [{}]. Please specify a subdataset to load.",
        available.join(", ")
    )]
    AmbiguousSubdataset {
        dataset: String,
        version: String,
        available: Vec<String>,
    },

    /// The index holds more than one row for a unique key
    #[error("Multiple entries ({count}) matched for dataset '{dataset}', version '{version}'; catalog rows should be unique")]
    DuplicateRows {
        dataset: String,
        version: String,
        count: usize,
    },

    /// Discovery and filtering left nothing to load
    #[error("No files found with extension '{extension}' in '{}'", root.display())]
    NoFilesFound { root: PathBuf, extension: String },
}

/// Errors raised when caller options do not fit an entry.
#[derive(Debug, Error)]
pub enum OptionError {
    /// `resolution` given for an entry without resolution metadata
    #[error("'resolution' is not applicable for dataset '{dataset}'. This dataset does not define any resolution metadata.")]
    ResolutionNotApplicable { dataset: String },

    /// `static` given for an entry without static patterns
    #[error("'static' is not applicable for dataset '{dataset}'. This dataset does not define any static patterns.")]
    StaticNotApplicable { dataset: String },

    #[error("This dataset defines multiple resolutions. You must explicitly specify a resolution (one of: {}).", available.join(", "))]
    ResolutionRequired { available: Vec<String> },

    #[error("A resolution was specified, but this dataset does not define any resolution metadata.")]
    ResolutionUndefined,

    #[error("This dataset defines static files. You must explicitly specify static=true or static=false.")]
    StaticRequired,

    #[error("Static data was requested, but this dataset does not define any static patterns.")]
    StaticUndefined,

    #[error("Mode '{mode}' not found in resolution metadata. Available modes: [{}]", available.join(", "))]
    ModeNotFound { mode: String, available: Vec<String> },

    #[error(
        "Resolution '{resolution}' not found for mode '{mode}' in resolution metadata. Available resolutions: [{}]",
        available.join(", ")
    )]
    ResolutionNotFound {
        resolution: String,
        mode: String,
        available: Vec<String>,
    },

    /// The loader reads static files only
    #[error("The '{loader}' loader only supports static files. To load annual files, use a time-aware loader.")]
    AnnualNotSupported { loader: String },
}

/// Errors raised by format dispatch and readers.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Extension '{extension}' is currently not supported for loading. Use one of: {}.", supported.join(", "))]
    UnsupportedExtension {
        extension: String,
        supported: Vec<String>,
    },

    /// A reader failed on one of the dataset's files. The dataset is named in
    /// the reader error's context.
    #[error(transparent)]
    Read(#[from] FormatReadError),

    /// No year could be taken from a file name
    #[error("No years found in file name '{}'", path.display())]
    NoYearInFileName { path: PathBuf },

    #[error("Cannot build time column: {message}")]
    TimeColumn { message: String },
}

/// Filesystem errors.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("Failed to list directory '{}': {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read '{}': {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Type alias for Results using `DataPoolError`.
pub type Result<T> = std::result::Result<T, DataPoolError>;

fn location(dataset: &str, version: &str, subdataset: Option<&str>) -> String {
    match subdataset {
        Some(subdataset) => {
            format!("dataset '{dataset}', version '{version}', subdataset '{subdataset}'")
        },
        None => format!("dataset '{dataset}', version '{version}'"),
    }
}

impl DataPoolError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Configuration,
            Self::Query(e) => match e {
                QueryError::AmbiguousSubdataset { .. } | QueryError::DuplicateRows { .. } => {
                    ErrorKind::Ambiguity
                },
                QueryError::SubdatasetsNotApplicable { .. } => ErrorKind::CapabilityMismatch,
                _ => ErrorKind::NotFound,
            },
            Self::Options(_) => ErrorKind::CapabilityMismatch,
            Self::Format(e) => match e {
                FormatError::UnsupportedExtension { .. } => ErrorKind::UnsupportedFormat,
                FormatError::Read(_) => ErrorKind::Io,
                FormatError::NoYearInFileName { .. } | FormatError::TimeColumn { .. } => {
                    ErrorKind::Other
                },
            },
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// True for an option that names structure the entry does not have.
    ///
    /// This is the case where a caller asks for a subdataset, a resolution or
    /// static files from an entry that defines none of them.
    #[must_use]
    pub fn is_not_applicable(&self) -> bool {
        matches!(
            self,
            Self::Query(QueryError::SubdatasetsNotApplicable { .. })
                | Self::Options(
                    OptionError::ResolutionNotApplicable { .. }
                        | OptionError::StaticNotApplicable { .. }
                )
        )
    }

    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Query(e) => e.to_string(),
            Self::Options(e) => format!("Invalid option: {e}"),
            Self::Format(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
            Self::Other(e) => format!("Error: {e:#}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Config(e) => e.recovery_suggestion(),
            Self::Query(e) => e.recovery_suggestion(),
            Self::Options(e) => e.recovery_suggestion(),
            Self::Format(FormatError::UnsupportedExtension { .. }) => Some(
                "Register a reader for this extension or assign the dataset a custom loader."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl ConfigError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::FileNotFound { .. } => {
                Some("Check the path passed with --config or DATAPOOL_CONFIG.".to_string())
            },
            Self::EnvNotSet { var } => Some(format!("Set {var} to the catalog YAML file.")),
            Self::MissingAttribute { .. } | Self::InvalidAttribute { .. } => {
                Some("Define the attribute in the catalog YAML.".to_string())
            },
            Self::VersionNotFound { .. } => Some(
                "Each version under 'subdatasets' must be a directory under the dataset path."
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl QueryError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::NoVersions { .. } => Some("Run 'datapool list' to see all datasets.".to_string()),
            Self::UnknownVersion { dataset, .. } | Self::NoEntry { dataset, .. } => {
                Some(format!("Run 'datapool versions {dataset}' to see its versions."))
            },
            Self::AmbiguousSubdataset { .. } | Self::SubdatasetNotFound { .. } => {
                Some("Pass --subdataset with one of the listed names.".to_string())
            },
            Self::SubdatasetsNotApplicable { .. } => Some("Omit --subdataset.".to_string()),
            Self::NoFilesFound { .. } => Some(
                "Check the dataset's extension, ignore rules and resolution/static options."
                    .to_string(),
            ),
            Self::DuplicateRows { .. } => None,
        }
    }
}

impl OptionError {
    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::ResolutionNotApplicable { .. } | Self::ResolutionUndefined => {
                Some("Omit --resolution.".to_string())
            },
            Self::StaticNotApplicable { .. } | Self::StaticUndefined => {
                Some("Omit --static.".to_string())
            },
            Self::ResolutionRequired { .. } | Self::ResolutionNotFound { .. } => {
                Some("Run 'datapool resolutions <DATASET>' to see valid resolutions.".to_string())
            },
            Self::StaticRequired => Some("Pass --static true or --static false.".to_string()),
            Self::ModeNotFound { .. } | Self::AnnualNotSupported { .. } => None,
        }
    }
}

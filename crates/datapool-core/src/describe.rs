//! Text description of what the catalog holds, for the `describe` command.

use std::fmt;

/// What `describe` found, at the level of detail that was asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogDescription {
    /// All dataset names.
    Datasets(Vec<String>),
    /// The versions of one dataset.
    Versions {
        dataset: String,
        versions: Vec<String>,
    },
    /// One dataset version and the options it accepts.
    Version(VersionDescription),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDescription {
    pub dataset: String,
    pub versions: Vec<String>,
    pub version: String,
    /// Sorted subdataset names; empty when the version has none.
    pub subdatasets: Vec<String>,
    pub accepts_resolution: bool,
    pub accepts_static: bool,
}

impl VersionDescription {
    /// A `datapool load` command line using every option this version accepts.
    #[must_use]
    pub fn example(&self) -> String {
        let mut example = format!("datapool load {} --version {}", self.dataset, self.version);
        if !self.subdatasets.is_empty() {
            example.push_str(" --subdataset <NAME>");
        }
        if self.accepts_resolution {
            example.push_str(" --resolution <RESOLUTION>");
        }
        if self.accepts_static {
            example.push_str(" --static true");
        }
        example
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[String]) -> fmt::Result {
    for item in items {
        writeln!(f, "  - {item}")?;
    }
    Ok(())
}

impl fmt::Display for CatalogDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogDescription::Datasets(datasets) => {
                writeln!(f, "Available datasets:")?;
                write_list(f, datasets)
            },
            CatalogDescription::Versions { dataset, versions } => {
                writeln!(f, "Dataset: {dataset}")?;
                writeln!(f, "\nAvailable versions:")?;
                write_list(f, versions)?;
                writeln!(f, "\nTip:")?;
                writeln!(
                    f,
                    "  Use `datapool describe {dataset} --version <VERSION>` for more details."
                )
            },
            CatalogDescription::Version(detail) => {
                writeln!(f, "Dataset: {}", detail.dataset)?;
                writeln!(f, "\nAvailable versions:")?;
                write_list(f, &detail.versions)?;
                writeln!(f, "\nVersion: {}", detail.version)?;
                if detail.subdatasets.is_empty() {
                    writeln!(f, "\nAvailable subdatasets: none")?;
                } else {
                    writeln!(f, "\nAvailable subdatasets:")?;
                    write_list(f, &detail.subdatasets)?;
                }
                writeln!(f, "\nSupported catalog keywords:")?;
                writeln!(f, "  - subdataset : {}", yes_no(!detail.subdatasets.is_empty()))?;
                writeln!(f, "  - resolution : {}", yes_no(detail.accepts_resolution))?;
                writeln!(f, "  - static     : {}", yes_no(detail.accepts_static))?;
                writeln!(f, "\nExample usage:")?;
                writeln!(f, "  {}", detail.example())
            },
        }
    }
}

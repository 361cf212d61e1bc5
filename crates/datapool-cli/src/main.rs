//! Command-line interface for `DataPool`, a metadata-driven catalog of
//! versioned geoscience datasets.
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for
//! structured logging. It parses arguments, configures logging, opens the
//! catalog named by `--config` or `DATAPOOL_CONFIG`, and delegates to the
//! [`datapool_core`] library.
//!
//! # Available Commands
//!
//! - `list` - List every catalog entry
//! - `search` - Find entries by name, display name or tag
//! - `versions` / `latest` - Show the versions of a dataset
//! - `subdatasets` / `resolutions` - Show optional structure of a dataset version
//! - `describe` - Summarise the catalog, a dataset or a dataset version
//! - `load` - Load a dataset entry, preview it or export it as CSV
//! - `formats` - List the file formats the catalog knows about

mod display;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use datapool_core::formats::get_formats;
use datapool_core::{Availability, CONFIG_ENV_VAR, DataCatalog, DataPoolError, LoadOptions};

#[derive(Parser)]
#[command(
    name = "datapool",
    version,
    about = "Catalog, version and load geoscience datasets",
    long_about = "DataPool indexes versioned datasets described in a YAML catalog and loads them\n\
                  by name, version, subdataset, resolution and static/annual mode."
)]
/// Command-line arguments and options for the `DataPool` CLI.
struct Cli {
    /// Catalog configuration file.
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists every catalog entry.
    List,

    /// Lists entries whose name, display name or tags contain any keyword.
    Search {
        /// Case-insensitive keywords.
        #[arg(value_name = "KEYWORD")]
        keywords: Vec<String>,
    },

    /// Lists the versions of a dataset.
    Versions {
        #[arg(value_name = "DATASET")]
        dataset: String,
    },

    /// Prints the latest version of a dataset.
    Latest {
        #[arg(value_name = "DATASET")]
        dataset: String,
    },

    /// Lists the subdatasets of a dataset version (latest by default).
    Subdatasets {
        #[arg(value_name = "DATASET")]
        dataset: String,

        #[arg(long)]
        version: Option<String>,
    },

    /// Shows the resolution metadata of a dataset version (latest by default).
    Resolutions {
        #[arg(value_name = "DATASET")]
        dataset: String,

        #[arg(long)]
        version: Option<String>,

        #[arg(long)]
        subdataset: Option<String>,
    },

    /// Describes the catalog, a dataset, or one dataset version.
    Describe {
        #[arg(value_name = "DATASET")]
        dataset: Option<String>,

        #[arg(long, requires = "dataset")]
        version: Option<String>,
    },

    /// Loads a dataset entry.
    ///
    /// Prints the schema and the first records, or writes the records to a
    /// CSV file with `--output`.
    Load {
        #[arg(value_name = "DATASET")]
        dataset: String,

        /// Version to load; the latest when omitted.
        #[arg(long)]
        version: Option<String>,

        #[arg(long)]
        subdataset: Option<String>,

        /// Resolution label, for datasets with resolution metadata.
        #[arg(long)]
        resolution: Option<String>,

        /// `true` for static files, `false` for annual files.
        #[arg(long = "static", value_name = "BOOL")]
        static_files: Option<bool>,

        /// Loader-specific option, repeatable.
        #[arg(long = "option", value_name = "KEY=VALUE", value_parser = parse_key_value)]
        options: Vec<(String, String)>,

        /// Number of records to preview.
        #[arg(long, default_value_t = 10)]
        head: usize,

        /// Write the loaded records to this CSV file instead of previewing them.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Lists the file formats the catalog knows about.
    Formats,
}

fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(anyhow!("option key must not be empty in '{raw}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Entry point for the `DataPool` command-line interface.
fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("Error: failed to initialise logging: {e:#}");
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        },
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn report(error: &anyhow::Error) {
    match error.downcast_ref::<DataPoolError>() {
        Some(e) => {
            eprintln!("Error: {}", e.user_message());
            if let Some(hint) = e.recovery_suggestion() {
                eprintln!("Hint: {hint}");
            }
        },
        None => eprintln!("Error: {error:#}"),
    }
}

fn open_catalog(config: Option<PathBuf>) -> Result<DataCatalog> {
    let catalog = match config {
        Some(path) => DataCatalog::from_path(path)?,
        None => DataCatalog::from_env()?,
    };
    debug!("Catalog has {} entries", catalog.len());
    Ok(catalog)
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Formats = cli.command {
        display::display_formats(&get_formats());
        return Ok(());
    }

    let catalog = open_catalog(cli.config)?;

    match cli.command {
        Commands::List => display::display_entries(catalog.rows()),
        Commands::Search { keywords } => {
            info!("Searching for {keywords:?}");
            display::display_entries(catalog.search(&keywords).rows());
        },
        Commands::Versions { dataset } => {
            for version in catalog.available_versions(&dataset)? {
                println!("{version}");
            }
        },
        Commands::Latest { dataset } => println!("{}", catalog.latest_version(&dataset)?),
        Commands::Subdatasets { dataset, version } => {
            match catalog.available_subdatasets(&dataset, version.as_deref())? {
                Availability::Available(names) => {
                    for name in names {
                        println!("{name}");
                    }
                },
                Availability::Undefined(notice) => println!("{notice}"),
            }
        },
        Commands::Resolutions {
            dataset,
            version,
            subdataset,
        } => {
            let resolutions = catalog.available_resolutions(
                &dataset,
                version.as_deref(),
                subdataset.as_deref(),
            )?;
            match resolutions {
                Availability::Available(resolutions) => display::display_resolutions(&resolutions),
                Availability::Undefined(notice) => println!("{notice}"),
            }
        },
        Commands::Describe { dataset, version } => {
            print!("{}", catalog.describe(dataset.as_deref(), version.as_deref())?);
        },
        Commands::Load {
            dataset,
            version,
            subdataset,
            resolution,
            static_files,
            options,
            head,
            output,
        } => {
            let mut load_options = LoadOptions {
                resolution,
                static_files,
                ..LoadOptions::default()
            };
            for (key, value) in options {
                load_options = load_options.with_extra(key, value);
            }

            info!("Loading {dataset}");
            let data = catalog.load_dataset(
                &dataset,
                version.as_deref(),
                subdataset.as_deref(),
                &load_options,
            )?;

            match output {
                Some(path) => {
                    display::write_csv(&data, &path)?;
                    println!("Wrote {} records to {}", data.num_rows(), path.display());
                },
                None => display::display_loaded(&data, head)?,
            }
        },
        Commands::Formats => {},
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_options_parse() {
        assert_eq!(
            parse_key_value("variable=speed").unwrap(),
            ("variable".to_string(), "speed".to_string())
        );
        assert_eq!(
            parse_key_value("expr=a=b").unwrap(),
            ("expr".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn static_flag_takes_a_value() {
        let cli = Cli::try_parse_from(["datapool", "load", "velocity", "--static", "false"]).unwrap();
        match cli.command {
            Commands::Load { static_files, .. } => assert_eq!(static_files, Some(false)),
            _ => panic!("expected load"),
        }
    }
}

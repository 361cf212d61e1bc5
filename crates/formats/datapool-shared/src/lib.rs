//! Types shared by the `DataPool` format readers.
//!
//! Reader crates report failures through [`FormatReadError`] and substitute
//! declared missing-value sentinels through [`NoDataValue`]. Keeping both here
//! lets `datapool-core` depend on the readers without the readers depending on
//! the core.

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A position within a source file, such as a CSV record.
///
/// All indices are 1-based where possible to align with human expectations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePosition {
    /// Line number in the source (1-based)
    pub line: Option<u64>,
    /// Column (field) number in the source (1-based)
    pub column: Option<u64>,
    /// Logical record number reported by the parser
    pub record: Option<u64>,
}

impl SourcePosition {
    /// Returns true when the position does not contain any location metadata.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.line.is_none() && self.column.is_none() && self.record.is_none()
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();

        if let Some(line) = self.line {
            parts.push(format!("line {line}"));
        }
        if let Some(column) = self.column {
            parts.push(format!("column {column}"));
        }
        if let Some(record) = self.record {
            parts.push(format!("record {record}"));
        }

        if parts.is_empty() {
            write!(f, "unknown position")
        } else {
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Errors that can occur while reading a data file into memory.
#[derive(Debug)]
pub enum FormatReadError {
    /// An underlying I/O failure occurred.
    Io {
        /// The originating error.
        source: std::io::Error,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// Parsing failed for the input source.
    Parse {
        /// Human readable description of the failure.
        message: String,
        /// Optional position describing where the failure occurred.
        position: Option<SourcePosition>,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// Schema inference or unification failed.
    Schema {
        /// Human readable description of the failure.
        message: String,
        /// Optional context describing what was being read.
        context: Option<String>,
    },
    /// Other error type not classified above.
    Other {
        /// Human readable description of the failure.
        message: String,
    },
}

impl FormatReadError {
    /// Wrap an I/O error with the path or label that was being read.
    #[must_use]
    pub fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        FormatReadError::Io {
            source,
            context: Some(context.into()),
        }
    }

    fn fmt_context(context: Option<&str>) -> String {
        context
            .map(|c| format!(" while reading {c}"))
            .unwrap_or_default()
    }

    fn fmt_position(position: Option<&SourcePosition>) -> String {
        position
            .filter(|pos| !pos.is_empty())
            .map(|pos| format!(" at {pos}"))
            .unwrap_or_default()
    }

    /// Attach additional context to the error, returning the updated error.
    #[must_use]
    pub fn with_additional_context(mut self, context: impl Into<String>) -> Self {
        let context = context.into();
        match &mut self {
            FormatReadError::Io {
                context: existing, ..
            }
            | FormatReadError::Parse {
                context: existing, ..
            }
            | FormatReadError::Schema {
                context: existing, ..
            } => match existing {
                Some(existing) if !existing.is_empty() => {
                    existing.push_str("; ");
                    existing.push_str(&context);
                },
                _ => *existing = Some(context),
            },
            FormatReadError::Other { message } => {
                message.push_str(" (");
                message.push_str(&context);
                message.push(')');
            },
        }
        self
    }
}

impl fmt::Display for FormatReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatReadError::Io { source, context } => {
                write!(
                    f,
                    "I/O error{}: {source}",
                    Self::fmt_context(context.as_deref())
                )
            },
            FormatReadError::Parse {
                message,
                position,
                context,
            } => write!(
                f,
                "Parse error{}{}: {message}",
                Self::fmt_context(context.as_deref()),
                Self::fmt_position(position.as_ref())
            ),
            FormatReadError::Schema { message, context } => write!(
                f,
                "Schema error{}: {message}",
                Self::fmt_context(context.as_deref())
            ),
            FormatReadError::Other { message } => f.write_str(message),
        }
    }
}

impl StdError for FormatReadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            FormatReadError::Io { source, .. } => Some(source),
            FormatReadError::Parse { .. }
            | FormatReadError::Schema { .. }
            | FormatReadError::Other { .. } => None,
        }
    }
}

/// Result type alias that uses [`FormatReadError`].
pub type FormatResult<T> = Result<T, FormatReadError>;

/// Sentinel value a dataset uses in place of missing data.
///
/// Declared in the catalog as either a number (`-9999`, `-3.4e38`) or a
/// string (`"NA"`). Readers replace matching cells with nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoDataValue {
    /// Integer sentinel.
    Integer(i64),
    /// Floating point sentinel.
    Float(f64),
    /// Textual sentinel, compared exactly.
    Text(String),
}

impl NoDataValue {
    /// Numeric form of the sentinel, if it has one.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NoDataValue::Integer(value) => Some(*value as f64),
            NoDataValue::Float(value) => Some(*value),
            NoDataValue::Text(_) => None,
        }
    }

    /// Returns true when a raw text cell holds the sentinel.
    ///
    /// Numeric sentinels match any cell that parses to the same number, so
    /// `-9999`, `-9999.0` and ` -9999 ` all match `Integer(-9999)`.
    #[must_use]
    pub fn matches_text(&self, raw: &str) -> bool {
        let raw = raw.trim();
        match self {
            NoDataValue::Text(text) => raw == text,
            numeric => raw
                .parse::<f64>()
                .ok()
                .zip(numeric.as_f64())
                .is_some_and(|(cell, sentinel)| same_number(cell, sentinel)),
        }
    }

    /// Returns true when a parsed number equals the sentinel.
    #[must_use]
    pub fn matches_f64(&self, value: f64) -> bool {
        self.as_f64()
            .is_some_and(|sentinel| same_number(value, sentinel))
    }
}

impl fmt::Display for NoDataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataValue::Integer(value) => write!(f, "{value}"),
            NoDataValue::Float(value) => write!(f, "{value}"),
            NoDataValue::Text(value) => write!(f, "{value:?}"),
        }
    }
}

#[allow(clippy::float_cmp)]
fn same_number(a: f64, b: f64) -> bool {
    // NaN sentinels are matched by NaN cells.
    (a.is_nan() && b.is_nan()) || a == b
}

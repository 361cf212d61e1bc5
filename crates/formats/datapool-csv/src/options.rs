//! CSV read configuration.

use datapool_shared::NoDataValue;

/// CSV read options
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Whether the CSV file has a header row (default: true)
    pub has_header: bool,
    /// The delimiter character (default: b',')
    pub delimiter: u8,
    /// Number of raw lines to drop before the header (default: 0)
    pub skip_lines: usize,
    /// Maximum number of rows to sample for type inference (default: all).
    /// Cells past the sample that do not fit the inferred type fail the read.
    pub schema_infer_max_rec: Option<usize>,
    /// Sentinel replaced with nulls (default: none)
    pub no_data: Option<NoDataValue>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            delimiter: b',',
            skip_lines: 0,
            schema_infer_max_rec: None,
            no_data: None,
        }
    }
}

impl CsvReadOptions {
    /// Create new CSV read options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the CSV has a header row
    #[must_use]
    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the delimiter character
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the number of leading lines to skip
    #[must_use]
    pub fn with_skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = skip_lines;
        self
    }

    /// Set maximum records for schema inference
    #[must_use]
    pub fn with_schema_infer_max_rec(mut self, max_rec: Option<usize>) -> Self {
        self.schema_infer_max_rec = max_rec;
        self
    }

    /// Set the no-data sentinel
    #[must_use]
    pub fn with_no_data(mut self, no_data: Option<NoDataValue>) -> Self {
        self.no_data = no_data;
        self
    }

    /// Returns true when `raw` should be read as a null cell.
    pub(crate) fn is_missing(&self, raw: &str) -> bool {
        raw.trim().is_empty()
            || self
                .no_data
                .as_ref()
                .is_some_and(|sentinel| sentinel.matches_text(raw))
    }
}

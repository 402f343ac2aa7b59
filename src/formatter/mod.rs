//! Output formatting for command results
//!
//! Renders service results in the configured format:
//! - JSON formatting (plain and pretty-printed)
//! - Table formatting for typed rows and text lines

pub mod json;
pub mod table;

use serde::Serialize;
use tabled::Tabled;

use crate::config::{DisplayConfig, OutputFormat};
use crate::error::Result;

pub use json::JsonFormatter;
pub use table::{EMPTY_RESULT, TableFormatter};

/// Main formatter for command results
pub struct Formatter {
    /// Output format type
    format_type: OutputFormat,

    /// Table renderer used by table output
    table: TableFormatter,
}

impl Formatter {
    /// Create a new formatter
    ///
    /// # Arguments
    /// * `format_type` - Output format type
    pub fn new(format_type: OutputFormat) -> Self {
        Self {
            format_type,
            table: TableFormatter::new(),
        }
    }

    /// Create a formatter from display configuration
    pub fn from_config(config: &DisplayConfig) -> Self {
        Self {
            format_type: config.format,
            table: TableFormatter::from_config(config),
        }
    }

    /// Current output format
    pub fn format_type(&self) -> OutputFormat {
        self.format_type
    }

    /// Format a list of rows
    ///
    /// # Arguments
    /// * `rows` - Rows to render
    ///
    /// # Returns
    /// * `Result<String>` - Formatted output or error
    pub fn format_rows<T>(&self, rows: &[T]) -> Result<String>
    where
        T: Serialize + Tabled,
    {
        match self.format_type {
            OutputFormat::Json => JsonFormatter::new(false).format(rows),
            OutputFormat::JsonPretty => JsonFormatter::new(true).format(rows),
            OutputFormat::Table => Ok(self.table.format_rows(rows)),
        }
    }

    /// Format a single row
    pub fn format_record<T>(&self, row: &T) -> Result<String>
    where
        T: Serialize + Tabled,
    {
        match self.format_type {
            OutputFormat::Json => JsonFormatter::new(false).format(row),
            OutputFormat::JsonPretty => JsonFormatter::new(true).format(row),
            OutputFormat::Table => Ok(self.table.format_rows(std::slice::from_ref(row))),
        }
    }

    /// Format a row that may be absent
    ///
    /// JSON output prints `null` for a missing row.
    pub fn format_optional<T>(&self, row: Option<&T>) -> Result<String>
    where
        T: Serialize + Tabled,
    {
        match (self.format_type, row) {
            (_, Some(row)) => self.format_record(row),
            (OutputFormat::Table, None) => Ok(EMPTY_RESULT.to_string()),
            (_, None) => Ok("null".to_string()),
        }
    }

    /// Format preformatted text lines
    ///
    /// # Arguments
    /// * `header` - Column header used by table output
    /// * `lines` - Lines to render
    pub fn format_lines(&self, header: &str, lines: &[String]) -> Result<String> {
        match self.format_type {
            OutputFormat::Json => JsonFormatter::new(false).format(lines),
            OutputFormat::JsonPretty => JsonFormatter::new(true).format(lines),
            OutputFormat::Table => Ok(self.table.format_lines(header, lines)),
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

//! Export configuration that callers can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::{ColumnDescriptor, Schema};

pub const DEFAULT_ROW_DELIMITER: &str = "\n";
pub const DEFAULT_COLUMN_DELIMITER: &str = ";";
/// Queue depth of the input port before writers are told to pause.
pub const DEFAULT_HIGH_WATER_MARK: usize = 16;
/// Largest queue depth the stream bridge can allocate (tokio's semaphore permit limit).
pub const MAX_HIGH_WATER_MARK: usize = usize::MAX >> 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Ordered columns; defines field count, order and coercion per line.
    pub columns: Vec<ColumnDescriptor>,

    /// Terminator appended to every line, the header included.
    #[serde(default = "default_row_delimiter")]
    pub row_delimiter: String,

    /// Field separator.
    #[serde(default = "default_column_delimiter")]
    pub column_delimiter: String,

    /// Emit a header line of column names before the first data line.
    #[serde(default)]
    pub show_headers: bool,

    /// Records the input port buffers before it signals "pause".
    #[serde(default = "default_high_water_mark")]
    pub high_water_mark: usize,
}

fn default_row_delimiter() -> String {
    DEFAULT_ROW_DELIMITER.to_string()
}

fn default_column_delimiter() -> String {
    DEFAULT_COLUMN_DELIMITER.to_string()
}

fn default_high_water_mark() -> usize {
    DEFAULT_HIGH_WATER_MARK
}

impl ExportConfig {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            columns,
            row_delimiter: default_row_delimiter(),
            column_delimiter: default_column_delimiter(),
            show_headers: false,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }

    pub fn with_row_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.row_delimiter = delimiter.into();
        self
    }

    pub fn with_column_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.column_delimiter = delimiter.into();
        self
    }

    pub fn with_headers(mut self, show_headers: bool) -> Self {
        self.show_headers = show_headers;
        self
    }

    pub fn with_high_water_mark(mut self, high_water_mark: usize) -> Self {
        self.high_water_mark = high_water_mark;
        self
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Override fields from environment variables. Unparseable values are ignored.
    ///
    /// Environment variables:
    /// - `ROWCAST_ROW_DELIMITER`: row terminator (`\n`, `\r\n` and `\t` escapes are understood)
    /// - `ROWCAST_COLUMN_DELIMITER`: field separator (same escapes)
    /// - `ROWCAST_SHOW_HEADERS`: `true`/`false`/`1`/`0`
    /// - `ROWCAST_HIGH_WATER_MARK`: input queue depth
    pub fn apply_env(mut self) -> Self {
        if let Ok(s) = std::env::var("ROWCAST_ROW_DELIMITER") {
            self.row_delimiter = unescape(&s);
        }

        if let Ok(s) = std::env::var("ROWCAST_COLUMN_DELIMITER") {
            self.column_delimiter = unescape(&s);
        }

        if let Ok(s) = std::env::var("ROWCAST_SHOW_HEADERS") {
            match s.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.show_headers = true,
                "0" | "false" | "no" => self.show_headers = false,
                _ => {}
            }
        }

        if let Ok(s) = std::env::var("ROWCAST_HIGH_WATER_MARK") {
            if let Ok(v) = s.trim().parse::<usize>() {
                self.high_water_mark = v;
            }
        }

        self
    }

    /// Check the whole configuration and produce the validated schema.
    pub fn validate(&self) -> Result<Schema> {
        if self.column_delimiter.is_empty() {
            return Err(Error::Config("column_delimiter must not be empty".into()));
        }
        if self.row_delimiter.is_empty() {
            return Err(Error::Config("row_delimiter must not be empty".into()));
        }
        if self.high_water_mark == 0 {
            return Err(Error::Config("high_water_mark must be at least 1".into()));
        }
        if self.high_water_mark > MAX_HIGH_WATER_MARK {
            return Err(Error::Config(format!(
                "high_water_mark must be at most {MAX_HIGH_WATER_MARK}"
            )));
        }
        Schema::new(self.columns.clone())
    }
}

fn unescape(s: &str) -> String {
    s.replace("\\r", "\r").replace("\\n", "\n").replace("\\t", "\t")
}

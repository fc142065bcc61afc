use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and ingestion errors. All of them are raised synchronously,
/// before any line is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid configuration: schema has no columns")]
    EmptySchema,

    #[error("Invalid configuration: column #{0} has an empty name")]
    EmptyColumnName(usize),

    #[error("Invalid configuration: duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("Invalid configuration: unknown column type '{0}' (expected string, number, boolean or date)")]
    UnknownColumnType(String),

    #[error("Record error: {0}")]
    Record(String),
}

impl Error {
    /// True for every error raised while validating an `ExportConfig`.
    pub fn is_config(&self) -> bool {
        !matches!(self, Error::Record(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Error::Config(e.to_string())
    }
}

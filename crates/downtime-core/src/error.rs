use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the downtime monitor.
#[derive(Error, Debug)]
pub enum DowntimeError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// Shift configuration (work hours, timezone) is missing or malformed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A raw record could not be converted into a typed snapshot or event.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The snapshot file does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the downtime crates.
pub type Result<T> = std::result::Result<T, DowntimeError>;

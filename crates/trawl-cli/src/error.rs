//! CLI error types.

use thiserror::Error;
use trawl_core::ReaderError;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Flags that cannot be combined, or a missing backend.
    #[error("{0}")]
    Usage(String),

    /// A `--since`/`--until` value that is not a time expression.
    #[error("failed to parse time '{0}'")]
    InvalidTime(String),

    /// Output formatting error.
    #[error("format error: {0}")]
    Format(String),

    /// Error from the log reader.
    #[error(transparent)]
    Reader(#[from] ReaderError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

//! Configuration Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// An explicitly requested config file doesn't exist.
    #[display("config file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// The config file extension isn't one of toml, yaml, yml or json.
    #[display("unsupported config file format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// A layer could not be parsed or merged.
    #[display("could not load configuration")]
    Load,
    /// Loaded fine, but a value is unusable.
    #[display("invalid configuration value for '{field}': {reason}")]
    Invalid {
        field: &'static str,
        #[error(not(source))]
        reason: String,
    },
    /// Nothing told us where the archive is.
    #[display("no archive configured (use --archive, SHOEBOX_ARCHIVE or the config file)")]
    MissingArchive,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

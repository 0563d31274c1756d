//! Library Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of a library failure.
///
/// ### Operational Errors
/// - [`ErrorKind::NoSuchList`], [`ErrorKind::UnknownList`]
/// - [`ErrorKind::NoPatterns`]
/// - [`ErrorKind::OutputDirectory`]
/// - [`ErrorKind::InvalidPath`]
///
/// ### Dependency Errors
/// - [`ErrorKind::Catalog`]
/// - [`ErrorKind::Storage`]
/// - [`ErrorKind::Metadata`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A named list that a command consumes does not exist.
    #[display("No such list {_0}")]
    NoSuchList(#[error(not(source))] String),
    /// An input of a list combination does not exist.
    #[display("Unknown list {_0}")]
    UnknownList(#[error(not(source))] String),
    /// Every pattern given to a match failed to compile.
    #[display("No patterns")]
    NoPatterns,
    /// The target of a move could not be created.
    #[display("Unable to create output directory {_0}")]
    OutputDirectory(#[error(not(source))] String),
    /// A path can't be stored in (or recovered from) the catalog.
    #[display("invalid path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    /// The catalog could not be read or written.
    #[display("catalog error")]
    Catalog,
    /// A filesystem operation failed.
    #[display("storage error")]
    Storage,
    /// Metadata could not be read from a file.
    #[display("metadata error")]
    Metadata,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Catalog | Self::Storage)
    }
}

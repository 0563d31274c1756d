//! Metadata Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::io::Error as IoError;
use std::path::PathBuf;

/// A metadata extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for metadata extraction.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// A file that can't be *read* is an [`Io`](ErrorKind::Io) problem; a file
/// that was read but whose contents make no sense is a
/// [`Parse`](ErrorKind::Parse) or
/// [`UnsupportedFormat`](ErrorKind::UnsupportedFormat) problem.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file could not be opened or read.
    #[display("I/O error: {_0}")]
    Io(IoError),
    /// The container was recognised but its structure is broken.
    #[display("failed to parse {format} metadata: {reason}")]
    Parse {
        /// Which container parser gave up.
        format: &'static str,
        /// What it tripped over.
        reason: String,
    },
    /// None of the supported container formats match the file.
    #[display("unsupported file format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
}
impl From<IoError> for ErrorKind {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}
impl ErrorKind {
    pub(crate) fn parse(format: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse { format, reason: reason.into() }
    }

    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Bytes on disk don't change their mind, only the reading of them can.
        matches!(self, Self::Io(_))
    }
}

//! Ingestion of source trees into the archive.
//!
//! [`collect`] walks each root depth-first (entries in sorted order, symlinks
//! never followed) and yields one [`Visit`] per directory or file it meets.
//! A recognised file that has not been catalogued yet has its capture date
//! read, is copied into its dated archive directory while being hashed, and
//! is then recorded in the catalog. Per-file failures are reported as
//! [`Visit::Failed`] and never stop the walk.
//!
//! [`run`] drives the stream to completion, logging a [`Report`](crate::Report)
//! as it goes.

mod file;
mod stream;

use crate::error::Error;
use shoebox_catalog::PhotoRecord;
use std::path::PathBuf;

pub use self::file::ingest_file;
pub use self::stream::{collect, run};

/// What happened at one entry of the walk.
#[derive(Debug)]
pub enum Visit {
    /// A directory was listed and its children queued.
    DirectoryEntered(PathBuf),
    /// The archive itself turned up inside a source tree; its subtree is not
    /// walked.
    DirectorySkipped(PathBuf),
    /// A directory could not be listed.
    DirectoryFailed { path: PathBuf, error: Error },
    /// The file was copied into the archive and catalogued.
    Ingested { record: Box<PhotoRecord>, bytes: u64 },
    Skipped { path: PathBuf, reason: SkipReason },
    /// Something went wrong with this file; nothing was catalogued for it.
    Failed { path: PathBuf, error: Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The catalog already has a record for this path.
    AlreadyCatalogued,
    UnrecognisedExtension,
    /// No metadata directory, or the first one carries no capture date.
    NoCaptureDate,
    /// Symlinks, sockets, devices...
    NotRegularFile,
}

/// Progress events emitted by [`collect`].
///
/// [`Started`](Self::Started) comes first and [`Complete`](Self::Complete)
/// last, each exactly once. Every root ends with a
/// [`RootComplete`](Self::RootComplete), even when it could not be read.
#[derive(Debug)]
pub enum CollectEvent {
    Started,
    Visited(Visit),
    RootComplete(PathBuf),
    Complete,
}

//! Ingestion, list algebra and file lifecycle for the shoebox archive.
//!
//! - [`collect`] walks source trees and copies dated media into the archive,
//!   recording each copy in the catalog.
//! - [`Session`] holds named lists of catalog records built by pattern
//!   matches and combined by union and intersection.
//! - [`lifecycle`] moves or deletes the original files behind a list.
//! - [`Commands`] is the human-facing surface over all of the above.

pub mod collect;
mod commands;
pub mod destination;
pub mod error;
pub mod lifecycle;
mod lists;
mod report;

use shoebox_catalog::Repository;
use shoebox_metadata::MetadataExtractor;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use crate::collect::{CollectEvent, SkipReason, Visit};
pub use crate::commands::Commands;
pub use crate::lists::{Session, compile_patterns, match_path, match_tag};
pub use crate::report::{Report, Tally, group_digits};

/// Default number of copied files between progress reports.
pub const DEFAULT_PROGRESS_EVERY: u64 = 100;

/// Everything an ingestion run needs.
#[derive(Clone)]
pub struct Context {
    /// Archive root; must already exist and be canonical so that the walk can
    /// recognise (and skip) it.
    pub archive: PathBuf,
    pub catalog: Repository,
    pub extractor: Arc<dyn MetadataExtractor>,
    /// Lowercase extensions, without the dot.
    pub extensions: BTreeSet<String>,
    pub progress_every: u64,
}
impl Context {
    /// Whether the file's extension (after the last dot, any case) is one of
    /// the recognised media extensions.
    pub fn recognises(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, extension)| extension.to_lowercase())
            .is_some_and(|extension| !extension.is_empty() && self.extensions.contains(&extension))
    }
}
impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("archive", &self.archive)
            .field("extensions", &self.extensions)
            .field("progress_every", &self.progress_every)
            .finish_non_exhaustive()
    }
}

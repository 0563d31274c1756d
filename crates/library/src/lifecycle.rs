//! Moving and deleting the originals behind a list.
//!
//! Both operations act on each record's *original* path and drop the record
//! from the catalog only once the filesystem side has succeeded, so a
//! failure leaves that record in place. Failures are logged and counted in
//! the returned [`Tally`]; they never stop the batch.

use crate::Tally;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use shoebox_catalog::{PhotoRecord, Repository};
use shoebox_storage::{fs, strip_components};
use std::path::{Path, PathBuf};

/// Leading path names dropped from an original path to find its place under
/// the output directory, e.g. `/mnt/card/DCIM/a.jpg` goes to `DCIM/a.jpg`.
pub const STRIPPED_COMPONENTS: usize = 2;

/// Where `original` goes when moved into `output_dir`.
pub fn relocated(original: &str, output_dir: &Path) -> Result<PathBuf> {
    let relative = strip_components(original, STRIPPED_COMPONENTS).or_raise(|| ErrorKind::InvalidPath(original.into()))?;
    Ok(output_dir.join(relative))
}

/// Moves every original in `records` into `output_dir`, keeping the path
/// below its first two components, then forgets it in the catalog.
///
/// `output_dir` is created first; if that fails nothing is touched and
/// [`ErrorKind::OutputDirectory`] is returned. Existing files at a target are
/// replaced.
pub async fn move_files(catalog: &Repository, records: &[PhotoRecord], output_dir: &Path) -> Result<Tally> {
    fs::create_dir_all(output_dir)
        .await
        .or_raise(|| ErrorKind::OutputDirectory(output_dir.display().to_string()))?;
    let mut tally = Tally::default();
    for record in records {
        let moved = async {
            let target = relocated(&record.original_path, output_dir)?;
            fs::move_file(Path::new(&record.original_path), &target).await.or_raise(|| ErrorKind::Storage)?;
            forget(catalog, record).await
        };
        match moved.await {
            Ok(()) => tally.succeeded += 1,
            Err(e) => {
                tracing::warn!(path = %record.original_path, error = %e, "Unable to move");
                tally.failed += 1;
            },
        }
    }
    Ok(tally)
}

/// Deletes every original in `records`, then forgets it in the catalog.
pub async fn delete_files(catalog: &Repository, records: &[PhotoRecord]) -> Tally {
    let mut tally = Tally::default();
    for record in records {
        let deleted = async {
            fs::delete_file(Path::new(&record.original_path)).await.or_raise(|| ErrorKind::Storage)?;
            forget(catalog, record).await
        };
        match deleted.await {
            Ok(()) => tally.succeeded += 1,
            Err(e) => {
                tracing::warn!(path = %record.original_path, error = %e, "Unable to delete");
                tally.failed += 1;
            },
        }
    }
    tally
}

async fn forget(catalog: &Repository, record: &PhotoRecord) -> Result<()> {
    if !catalog.delete(&record.original_path).await.or_raise(|| ErrorKind::Catalog)? {
        tracing::debug!(path = %record.original_path, "Already gone from the catalog");
    }
    Ok(())
}

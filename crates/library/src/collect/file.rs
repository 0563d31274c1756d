use crate::Context;
use crate::collect::{SkipReason, Visit};
use crate::destination;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use shoebox_catalog::PhotoRecord;
use shoebox_storage::{copy_hashed, fs};
use std::path::Path;
use std::sync::Arc;

/// Ingests a single regular file.
///
/// Returns the [`Visit`] describing what happened to it; an `Err` means the
/// file failed and nothing was recorded for it. When the catalog refuses the
/// new record, the copy that was just made is removed again.
pub async fn ingest_file(ctx: &Context, path: &Path, overwrite: bool) -> Result<Visit> {
    let skipped = |reason| Visit::Skipped {
        path: path.to_path_buf(),
        reason,
    };
    let key = path.to_str().ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
    if !overwrite && ctx.catalog.contains(key).await.or_raise(|| ErrorKind::Catalog)? {
        return Ok(skipped(SkipReason::AlreadyCatalogued));
    }
    if !ctx.recognises(path) {
        return Ok(skipped(SkipReason::UnrecognisedExtension));
    }

    let extractor = Arc::clone(&ctx.extractor);
    let owned = path.to_path_buf();
    let directories = tokio::task::spawn_blocking(move || extractor.extract(&owned))
        .await
        .or_raise(|| ErrorKind::Metadata)?
        .or_raise(|| ErrorKind::Metadata)?;
    // Only the first directory counts, dated or not.
    let Some(directory) = directories.into_iter().next() else {
        return Ok(skipped(SkipReason::NoCaptureDate));
    };
    let Some(captured) = directory.capture_date() else {
        tracing::debug!(path = %path.display(), kind = %directory.kind, "No capture date");
        return Ok(skipped(SkipReason::NoCaptureDate));
    };

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_raise(|| ErrorKind::InvalidPath(path.to_path_buf()))?;
    let destination = destination::resolve(&ctx.archive, &ctx.catalog, captured.date(), file_name).await?;
    let copied = copy_hashed(path, &destination.absolute).await.or_raise(|| ErrorKind::Storage)?;
    let record = PhotoRecord {
        original_path: key.to_string(),
        final_path: destination.relative,
        source_kind: directory.kind,
        tags: directory.tags.into_iter().collect(),
        content_hash: copied.hash,
    };
    catalogue(ctx, &record, &destination.absolute).await?;
    tracing::debug!(from = %record.original_path, to = %record.final_path, bytes = copied.bytes, "Ingested");
    Ok(Visit::Ingested {
        record: Box::new(record),
        bytes: copied.bytes,
    })
}

/// Records a fresh copy at `copy`, removing the copy again if the catalog
/// refuses the record.
async fn catalogue(ctx: &Context, record: &PhotoRecord, copy: &Path) -> Result<()> {
    let stored = ctx.catalog.put(record).await;
    if stored.is_err()
        && let Err(e) = fs::delete_file(copy).await
    {
        tracing::warn!(path = %copy.display(), error = %e, "Could not remove uncatalogued copy");
    }
    stored.or_raise(|| ErrorKind::Catalog)
}

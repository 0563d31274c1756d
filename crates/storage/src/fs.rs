//! Local filesystem operations used by ingestion and the file lifecycle
//! commands.
//!
//! Everything goes through `tokio::fs` and maps I/O failures onto
//! [`ErrorKind`] with the offending path attached.

use crate::error::{ErrorKind, Result};
use filetime::FileTime;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A classified directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(PathBuf),
    Directory(PathBuf),
    /// Symlinks, sockets, devices... never followed.
    Other(PathBuf),
}
impl Entry {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(p) | Self::Directory(p) | Self::Other(p) => p,
        }
    }
}

/// Classify a single path without following symlinks.
pub async fn classify(path: &Path) -> Result<Entry> {
    let metadata = fs::symlink_metadata(path).await.map_err(|e| ErrorKind::from_io(e, path))?;
    let path = path.to_path_buf();
    Ok(if metadata.is_dir() {
        Entry::Directory(path)
    } else if metadata.is_file() {
        Entry::File(path)
    } else {
        Entry::Other(path)
    })
}

/// List the immediate children of `dir`, sorted by path so that walks are
/// deterministic.
///
/// Entries that vanish or can't be inspected between listing and
/// classification are reported as [`Entry::Other`] rather than failing the
/// whole listing.
pub async fn list_dir(dir: &Path) -> Result<Vec<Entry>> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| ErrorKind::from_io(e, dir))?;
    let mut listing = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| ErrorKind::from_io(e, dir))? {
        let path = entry.path();
        listing.push(match entry.file_type().await {
            Ok(t) if t.is_dir() => Entry::Directory(path),
            Ok(t) if t.is_file() => Entry::File(path),
            Ok(_) => Entry::Other(path),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Could not determine file type");
                Entry::Other(path)
            },
        });
    }
    listing.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(listing)
}

/// Absolute form of `path` with every symlink resolved.
pub async fn canonicalize(path: &Path) -> Result<PathBuf> {
    Ok(fs::canonicalize(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
}

pub async fn exists(path: &Path) -> Result<bool> {
    Ok(fs::try_exists(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
}

pub async fn create_dir_all(path: &Path) -> Result<()> {
    Ok(fs::create_dir_all(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
}

pub async fn delete_file(path: &Path) -> Result<()> {
    Ok(fs::remove_file(path).await.map_err(|e| ErrorKind::from_io(e, path))?)
}

/// Move a file, replacing anything already at `to`.
///
/// Parent directories of `to` are created as needed. A plain rename keeps
/// every attribute; when the destination is on a different filesystem the
/// file is copied (permissions included), its access and modification times
/// are restored, and only then is the source removed.
pub async fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        create_dir_all(parent).await?;
    }
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::debug!(from = %from.display(), to = %to.display(), "Rename crosses devices; copying instead");
            copy_preserving(from, to).await?;
            delete_file(from).await
        },
        Err(e) => Err(ErrorKind::from_io(e, from).into()),
    }
}

async fn copy_preserving(from: &Path, to: &Path) -> Result<()> {
    let metadata = fs::metadata(from).await.map_err(|e| ErrorKind::from_io(e, from))?;
    fs::copy(from, to).await.map_err(|e| ErrorKind::from_io(e, to))?;
    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    Ok(filetime::set_file_times(to, accessed, modified).map_err(|e| ErrorKind::from_io(e, to))?)
}

/// Write `lines` to `path`, one per line, replacing any existing file.
pub async fn write_lines<'a>(path: &Path, lines: impl IntoIterator<Item = &'a str>) -> Result<usize> {
    let mut contents = String::new();
    let mut count = 0;
    for line in lines {
        contents.push_str(line);
        contents.push('\n');
        count += 1;
    }
    fs::write(path, contents).await.map_err(|e| ErrorKind::from_io(e, path))?;
    Ok(count)
}

//! Content hashing while copying.
//!
//! The archive copy and its fingerprint come from the same pass over the
//! source bytes: every chunk read is fed to the hasher and written to the
//! destination before the next chunk is read.

use crate::error::{ErrorKind, Result};
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::Path;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Length (in bytes) of a [`ContentHash`].
pub const HASH_LENGTH: usize = blake3::OUT_LEN;
/// Size of each chunk streamed from source to destination.
const CHUNK_SIZE: usize = 1024 * 1024;

/// BLAKE3 digest of a file's bytes.
///
/// A weak content-identity fingerprint: two files with the same hash are very
/// probably identical, but nothing in the archive relies on hashes being
/// unique.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; HASH_LENGTH]);
impl ContentHash {
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Rebuild a hash from stored bytes; `None` if the length is wrong.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; HASH_LENGTH]>::try_from(bytes).ok().map(Self)
    }

    /// Hash an in-memory buffer.
    pub fn of(bytes: impl AsRef<[u8]>) -> Self {
        blake3::hash(bytes.as_ref()).into()
    }
}
impl From<blake3::Hash> for ContentHash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}
impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", blake3::Hash::from_bytes(self.0).to_hex())
    }
}
impl Debug for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "ContentHash({self})")
    }
}

/// Result of a successful [`copy_hashed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Copied {
    pub hash: ContentHash,
    pub bytes: u64,
}

/// Copies `source` to `destination`, hashing the bytes on the way through.
///
/// The destination is created exclusively: if something already exists at
/// that path the copy fails with [`ErrorKind::AlreadyExists`] and nothing is
/// touched. If the copy fails part-way, the partial destination is removed.
pub async fn copy_hashed(source: &Path, destination: &Path) -> Result<Copied> {
    let mut reader = File::open(source).await.map_err(|e| ErrorKind::from_io(e, source))?;
    let mut writer = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(destination)
        .await
        .map_err(|e| ErrorKind::from_io(e, destination))?;
    match stream_into(&mut reader, &mut writer).await {
        Ok(copied) => Ok(copied),
        Err(e) => {
            drop(writer);
            if let Err(cleanup) = fs::remove_file(destination).await {
                tracing::warn!(path = %destination.display(), error = %cleanup, "Could not remove partial copy");
            }
            Err(e)
        },
    }
}

async fn stream_into(reader: &mut File, writer: &mut File) -> Result<Copied> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut bytes = 0u64;
    loop {
        let n = reader.read(&mut buffer).await.map_err(ErrorKind::Io)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        writer.write_all(&buffer[..n]).await.map_err(ErrorKind::Io)?;
        bytes += n as u64;
    }
    // Tokio files buffer writes on a background thread; flush before reporting success.
    writer.flush().await.map_err(ErrorKind::Io)?;
    writer.sync_all().await.map_err(ErrorKind::Io)?;
    Ok(Copied { hash: hasher.finalize().into(), bytes })
}

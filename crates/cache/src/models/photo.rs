use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use shoebox_metadata::DirectoryKind;
use shoebox_storage::ContentHash;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// One ingested file.
///
/// Records are immutable once written: re-ingesting a path replaces the
/// whole record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoRecord {
    /// Absolute path the file was found at. Primary key.
    pub original_path: String,
    /// Where the copy lives, relative to the archive root. Unique.
    pub final_path: String,
    /// Which metadata block supplied the capture date.
    pub source_kind: DirectoryKind,
    /// Every tag of that block, by name.
    pub tags: BTreeMap<String, String>,
    /// Hash of the bytes that were copied to `final_path`.
    pub content_hash: ContentHash,
}
impl PhotoRecord {
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }
}
impl Display for PhotoRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} -> {} [{}, {} tags, {}]",
            self.original_path,
            self.final_path,
            self.source_kind,
            self.tags.len(),
            self.content_hash
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PhotoRow {
    pub(crate) original_path: String,
    pub(crate) final_path: String,
    pub(crate) source_kind: String,
    pub(crate) tags: String,
    pub(crate) content_hash: Vec<u8>,
}
impl TryFrom<&PhotoRecord> for PhotoRow {
    type Error = Error;
    fn try_from(record: &PhotoRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            original_path: record.original_path.clone(),
            final_path: record.final_path.clone(),
            source_kind: record.source_kind.to_string(),
            tags: serde_json::to_string(&record.tags).or_raise(|| ErrorKind::InvalidData("tags"))?,
            content_hash: record.content_hash.as_bytes().to_vec(),
        })
    }
}
impl TryFrom<PhotoRow> for PhotoRecord {
    type Error = Error;
    fn try_from(row: PhotoRow) -> Result<Self, Self::Error> {
        Ok(Self {
            source_kind: row.source_kind.parse().ok().ok_or_raise(|| ErrorKind::InvalidData("source kind"))?,
            tags: serde_json::from_str(&row.tags).or_raise(|| ErrorKind::InvalidData("tags"))?,
            content_hash: ContentHash::from_slice(&row.content_hash).ok_or_raise(|| ErrorKind::InvalidData("content hash"))?,
            original_path: row.original_path,
            final_path: row.final_path,
        })
    }
}

//! Repository for [`PhotoRecord`]s.
//!
//! The catalog is a key-value store keyed by original path, with a second
//! unique key on the archive-relative final path. There is no update path:
//! [`put`](Repository::put) replaces a record wholesale.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{PhotoRecord, PhotoRow};
use exn::ResultExt;
use futures::{Stream, StreamExt};
use sqlx::SqlitePool;
use tracing::instrument;

/// Repository for managing photo records in the catalog database.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    // =========================================================================
    // Insert
    // =========================================================================

    /// Insert a record, replacing any existing record with the same original
    /// path.
    ///
    /// Returns [`ErrorKind::Constraint`] (and leaves the catalog untouched)
    /// if another original path already owns the record's final path.
    #[instrument(skip_all, fields(original_path = %record.original_path, final_path = %record.final_path))]
    pub async fn put(&self, record: &PhotoRecord) -> Result<()> {
        let row = PhotoRow::try_from(record)?;
        let result = sqlx::query(include_str!("../queries/put.sql"))
            .bind(row.original_path)
            .bind(row.final_path)
            .bind(row.source_kind)
            .bind(row.tags)
            .bind(row.content_hash)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                exn::bail!(ErrorKind::Constraint(record.final_path.clone()))
            },
            Err(e) => Err(e).or_raise(|| ErrorKind::Database),
        }
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// Get a record by the path its file was originally found at.
    pub async fn get(&self, original_path: &str) -> Result<Option<PhotoRecord>> {
        let row: Option<PhotoRow> = sqlx::query_as(include_str!("../queries/get.sql"))
            .bind(original_path)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(PhotoRecord::try_from).transpose()
    }

    /// Whether a record exists for the original path, without decoding it.
    pub async fn contains(&self, original_path: &str) -> Result<bool> {
        let exists: i64 = sqlx::query_scalar(include_str!("../queries/contains.sql"))
            .bind(original_path)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(exists != 0)
    }

    /// Reverse lookup: which record owns this archive-relative path?
    pub async fn lookup_by_final_path(&self, final_path: &str) -> Result<Option<PhotoRecord>> {
        let row: Option<PhotoRow> = sqlx::query_as(include_str!("../queries/get_by_final_path.sql"))
            .bind(final_path)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(PhotoRecord::try_from).transpose()
    }

    /// Number of records in the catalog.
    pub async fn size(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("record count"))
    }

    // =========================================================================
    // Scans
    // =========================================================================
    // Every scan is ordered and can simply be called again to restart it. A
    // scan holds a pooled connection until the stream is dropped.

    /// Every original path, in lexicographic order.
    pub fn scan_keys(&self) -> impl Stream<Item = Result<String>> + '_ {
        sqlx::query_scalar::<_, String>(include_str!("../queries/scan_keys.sql"))
            .fetch(&self.pool)
            .map(|key| key.or_raise(|| ErrorKind::Database))
    }

    /// Every record, ordered by original path.
    pub fn scan_records(&self) -> impl Stream<Item = Result<PhotoRecord>> + '_ {
        sqlx::query_as::<_, PhotoRow>(include_str!("../queries/scan_records.sql"))
            .fetch(&self.pool)
            .map(|row| row.or_raise(|| ErrorKind::Database).and_then(PhotoRecord::try_from))
    }

    /// Every record, ordered by final path.
    pub fn scan_records_by_final_path(&self) -> impl Stream<Item = Result<PhotoRecord>> + '_ {
        sqlx::query_as::<_, PhotoRow>(include_str!("../queries/scan_records_by_final_path.sql"))
            .fetch(&self.pool)
            .map(|row| row.or_raise(|| ErrorKind::Database).and_then(PhotoRecord::try_from))
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Remove a record. Returns `false` if there was nothing to remove.
    #[instrument(skip(self))]
    pub async fn delete(&self, original_path: &str) -> Result<bool> {
        let result = sqlx::query(include_str!("../queries/delete.sql"))
            .bind(original_path)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use shoebox_metadata::DirectoryKind;
    use shoebox_storage::ContentHash;
    use std::collections::BTreeMap;

    fn record(original: &str, final_path: &str) -> PhotoRecord {
        PhotoRecord {
            original_path: original.to_string(),
            final_path: final_path.to_string(),
            source_kind: DirectoryKind::Exif,
            tags: BTreeMap::from([("Model".to_string(), "PowerShot G7".to_string())]),
            content_hash: ContentHash::of(original),
        }
    }

    async fn repo() -> (Database, Repository) {
        let db = Database::connect_in_memory().await.unwrap();
        let repo = Repository::from(&db);
        (db, repo)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (_db, repo) = repo().await;
        let photo = record("/a/IMG_0001.jpg", "2019/07/04/IMG_0001.jpg");
        repo.put(&photo).await.unwrap();
        assert_eq!(repo.get("/a/IMG_0001.jpg").await.unwrap(), Some(photo.clone()));
        assert!(repo.contains("/a/IMG_0001.jpg").await.unwrap());
        assert_eq!(repo.get("/a/IMG_0002.jpg").await.unwrap(), None);
        assert!(!repo.contains("/a/IMG_0002.jpg").await.unwrap());
        assert_eq!(repo.lookup_by_final_path("2019/07/04/IMG_0001.jpg").await.unwrap(), Some(photo));
        assert_eq!(repo.size().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_put_replaces_by_original_path() {
        let (_db, repo) = repo().await;
        repo.put(&record("/a/IMG_0001.jpg", "2019/07/04/IMG_0001.jpg")).await.unwrap();
        let replacement = record("/a/IMG_0001.jpg", "2020/01/01/IMG_0001.jpg");
        repo.put(&replacement).await.unwrap();
        assert_eq!(repo.size().await.unwrap(), 1);
        assert_eq!(repo.get("/a/IMG_0001.jpg").await.unwrap(), Some(replacement));
        assert_eq!(repo.lookup_by_final_path("2019/07/04/IMG_0001.jpg").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_final_path_is_unique() {
        let (_db, repo) = repo().await;
        let first = record("/a/IMG_0001.jpg", "2019/07/04/IMG_0001.jpg");
        repo.put(&first).await.unwrap();
        let err = repo.put(&record("/b/IMG_0001.jpg", "2019/07/04/IMG_0001.jpg")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Constraint(p) if p == "2019/07/04/IMG_0001.jpg"));
        // The existing owner is untouched and the rejected record is absent.
        assert_eq!(repo.lookup_by_final_path("2019/07/04/IMG_0001.jpg").await.unwrap(), Some(first));
        assert_eq!(repo.get("/b/IMG_0001.jpg").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete() {
        let (_db, repo) = repo().await;
        repo.put(&record("/a/IMG_0001.jpg", "2019/07/04/IMG_0001.jpg")).await.unwrap();
        assert!(repo.delete("/a/IMG_0001.jpg").await.unwrap());
        assert!(!repo.delete("/a/IMG_0001.jpg").await.unwrap());
        assert_eq!(repo.size().await.unwrap(), 0);
        // The final path is free again.
        repo.put(&record("/b/IMG_0001.jpg", "2019/07/04/IMG_0001.jpg")).await.unwrap();
    }

    #[tokio::test]
    async fn test_scans_are_ordered_and_restartable() {
        let (_db, repo) = repo().await;
        repo.put(&record("/c/3.jpg", "2001/01/01/3.jpg")).await.unwrap();
        repo.put(&record("/a/1.jpg", "2003/01/01/1.jpg")).await.unwrap();
        repo.put(&record("/b/2.jpg", "2002/01/01/2.jpg")).await.unwrap();

        let keys: Vec<String> = repo.scan_keys().try_collect().await.unwrap();
        assert_eq!(keys, vec!["/a/1.jpg", "/b/2.jpg", "/c/3.jpg"]);
        let again: Vec<String> = repo.scan_keys().try_collect().await.unwrap();
        assert_eq!(keys, again);

        let records: Vec<PhotoRecord> = repo.scan_records().try_collect().await.unwrap();
        let originals: Vec<&str> = records.iter().map(|r| r.original_path.as_str()).collect();
        assert_eq!(originals, vec!["/a/1.jpg", "/b/2.jpg", "/c/3.jpg"]);

        let by_final: Vec<PhotoRecord> = repo.scan_records_by_final_path().try_collect().await.unwrap();
        let finals: Vec<&str> = by_final.iter().map(|r| r.final_path.as_str()).collect();
        assert_eq!(finals, vec!["2001/01/01/3.jpg", "2002/01/01/2.jpg", "2003/01/01/1.jpg"]);
    }
}

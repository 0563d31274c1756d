//! Where an ingested file goes in the archive.
//!
//! Files land in `YYYY/MM/DD/` under the archive root, keeping their original
//! name. When that name is taken, `-0001`, `-0002`, ... is inserted before the
//! extension, where the extension is everything after the *first* dot
//! (`clip.tar.gz` becomes `clip-0001.tar.gz`). A name is taken when a file is
//! on disk there or when the catalog already assigns it to some original,
//! even one whose copy has since gone missing.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use shoebox_catalog::Repository;
use shoebox_storage::fs;
use std::path::{Path, PathBuf};
use time::Date;

/// A free slot in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    /// Full path on disk.
    pub absolute: PathBuf,
    /// Path relative to the archive root, always `/`-separated.
    pub relative: String,
}

/// Archive-relative directory for a capture date, e.g. `2019/07/04`.
pub fn date_directory(date: Date) -> String {
    format!("{:04}/{:02}/{:02}", date.year(), u8::from(date.month()), date.day())
}

/// The `n`th alternative for a taken file name. `n == 0` is the name itself.
pub fn candidate_name(file_name: &str, n: u32) -> String {
    if n == 0 {
        return file_name.to_string();
    }
    match file_name.split_once('.') {
        Some((name, extension)) if !extension.is_empty() => format!("{name}-{n:04}.{extension}"),
        _ => format!("{file_name}-{n:04}"),
    }
}

/// Creates the dated directory under `root` if needed and finds the first
/// candidate name that is neither on disk nor owned by a catalog record.
///
/// The returned path is free at the time of the check only; callers must
/// create the file exclusively.
pub async fn resolve(root: &Path, catalog: &Repository, date: Date, file_name: &str) -> Result<Destination> {
    let directory = date_directory(date);
    let absolute_directory = root.join(&directory);
    fs::create_dir_all(&absolute_directory).await.or_raise(|| ErrorKind::Storage)?;
    let mut n = 0;
    loop {
        let name = candidate_name(file_name, n);
        let absolute = absolute_directory.join(&name);
        let relative = format!("{directory}/{name}");
        let on_disk = fs::exists(&absolute).await.or_raise(|| ErrorKind::Storage)?;
        if !on_disk && catalog.lookup_by_final_path(&relative).await.or_raise(|| ErrorKind::Catalog)?.is_none() {
            return Ok(Destination { absolute, relative });
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use rstest::rstest;
    use shoebox_catalog::PhotoRecord;
    use shoebox_metadata::DirectoryKind;
    use shoebox_storage::ContentHash;
    use time::macros::date;

    #[rstest]
    #[case("IMG_0001.JPG", 0, "IMG_0001.JPG")]
    #[case("IMG_0001.JPG", 1, "IMG_0001-0001.JPG")]
    #[case("IMG_0001.JPG", 12, "IMG_0001-0012.JPG")]
    #[case("clip.tar.gz", 1, "clip-0001.tar.gz")]
    #[case("README", 3, "README-0003")]
    #[case("odd.", 1, "odd.-0001")]
    #[case(".hidden", 1, "-0001.hidden")]
    fn test_candidate_name(#[case] file_name: &str, #[case] n: u32, #[case] expected: &str) {
        assert_eq!(candidate_name(file_name, n), expected);
    }

    #[test]
    fn test_date_directory_is_zero_padded() {
        assert_eq!(date_directory(date!(2019 - 07 - 04)), "2019/07/04");
        assert_eq!(date_directory(date!(2001 - 01 - 09)), "2001/01/09");
    }

    #[tokio::test]
    async fn test_resolve_creates_directory_and_avoids_collisions() {
        let fixture = fixture().await;
        let (root, catalog) = (&fixture.context.archive, &fixture.context.catalog);
        let first = resolve(root, catalog, date!(2019 - 07 - 04), "IMG_0001.JPG").await.unwrap();
        assert_eq!(first.relative, "2019/07/04/IMG_0001.JPG");
        assert_eq!(first.absolute, root.join("2019/07/04/IMG_0001.JPG"));
        assert!(root.join("2019/07/04").is_dir());

        std::fs::write(&first.absolute, b"taken").unwrap();
        let second = resolve(root, catalog, date!(2019 - 07 - 04), "IMG_0001.JPG").await.unwrap();
        assert_eq!(second.relative, "2019/07/04/IMG_0001-0001.JPG");

        std::fs::write(&second.absolute, b"taken").unwrap();
        let third = resolve(root, catalog, date!(2019 - 07 - 04), "IMG_0001.JPG").await.unwrap();
        assert_eq!(third.relative, "2019/07/04/IMG_0001-0002.JPG");
    }

    #[tokio::test]
    async fn test_resolve_skips_names_the_catalog_owns() {
        let fixture = fixture().await;
        let (root, catalog) = (&fixture.context.archive, &fixture.context.catalog);
        // Catalogued, but the copy is gone from disk.
        catalog
            .put(&PhotoRecord {
                original_path: "/card1/IMG_0001.JPG".to_string(),
                final_path: "2019/07/04/IMG_0001.JPG".to_string(),
                source_kind: DirectoryKind::Exif,
                tags: Default::default(),
                content_hash: ContentHash::of(b"first"),
            })
            .await
            .unwrap();
        let destination = resolve(root, catalog, date!(2019 - 07 - 04), "IMG_0001.JPG").await.unwrap();
        assert_eq!(destination.relative, "2019/07/04/IMG_0001-0001.JPG");
        assert!(!root.join("2019/07/04/IMG_0001.JPG").exists());
    }
}

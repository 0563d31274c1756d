//! Named working sets of catalog records.
//!
//! Lists are built by matching patterns against the catalog, combined with
//! [`Session::merge`] and [`Session::intersect`], and consumed by the file
//! lifecycle commands. They only live as long as the [`Session`].

use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use futures::TryStreamExt;
use regex::{Regex, RegexBuilder};
use shoebox_catalog::{PhotoRecord, Repository};
use std::collections::{BTreeMap, BTreeSet};

/// Compiles each pattern as an anchored, case-insensitive regex.
///
/// Patterns that don't compile are logged and left out; it's only an error
/// when none are left.
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>> {
    let compiled: Vec<Regex> = patterns
        .iter()
        .filter_map(|pattern| {
            let pattern = pattern.as_ref();
            RegexBuilder::new(&format!("^(?:{pattern})$"))
                .case_insensitive(true)
                .build()
                .inspect_err(|e| tracing::warn!(pattern, error = %e, "Ignoring invalid pattern"))
                .ok()
        })
        .collect();
    if compiled.is_empty() {
        exn::bail!(ErrorKind::NoPatterns);
    }
    Ok(compiled)
}

/// Every record whose whole original path fully matches any of `patterns`,
/// in original path order.
pub async fn match_path(catalog: &Repository, patterns: &[Regex]) -> Result<Vec<PhotoRecord>> {
    catalog
        .scan_keys()
        .try_filter(|key| futures::future::ready(patterns.iter().any(|p| p.is_match(key))))
        // Deleted between the scan and the lookup: nothing to match.
        .and_then(|key| async move { catalog.get(&key).await })
        .try_filter_map(|record| futures::future::ready(Ok(record)))
        .try_collect()
        .await
        .or_raise(|| ErrorKind::Catalog)
}

/// Every record that has `tag` with a value fully matching any of
/// `patterns`, in original path order.
pub async fn match_tag(catalog: &Repository, tag: &str, patterns: &[Regex]) -> Result<Vec<PhotoRecord>> {
    catalog
        .scan_records()
        .try_filter(|record| {
            let matched = record.tag(tag).is_some_and(|value| patterns.iter().any(|p| p.is_match(value)));
            futures::future::ready(matched)
        })
        .try_collect()
        .await
        .or_raise(|| ErrorKind::Catalog)
}

/// The named lists of one interactive session.
#[derive(Debug, Default, Clone)]
pub struct Session {
    lists: BTreeMap<String, Vec<PhotoRecord>>,
}
impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&[PhotoRecord]> {
        self.lists.get(name).map(Vec::as_slice)
    }

    /// Like [`get`](Self::get), failing with [`ErrorKind::NoSuchList`].
    pub fn require(&self, name: &str) -> Result<&[PhotoRecord]> {
        self.get(name).ok_or_raise(|| ErrorKind::NoSuchList(name.to_string()))
    }

    /// Stores `records` under `name`, replacing any list already there.
    /// Returns the size of the new list.
    pub fn insert(&mut self, name: impl Into<String>, records: Vec<PhotoRecord>) -> usize {
        let size = records.len();
        self.lists.insert(name.into(), records);
        size
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<PhotoRecord>> {
        self.lists.remove(name)
    }

    /// Every list name with its size, ordered by name.
    pub fn names(&self) -> impl Iterator<Item = (&str, usize)> {
        self.lists.iter().map(|(name, records)| (name.as_str(), records.len()))
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// The original paths of a list, in list order.
    pub fn show(&self, name: &str) -> Result<impl Iterator<Item = &str>> {
        Ok(self.require(name)?.iter().map(|record| record.original_path.as_str()))
    }

    /// Stores the union of `a` and `b` (by original path) as `name`.
    pub fn merge(&mut self, a: &str, b: &str, name: impl Into<String>) -> Result<usize> {
        let (a, b) = (self.operand(a)?, self.operand(b)?);
        let mut union: BTreeMap<&str, &PhotoRecord> = BTreeMap::new();
        for record in a.iter().chain(b) {
            union.entry(record.original_path.as_str()).or_insert(record);
        }
        let merged = union.into_values().cloned().collect();
        Ok(self.insert(name, merged))
    }

    /// Stores the records of `a` whose original path is also in `b` as
    /// `name`.
    pub fn intersect(&mut self, a: &str, b: &str, name: impl Into<String>) -> Result<usize> {
        let (a, b) = (self.operand(a)?, self.operand(b)?);
        let keep: BTreeSet<&str> = b.iter().map(|record| record.original_path.as_str()).collect();
        let mut common: BTreeMap<&str, &PhotoRecord> = BTreeMap::new();
        for record in a.iter().filter(|record| keep.contains(record.original_path.as_str())) {
            common.entry(record.original_path.as_str()).or_insert(record);
        }
        let intersected = common.into_values().cloned().collect();
        Ok(self.insert(name, intersected))
    }

    fn operand(&self, name: &str) -> Result<&[PhotoRecord]> {
        self.get(name).ok_or_raise(|| ErrorKind::UnknownList(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixture;
    use rstest::rstest;
    use shoebox_metadata::DirectoryKind;
    use shoebox_storage::ContentHash;

    fn record(original_path: &str) -> PhotoRecord {
        PhotoRecord {
            original_path: original_path.to_string(),
            final_path: format!("2019/07/04/{}", original_path.rsplit('/').next().unwrap_or_default()),
            source_kind: DirectoryKind::Exif,
            tags: BTreeMap::from([("Model".to_string(), format!("Camera {}", original_path.len()))]),
            content_hash: ContentHash::of(original_path),
        }
    }

    fn paths(records: &[PhotoRecord]) -> Vec<&str> {
        records.iter().map(|record| record.original_path.as_str()).collect()
    }

    fn session() -> Session {
        let mut session = Session::new();
        session.insert("a", vec![record("/x/3.jpg"), record("/x/1.jpg"), record("/x/2.jpg")]);
        session.insert("b", vec![record("/x/2.jpg"), record("/x/4.jpg")]);
        session.insert("empty", vec![]);
        session
    }

    #[rstest]
    #[case("a", "b")]
    #[case("b", "a")]
    #[case("a", "empty")]
    #[case("a", "a")]
    fn test_merge_is_commutative(#[case] left: &str, #[case] right: &str) {
        let mut session = session();
        session.merge(left, right, "lr").unwrap();
        session.merge(right, left, "rl").unwrap();
        assert_eq!(paths(session.get("lr").unwrap()), paths(session.get("rl").unwrap()));
    }

    #[test]
    fn test_merge_is_ordered_union() {
        let mut session = session();
        assert_eq!(session.merge("a", "b", "all").unwrap(), 4);
        assert_eq!(paths(session.get("all").unwrap()), vec!["/x/1.jpg", "/x/2.jpg", "/x/3.jpg", "/x/4.jpg"]);
        // Self-merge only normalises the order.
        session.merge("a", "a", "aa").unwrap();
        assert_eq!(paths(session.get("aa").unwrap()), vec!["/x/1.jpg", "/x/2.jpg", "/x/3.jpg"]);
    }

    #[test]
    fn test_intersect_is_subset() {
        let mut session = session();
        assert_eq!(session.intersect("a", "b", "both").unwrap(), 1);
        assert_eq!(paths(session.get("both").unwrap()), vec!["/x/2.jpg"]);
        for operand in ["a", "b"] {
            let superset = paths(session.get(operand).unwrap());
            assert!(paths(session.get("both").unwrap()).iter().all(|p| superset.contains(p)));
        }
        assert_eq!(session.intersect("a", "empty", "none").unwrap(), 0);
        session.intersect("a", "a", "same").unwrap();
        session.merge("a", "a", "merged").unwrap();
        assert_eq!(paths(session.get("same").unwrap()), paths(session.get("merged").unwrap()));
    }

    #[test]
    fn test_unknown_operands_change_nothing() {
        let mut session = session();
        let err = session.merge("a", "nope", "out").unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownList(name) if name == "nope"));
        assert_eq!(err.to_string(), "Unknown list nope");
        let err = session.intersect("nope", "a", "out").unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnknownList(name) if name == "nope"));
        assert!(session.get("out").is_none());
    }

    #[test]
    fn test_show_and_names() {
        let mut session = session();
        assert_eq!(session.show("b").unwrap().collect::<Vec<_>>(), vec!["/x/2.jpg", "/x/4.jpg"]);
        assert_eq!(session.show("nope").err().unwrap().to_string(), "No such list nope");
        assert_eq!(session.names().collect::<Vec<_>>(), vec![("a", 3), ("b", 2), ("empty", 0)]);
        assert_eq!(session.insert("b", vec![]), 0);
        assert!(session.remove("b").is_some());
        assert!(session.remove("b").is_none());
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_compile_patterns() {
        let compiled = compile_patterns(&["img_.*", "(unclosed"]).unwrap();
        assert_eq!(compiled.len(), 1);
        assert!(compiled[0].is_match("IMG_0001.JPG"));
        assert!(!compiled[0].is_match("/a/IMG_0001.JPG"));
        let err = compile_patterns(&["(unclosed"]).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NoPatterns));
        assert!(compile_patterns::<&str>(&[]).is_err());
    }

    #[tokio::test]
    async fn test_match_path_is_anchored() {
        let fixture = fixture().await;
        let catalog = &fixture.context.catalog;
        catalog.put(&record("/a/IMG_001.jpg")).await.unwrap();
        catalog.put(&record("/a/note.txt")).await.unwrap();

        let matched = match_path(catalog, &compile_patterns(&[r".*/IMG_.*\.jpg"]).unwrap()).await.unwrap();
        assert_eq!(paths(&matched), vec!["/a/IMG_001.jpg"]);
        // Anchored: a pattern that only covers part of a path matches nothing.
        let matched = match_path(catalog, &compile_patterns(&["IMG_"]).unwrap()).await.unwrap();
        assert!(matched.is_empty());
        let matched = match_path(catalog, &compile_patterns(&["/a/img_001"]).unwrap()).await.unwrap();
        assert!(matched.is_empty());
        let matched = match_path(catalog, &compile_patterns(&[r".*\.TXT", r"/a/.*"]).unwrap()).await.unwrap();
        assert_eq!(paths(&matched), vec!["/a/IMG_001.jpg", "/a/note.txt"]);
    }

    #[tokio::test]
    async fn test_match_path_ignores_bare_file_names() {
        let fixture = fixture().await;
        let catalog = &fixture.context.catalog;
        catalog.put(&record("/mnt/card/DCIM/IMG_0001.JPG")).await.unwrap();
        let mut kept = record("/home/me/keep/IMG_0001.JPG");
        kept.final_path = "2019/07/04/IMG_0001-0001.JPG".to_string();
        catalog.put(&kept).await.unwrap();

        let matched = match_path(catalog, &compile_patterns(&[r"IMG_0001\.JPG"]).unwrap()).await.unwrap();
        assert!(matched.is_empty());
        let matched = match_path(catalog, &compile_patterns(&[r"/mnt/card/.*"]).unwrap()).await.unwrap();
        assert_eq!(paths(&matched), vec!["/mnt/card/DCIM/IMG_0001.JPG"]);
        let matched = match_path(catalog, &compile_patterns(&[r".*/IMG_0001\.JPG"]).unwrap()).await.unwrap();
        assert_eq!(paths(&matched), vec!["/home/me/keep/IMG_0001.JPG", "/mnt/card/DCIM/IMG_0001.JPG"]);
    }

    #[tokio::test]
    async fn test_match_tag() {
        let fixture = fixture().await;
        let catalog = &fixture.context.catalog;
        catalog.put(&record("/a/1.jpg")).await.unwrap();
        catalog.put(&record("/a/22.jpg")).await.unwrap();
        let mut untagged = record("/a/333.jpg");
        untagged.tags.clear();
        catalog.put(&untagged).await.unwrap();

        let matched = match_tag(catalog, "Model", &compile_patterns(&["camera 8"]).unwrap()).await.unwrap();
        assert_eq!(paths(&matched), vec!["/a/1.jpg"]);
        let matched = match_tag(catalog, "Model", &compile_patterns(&["Camera .*"]).unwrap()).await.unwrap();
        assert_eq!(paths(&matched), vec!["/a/1.jpg", "/a/22.jpg"]);
        let matched = match_tag(catalog, "Make", &compile_patterns(&[".*"]).unwrap()).await.unwrap();
        assert!(matched.is_empty());
    }
}

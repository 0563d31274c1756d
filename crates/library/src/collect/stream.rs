use crate::collect::file::ingest_file;
use crate::collect::{CollectEvent, SkipReason, Visit};
use crate::error::ErrorKind;
use crate::{Context, Report};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use shoebox_storage::fs::{self, Entry};
use std::path::{Path, PathBuf};

/// Streams a [`CollectEvent`] for every entry under each of `roots`.
///
/// Roots are canonicalized first, so catalog keys are always absolute and a
/// root that reaches the archive through `..` or a symlink is still
/// recognised. A root that is a file is ingested on its own. With
/// `overwrite`, files that are already catalogued are ingested again and
/// their records replaced.
pub fn collect<'a>(ctx: &'a Context, roots: Vec<PathBuf>, overwrite: bool) -> impl Stream<Item = CollectEvent> + 'a {
    stream!({
        yield CollectEvent::Started;
        for root in roots {
            let mut pending = match start(&root).await {
                Ok(entry) => vec![entry],
                Err(visit) => {
                    yield CollectEvent::Visited(visit);
                    yield CollectEvent::RootComplete(root);
                    continue;
                },
            };
            // Children are pushed in reverse so that they pop in sorted order.
            while let Some(entry) = pending.pop() {
                let visit = match entry {
                    Entry::Directory(path) if path == ctx.archive => Visit::DirectorySkipped(path),
                    Entry::Directory(path) => match fs::list_dir(&path).await {
                        Ok(children) => {
                            pending.extend(children.into_iter().rev());
                            Visit::DirectoryEntered(path)
                        },
                        Err(e) => {
                            tracing::warn!(path = %path.display(), error = %e, "Could not read directory");
                            Visit::DirectoryFailed {
                                path,
                                error: e.raise(ErrorKind::Storage),
                            }
                        },
                    },
                    Entry::File(path) => match ingest_file(ctx, &path, overwrite).await {
                        Ok(visit) => visit,
                        Err(error) => {
                            tracing::warn!(path = %path.display(), error = %error, "Skipping file");
                            Visit::Failed { path, error }
                        },
                    },
                    Entry::Other(path) => Visit::Skipped {
                        path,
                        reason: SkipReason::NotRegularFile,
                    },
                };
                yield CollectEvent::Visited(visit);
            }
            yield CollectEvent::RootComplete(root);
        }
        yield CollectEvent::Complete;
    })
}

async fn start(root: &Path) -> Result<Entry, Visit> {
    let classified = match fs::canonicalize(root).await {
        Ok(canonical) => fs::classify(&canonical).await,
        Err(e) => Err(e),
    };
    classified.or_raise(|| ErrorKind::Storage).map_err(|error| {
        tracing::warn!(root = %root.display(), error = %error, "Could not read root");
        Visit::Failed {
            path: root.to_path_buf(),
            error,
        }
    })
}

/// Runs [`collect`] to the end and returns the final [`Report`].
///
/// The running report is logged every `progress_every` copied files and
/// after each root.
pub async fn run(ctx: &Context, roots: Vec<PathBuf>, overwrite: bool) -> Report {
    let mut report = Report::default();
    let events = collect(ctx, roots, overwrite);
    let mut events = std::pin::pin!(events);
    while let Some(event) = events.next().await {
        match event {
            CollectEvent::Started => tracing::debug!(archive = %ctx.archive.display(), overwrite, "Collecting"),
            CollectEvent::Visited(visit) => {
                let copied = report.copied;
                report.record(&visit);
                if report.copied > copied && report.copied % ctx.progress_every.max(1) == 0 {
                    tracing::info!("{report}");
                }
            },
            CollectEvent::RootComplete(root) => tracing::info!(root = %root.display(), "{report}"),
            CollectEvent::Complete => {},
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, write};
    use tracing_test::traced_test;

    async fn visits(ctx: &Context, roots: Vec<PathBuf>, overwrite: bool) -> Vec<Visit> {
        collect(ctx, roots, overwrite)
            .filter_map(|event| async move {
                match event {
                    CollectEvent::Visited(visit) => Some(visit),
                    _ => None,
                }
            })
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_events_are_framed() {
        let fixture = fixture().await;
        write(&fixture.source.join("a.jpg"), "date=2019-07-04");
        let events: Vec<_> = collect(&fixture.context, vec![fixture.source.clone()], false).collect().await;
        assert!(matches!(events.first(), Some(CollectEvent::Started)));
        assert!(matches!(events.last(), Some(CollectEvent::Complete)));
        assert!(matches!(&events[events.len() - 2], CollectEvent::RootComplete(root) if *root == fixture.source));
    }

    #[tokio::test]
    async fn test_walk_is_sorted_and_depth_first() {
        let fixture = fixture().await;
        let source = &fixture.source;
        write(&source.join("b/2.jpg"), "date=2019-07-04");
        write(&source.join("a/1.jpg"), "date=2019-07-04");
        write(&source.join("c.txt"), "");

        let paths: Vec<_> = visits(&fixture.context, vec![source.clone()], false)
            .await
            .into_iter()
            .map(|visit| match visit {
                Visit::DirectoryEntered(path) => path,
                Visit::Ingested { record, .. } => PathBuf::from(record.original_path),
                Visit::Skipped { path, .. } => path,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            paths,
            vec![
                source.clone(),
                source.join("a"),
                source.join("a/1.jpg"),
                source.join("b"),
                source.join("b/2.jpg"),
                source.join("c.txt"),
            ]
        );
    }

    #[tokio::test]
    async fn test_same_name_same_day_gets_suffix() {
        let fixture = fixture().await;
        write(&fixture.source.join("card1/IMG_0001.JPG"), "date=2019-07-04");
        write(&fixture.source.join("card2/IMG_0001.JPG"), "date=2019-07-04");

        let report = run(&fixture.context, vec![fixture.source.clone()], false).await;
        assert_eq!(report.copied, 2);
        let first = fixture.source.join("card1/IMG_0001.JPG");
        let second = fixture.source.join("card2/IMG_0001.JPG");
        let catalog = &fixture.context.catalog;
        assert_eq!(catalog.get(first.to_str().unwrap()).await.unwrap().unwrap().final_path, "2019/07/04/IMG_0001.JPG");
        assert_eq!(
            catalog.get(second.to_str().unwrap()).await.unwrap().unwrap().final_path,
            "2019/07/04/IMG_0001-0001.JPG"
        );
    }

    #[tokio::test]
    async fn test_reingest_changes_nothing() {
        let fixture = fixture().await;
        write(&fixture.source.join("IMG_0001.JPG"), "date=2019-07-04");
        write(&fixture.source.join("clip.mov"), "movie=2019-07-05");

        let first = run(&fixture.context, vec![fixture.source.clone()], false).await;
        assert_eq!(first.copied, 2);
        let records: Vec<_> = fixture.context.catalog.scan_records().map(|r| r.unwrap()).collect().await;

        let second = run(&fixture.context, vec![fixture.source.clone()], false).await;
        assert_eq!(second.copied, 0);
        assert_eq!(second.files, 2);
        let again: Vec<_> = fixture.context.catalog.scan_records().map(|r| r.unwrap()).collect().await;
        assert_eq!(records, again);
        assert_eq!(std::fs::read_dir(fixture.context.archive.join("2019/07/04")).unwrap().count(), 1);
        assert_eq!(std::fs::read_dir(fixture.context.archive.join("2019/07/05")).unwrap().count(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_progress_is_logged_every_few_copies() {
        let mut fixture = fixture().await;
        fixture.context.progress_every = 2;
        for name in ["1.jpg", "2.jpg", "3.jpg"] {
            write(&fixture.source.join(name), "date=2019-07-04");
        }
        write(&fixture.source.join("undated.jpg"), "undated");

        let report = run(&fixture.context, vec![fixture.source.clone()], false).await;
        assert_eq!(report.copied, 3);
        logs_assert(|lines: &[&str]| {
            let count = |copied: &str| lines.iter().filter(|line| line.contains(copied)).count();
            // Once after the second copy, and the third only at the end of the root.
            match (count("Copied 1 files"), count("Copied 2 files"), count("Copied 3 files")) {
                (0, 1, 1) => Ok(()),
                counts => Err(format!("unexpected progress lines {counts:?}")),
            }
        });
    }

    #[tokio::test]
    async fn test_undated_file_is_visited_not_copied() {
        let fixture = fixture().await;
        write(&fixture.source.join("undated.jpg"), "undated");
        let report = run(&fixture.context, vec![fixture.source.clone()], false).await;
        assert_eq!(report.files, 1);
        assert_eq!(report.copied, 0);
        assert_eq!(fixture.context.catalog.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_archive_inside_source_is_skipped() {
        let fixture = fixture().await;
        let parent = fixture.source.parent().unwrap().to_path_buf();
        write(&fixture.context.archive.join("2001/01/01/old.jpg"), "date=2001-01-01");
        write(&fixture.source.join("new.jpg"), "date=2019-07-04");

        let found = visits(&fixture.context, vec![parent], false).await;
        assert!(
            found
                .iter()
                .any(|visit| matches!(visit, Visit::DirectorySkipped(path) if *path == fixture.context.archive))
        );
        let report = run(&fixture.context, vec![fixture.source.join("..")], false).await;
        assert_eq!(report.copied, 0);
        // Everything new was already ingested by the first walk; the archive
        // copy itself never was.
        let old = fixture.context.archive.join("2001/01/01/old.jpg");
        assert!(fixture.context.catalog.get(old.to_str().unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_root_can_be_a_file() {
        let fixture = fixture().await;
        let file = fixture.source.join("IMG_0002.JPG");
        write(&file, "date=2019-07-04");
        let report = run(&fixture.context, vec![file], false).await;
        assert_eq!(report.directories, 0);
        assert_eq!(report.files, 1);
        assert_eq!(report.copied, 1);
        assert_eq!(report.bytes, 15);
    }

    #[tokio::test]
    async fn test_missing_root_fails_and_continues() {
        let fixture = fixture().await;
        write(&fixture.source.join("a.jpg"), "date=2019-07-04");
        let missing = fixture.source.join("missing");
        let found = visits(&fixture.context, vec![missing.clone(), fixture.source.clone()], false).await;
        assert!(matches!(&found[0], Visit::Failed { path, .. } if *path == missing));
        assert!(found.iter().any(|visit| matches!(visit, Visit::Ingested { .. })));
    }

    #[tokio::test]
    async fn test_failures_are_counted() {
        let fixture = fixture().await;
        write(&fixture.source.join("broken.jpg"), "garbage");
        write(&fixture.source.join("fine.jpg"), "date=2019-07-04");
        let report = run(&fixture.context, vec![fixture.source.clone()], false).await;
        assert_eq!(report.files, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.copied, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_not_followed() {
        let fixture = fixture().await;
        let real = fixture.source.join("real.jpg");
        write(&real, "date=2019-07-04");
        std::os::unix::fs::symlink(&real, fixture.source.join("link.jpg")).unwrap();
        let report = run(&fixture.context, vec![fixture.source.clone()], false).await;
        assert_eq!(report.files, 1);
        assert_eq!(report.copied, 1);
    }
}

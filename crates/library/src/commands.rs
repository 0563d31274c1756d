//! The human-facing command surface.
//!
//! Every command reports back with a message rather than an error, so a
//! shell can print whatever comes back. Failures are logged where they
//! happen and summarised in the message.

use crate::error::Error;
use crate::lists::{Session, compile_patterns, match_path, match_tag};
use crate::{Context, collect, group_digits, lifecycle};
use futures::StreamExt;
use shoebox_catalog::PhotoRecord;
use shoebox_storage::fs;
use std::path::{Path, PathBuf};

/// The message for a failed command: the outermost error only.
fn message(err: &Error) -> String {
    (**err).to_string()
}

fn count(n: usize) -> String {
    group_digits(u64::try_from(n).unwrap_or(u64::MAX))
}

/// Commands over one archive, with the named lists of this session.
#[derive(Debug)]
pub struct Commands {
    context: Context,
    session: Session,
}
impl Commands {
    pub fn new(context: Context) -> Self {
        Self {
            context,
            session: Session::new(),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Ingest everything under `roots`.
    pub async fn collect(&self, overwrite: bool, roots: Vec<PathBuf>) -> String {
        for root in &roots {
            tracing::info!(root = %root.display(), "Walking root");
        }
        collect::run(&self.context, roots, overwrite).await.to_string()
    }

    pub async fn move_files(&self, list: &str, output_dir: &Path) -> String {
        let records = match self.session.require(list) {
            Ok(records) => records,
            Err(e) => return message(&e),
        };
        match lifecycle::move_files(&self.context.catalog, records, output_dir).await {
            Ok(tally) => format!(
                "Moved {} files, had {} errors",
                group_digits(tally.succeeded),
                group_digits(tally.failed)
            ),
            Err(e) => {
                tracing::warn!(output_dir = %output_dir.display(), error = ?e, "Move aborted");
                message(&e)
            },
        }
    }

    pub async fn delete(&self, list: &str) -> String {
        let records = match self.session.require(list) {
            Ok(records) => records,
            Err(e) => return message(&e),
        };
        let tally = lifecycle::delete_files(&self.context.catalog, records).await;
        format!(
            "Deleted {} files, had {} errors",
            group_digits(tally.succeeded),
            group_digits(tally.failed)
        )
    }

    /// Store every catalogued original matching any of `patterns` as `name`.
    pub async fn match_path<S: AsRef<str>>(&mut self, name: &str, patterns: &[S]) -> String {
        let matched = match compile_patterns(patterns) {
            Ok(patterns) => match_path(&self.context.catalog, &patterns).await,
            Err(e) => Err(e),
        };
        self.store_matches(name, matched)
    }

    /// Store every record whose `tag` matches any of `patterns` as `name`.
    pub async fn match_tag<S: AsRef<str>>(&mut self, name: &str, tag: &str, patterns: &[S]) -> String {
        let matched = match compile_patterns(patterns) {
            Ok(patterns) => match_tag(&self.context.catalog, tag, &patterns).await,
            Err(e) => Err(e),
        };
        self.store_matches(name, matched)
    }

    fn store_matches(&mut self, name: &str, matched: Result<Vec<PhotoRecord>, Error>) -> String {
        match matched {
            Ok(records) => {
                let size = self.session.insert(name, records);
                format!("{} matching paths for {name}", count(size))
            },
            Err(e) => {
                tracing::warn!(list = name, error = ?e, "Match failed");
                message(&e)
            },
        }
    }

    pub fn merge(&mut self, a: &str, b: &str, name: &str) -> String {
        match self.session.merge(a, b, name) {
            Ok(size) => format!("Merge resulted in {} info", count(size)),
            Err(e) => message(&e),
        }
    }

    pub fn intersect(&mut self, a: &str, b: &str, name: &str) -> String {
        match self.session.intersect(a, b, name) {
            Ok(size) => format!("Intersected resulted in {} info", count(size)),
            Err(e) => message(&e),
        }
    }

    /// The original paths of a list, one per line.
    pub fn show(&self, list: &str) -> String {
        match self.session.show(list) {
            Ok(paths) => paths.collect::<Vec<_>>().join("\n"),
            Err(e) => message(&e),
        }
    }

    /// Write the original paths of a list to `file`, one per line.
    pub async fn write(&self, list: &str, file: &Path) -> String {
        let paths = match self.session.show(list) {
            Ok(paths) => paths,
            Err(e) => return message(&e),
        };
        match fs::write_lines(file, paths).await {
            Ok(written) => format!("Wrote {}", count(written)),
            Err(e) => {
                tracing::warn!(file = %file.display(), error = %e, "Error writing output file");
                format!("Error writing file {}", file.display())
            },
        }
    }

    pub fn drop(&mut self, list: &str) -> String {
        match self.session.remove(list) {
            Some(_) => format!("Removed list {list}"),
            None => format!("No such list {list}"),
        }
    }

    /// Every list with its size, then how many there are.
    pub fn list(&self) -> String {
        let mut lines: Vec<String> = self.session.names().map(|(name, size)| format!("{name}: {}", count(size))).collect();
        lines.push(format!("{} lists saved", count(self.session.len())));
        lines.join("\n")
    }

    pub async fn size(&self) -> String {
        match self.context.catalog.size().await {
            Ok(size) => format!("{} photos", group_digits(size)),
            Err(e) => {
                tracing::warn!(error = ?e, "Could not count the catalog");
                "Unable to read the catalog".to_string()
            },
        }
    }

    /// Find the record whose archive copy is at `final_path`, given either
    /// relative to the archive or as an absolute path inside it.
    pub async fn lookup(&self, final_path: &str) -> String {
        let final_path = final_path.trim();
        let relative = Path::new(final_path)
            .strip_prefix(&self.context.archive)
            .ok()
            .and_then(|relative| relative.to_str())
            .map(|relative| relative.replace(std::path::MAIN_SEPARATOR, "/"))
            .unwrap_or_else(|| final_path.to_string());
        match self.context.catalog.lookup_by_final_path(&relative).await {
            Ok(Some(record)) => record.to_string(),
            Ok(None) => format!("{final_path} not found"),
            Err(e) => {
                tracing::warn!(final_path, error = ?e, "Lookup failed");
                "Unable to read the catalog".to_string()
            },
        }
    }

    /// Every record, ordered by archive path, one per line.
    pub async fn dump(&self) -> String {
        let mut lines = Vec::new();
        let mut records = std::pin::pin!(self.context.catalog.scan_records_by_final_path());
        while let Some(record) = records.next().await {
            match record {
                Ok(record) => lines.push(record.to_string()),
                Err(e) => {
                    tracing::warn!(error = ?e, "Dump interrupted");
                    lines.push("Unable to read the catalog".to_string());
                    break;
                },
            }
        }
        lines.join("\n")
    }
}

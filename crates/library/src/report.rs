use crate::collect::{SkipReason, Visit};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Formats an integer with `,` between groups of three digits.
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Running totals of an ingestion run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Report {
    pub directories: u64,
    pub files: u64,
    pub copied: u64,
    pub bytes: u64,
    pub failed: u64,
}
impl Report {
    /// Account for one visit.
    pub fn record(&mut self, visit: &Visit) {
        match visit {
            Visit::DirectoryEntered(_) | Visit::DirectorySkipped(_) => self.directories += 1,
            Visit::DirectoryFailed { .. } => {},
            Visit::Ingested { bytes, .. } => {
                self.files += 1;
                self.copied += 1;
                self.bytes += bytes;
            },
            Visit::Skipped { reason: SkipReason::NotRegularFile, .. } => {},
            Visit::Skipped { .. } => self.files += 1,
            Visit::Failed { .. } => {
                self.files += 1;
                self.failed += 1;
            },
        }
    }
}
impl Display for Report {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "Visited {} directories and {} files. Copied {} files, {} bytes",
            group_digits(self.directories),
            group_digits(self.files),
            group_digits(self.copied),
            group_digits(self.bytes),
        )
    }
}

/// Successes and failures of a batch file operation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: u64,
    pub failed: u64,
}

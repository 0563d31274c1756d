use derive_more::Display;
use std::collections::BTreeMap;
use std::str::FromStr;
use time::PrimitiveDateTime;

/// Which kind of metadata block a [`Directory`] was read from.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DirectoryKind {
    #[display("Exif")]
    Exif,
    #[display("QuickTime")]
    QuickTime,
    #[display("AVI")]
    Avi,
}
impl DirectoryKind {
    /// Date fields that can supply a capture timestamp for this kind of
    /// directory, in the order they should be tried.
    pub fn capture_date_tags(&self) -> &'static [DateTag] {
        match self {
            Self::Exif => &[DateTag::DateTime, DateTag::DateTimeDigitized, DateTag::DateTimeOriginal],
            Self::QuickTime => &[DateTag::CreationTime],
            Self::Avi => &[DateTag::DateTimeOriginal],
        }
    }
}
impl FromStr for DirectoryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Exif" => Ok(Self::Exif),
            "QuickTime" => Ok(Self::QuickTime),
            "AVI" => Ok(Self::Avi),
            other => Err(format!("unknown directory kind: {other}")),
        }
    }
}

/// Typed date fields a [`Directory`] may carry.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DateTag {
    #[display("Date/Time")]
    DateTime,
    #[display("Date/Time Digitized")]
    DateTimeDigitized,
    #[display("Date/Time Original")]
    DateTimeOriginal,
    #[display("Creation Time")]
    CreationTime,
}

/// One block of metadata read from a file: a kind, the human-readable tags
/// in the order they were found, and whichever dates parsed cleanly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directory {
    pub kind: DirectoryKind,
    pub tags: Vec<(String, String)>,
    pub dates: BTreeMap<DateTag, PrimitiveDateTime>,
}
impl Directory {
    pub fn new(kind: DirectoryKind) -> Self {
        Self {
            kind,
            tags: Vec::new(),
            dates: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((name.into(), value.into()));
        self
    }

    pub fn with_date(mut self, tag: DateTag, value: PrimitiveDateTime) -> Self {
        self.dates.insert(tag, value);
        self
    }

    pub fn date(&self, tag: DateTag) -> Option<PrimitiveDateTime> {
        self.dates.get(&tag).copied()
    }

    /// The first date found among [`DirectoryKind::capture_date_tags`].
    pub fn capture_date(&self) -> Option<PrimitiveDateTime> {
        self.kind.capture_date_tags().iter().find_map(|tag| self.date(*tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn exif_prefers_datetime_over_original() {
        let dir = Directory::new(DirectoryKind::Exif)
            .with_date(DateTag::DateTimeOriginal, datetime!(2019-07-04 10:00:00))
            .with_date(DateTag::DateTime, datetime!(2020-01-01 00:00:00));
        assert_eq!(dir.capture_date(), Some(datetime!(2020-01-01 00:00:00)));
    }

    #[test]
    fn exif_falls_back_through_tags() {
        let dir = Directory::new(DirectoryKind::Exif).with_date(DateTag::DateTimeOriginal, datetime!(2019-07-04 10:00:00));
        assert_eq!(dir.capture_date(), Some(datetime!(2019-07-04 10:00:00)));
    }

    #[test]
    fn quicktime_ignores_unrelated_dates() {
        let dir = Directory::new(DirectoryKind::QuickTime).with_date(DateTag::DateTime, datetime!(2019-07-04 10:00:00));
        assert_eq!(dir.capture_date(), None);
    }

    #[test]
    fn kind_round_trips_through_display() {
        for kind in [DirectoryKind::Exif, DirectoryKind::QuickTime, DirectoryKind::Avi] {
            assert_eq!(kind.to_string().parse::<DirectoryKind>().unwrap(), kind);
        }
        assert!("Xmp".parse::<DirectoryKind>().is_err());
    }
}

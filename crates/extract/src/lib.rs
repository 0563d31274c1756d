mod avi;
mod consts;
pub mod error;
mod image;
pub mod models;
mod quicktime;

use exn::OptionExt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use time::{Date, Month, PrimitiveDateTime, Time};
use tracing::instrument;

use crate::consts::{
    AVI_FORM, HEIF_BRANDS, JPEG_MAGIC, PNG_MAGIC, QUICKTIME_LEADING_ATOMS, RIFF_MAGIC, TIFF_BE_MAGIC, TIFF_LE_MAGIC,
    WEBP_FORM,
};
use crate::error::{ErrorKind, Result};
pub use crate::models::{DateTag, Directory, DirectoryKind};

/// Reads the metadata directories of a media file.
///
/// Implementations are synchronous; async callers should run them on a
/// blocking thread.
pub trait MetadataExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Vec<Directory>>;
}

/// Detected container layout, from the first few bytes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// JPEG, TIFF, PNG, WebP and HEIF: anything that stores EXIF.
    Image,
    QuickTime,
    Avi,
}

/// Sniffs the container format from the leading bytes of a file.
pub fn sniff(head: &[u8]) -> Option<Container> {
    if head.starts_with(JPEG_MAGIC)
        || head.starts_with(PNG_MAGIC)
        || head.starts_with(TIFF_LE_MAGIC)
        || head.starts_with(TIFF_BE_MAGIC)
    {
        return Some(Container::Image);
    }
    if head.starts_with(RIFF_MAGIC) && head.len() >= 12 {
        return match &head[8..12] {
            form if form == AVI_FORM => Some(Container::Avi),
            form if form == WEBP_FORM => Some(Container::Image),
            _ => None,
        };
    }
    if head.len() >= 12 {
        let atom = &head[4..8];
        if atom == b"ftyp" && HEIF_BRANDS.iter().any(|brand| &head[8..12] == brand.as_slice()) {
            return Some(Container::Image);
        }
        if QUICKTIME_LEADING_ATOMS.iter().any(|kind| atom == kind.as_slice()) {
            return Some(Container::QuickTime);
        }
    }
    None
}

/// The built-in extractor: sniffs the container and dispatches to the EXIF,
/// QuickTime or AVI reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExtractor;
impl MetadataExtractor for FileExtractor {
    #[instrument(level = "debug", skip(self))]
    fn extract(&self, path: &Path) -> Result<Vec<Directory>> {
        let file = File::open(path).map_err(ErrorKind::Io)?;
        let mut reader = BufReader::new(file);
        let mut head = [0u8; 12];
        let mut filled = 0;
        while filled < head.len() {
            match reader.read(&mut head[filled..]).map_err(ErrorKind::Io)? {
                0 => break,
                n => filled += n,
            }
        }
        reader.seek(SeekFrom::Start(0)).map_err(ErrorKind::Io)?;
        let container = sniff(&head[..filled]).ok_or_raise(|| ErrorKind::UnsupportedFormat(path.to_path_buf()))?;
        tracing::trace!(?container, "Sniffed container");
        match container {
            Container::Image => image::read(&mut reader),
            Container::QuickTime => quicktime::read(&mut reader),
            Container::Avi => avi::read(&mut reader),
        }
    }
}

/// Builds a date-time from calendar fields, `None` if any is out of range.
pub(crate) fn civil_datetime(year: i32, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Option<PrimitiveDateTime> {
    let month = Month::try_from(month).ok()?;
    let date = Date::from_calendar_date(year, month, day).ok()?;
    let time = Time::from_hms(hour, minute, second).ok()?;
    Some(PrimitiveDateTime::new(date, time))
}

pub(crate) fn display_datetime(dt: PrimitiveDateTime) -> String {
    format!("{} {:02}:{:02}:{:02}", dt.date(), dt.hour(), dt.minute(), dt.second())
}

//! EXIF blocks from still-image containers: JPEG, HEIF, TIFF, PNG and WebP.

use crate::error::{ErrorKind, Result};
use crate::models::{DateTag, Directory, DirectoryKind};
use exif::{Exif, In, Tag, Value};
use std::io::{BufRead, Seek};
use time::PrimitiveDateTime;

const DATE_FIELDS: [(Tag, DateTag); 3] = [
    (Tag::DateTime, DateTag::DateTime),
    (Tag::DateTimeDigitized, DateTag::DateTimeDigitized),
    (Tag::DateTimeOriginal, DateTag::DateTimeOriginal),
];

/// Reads the primary EXIF image from `reader`.
///
/// A container without any EXIF block is not an error: it simply has no
/// directories.
pub(crate) fn read<R: BufRead + Seek>(reader: &mut R) -> Result<Vec<Directory>> {
    let exif = match exif::Reader::new().read_from_container(reader) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_) | exif::Error::BlankValue(_)) => return Ok(Vec::new()),
        Err(exif::Error::Io(e)) => exn::bail!(ErrorKind::Io(e)),
        Err(e) => exn::bail!(ErrorKind::parse("EXIF", e.to_string())),
    };
    Ok(vec![directory(&exif)])
}

fn directory(exif: &Exif) -> Directory {
    let mut directory = Directory::new(DirectoryKind::Exif);
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let value = field.display_value().with_unit(exif).to_string();
        directory.tags.push((field.tag.to_string(), value.trim_matches('"').to_string()));
    }
    for (tag, date_tag) in DATE_FIELDS {
        if let Some(date) = exif.get_field(tag, In::PRIMARY).and_then(|f| parse_date(&f.value)) {
            directory.dates.insert(date_tag, date);
        }
    }
    directory
}

/// EXIF dates are ASCII "YYYY:MM:DD HH:MM:SS". Blank or zeroed stamps
/// ("0000:00:00 00:00:00") are common and treated as absent.
fn parse_date(value: &Value) -> Option<PrimitiveDateTime> {
    let Value::Ascii(parts) = value else {
        return None;
    };
    let raw = parts.first()?;
    match exif::DateTime::from_ascii(raw) {
        Ok(dt) => crate::civil_datetime(i32::from(dt.year), dt.month, dt.day, dt.hour, dt.minute, dt.second),
        Err(e) => {
            tracing::debug!(value = %String::from_utf8_lossy(raw), error = %e, "Ignoring unparseable EXIF date");
            None
        },
    }
}

//! AVI (RIFF) headers: the `avih` main header and the `IDIT` capture stamp.

use crate::consts::{CTIME_REGEX, MONTHS, NUMERIC_DATETIME_REGEX};
use crate::error::{ErrorKind, Result};
use crate::models::{DateTag, Directory, DirectoryKind};
use std::io::{ErrorKind as IoErrorKind, Read, Seek, SeekFrom};
use time::PrimitiveDateTime;

const FORMAT: &str = "AVI";
const MAX_CHUNKS: usize = 4096;
/// `IDIT` is a short ASCII string; anything bigger is not a date.
const MAX_IDIT_LEN: u32 = 64;

pub(crate) fn read<R: Read + Seek>(reader: &mut R) -> Result<Vec<Directory>> {
    let end = reader.seek(SeekFrom::End(0)).map_err(ErrorKind::Io)?;
    reader.seek(SeekFrom::Start(0)).map_err(ErrorKind::Io)?;
    let mut header = [0u8; 12];
    read_exact(reader, &mut header)?;
    if &header[0..4] != b"RIFF" || &header[8..12] != b"AVI " {
        exn::bail!(ErrorKind::parse(FORMAT, "missing RIFF/AVI header"));
    }
    let riff_end = end.min(8 + u64::from(le_u32(&header[4..8])));
    let mut directory = Directory::new(DirectoryKind::Avi);
    walk(reader, 12, riff_end, &mut directory, &mut 0)?;
    Ok(vec![directory])
}

fn walk<R: Read + Seek>(reader: &mut R, start: u64, limit: u64, directory: &mut Directory, seen: &mut usize) -> Result<()> {
    let mut position = start;
    while position + 8 <= limit {
        *seen += 1;
        if *seen > MAX_CHUNKS {
            exn::bail!(ErrorKind::parse(FORMAT, "too many chunks"));
        }
        reader.seek(SeekFrom::Start(position)).map_err(ErrorKind::Io)?;
        let mut header = [0u8; 8];
        read_exact(reader, &mut header)?;
        let size = le_u32(&header[4..8]);
        let body = position + 8;
        let end = body + u64::from(size);
        if end > limit {
            // Recorders that crash mid-file leave the last chunk short; what was
            // read so far is still good.
            tracing::debug!(chunk = %String::from_utf8_lossy(&header[0..4]), "AVI chunk overruns its parent");
            break;
        }
        match &header[0..4] {
            b"LIST" if size >= 4 => {
                let mut list_type = [0u8; 4];
                read_exact(reader, &mut list_type)?;
                // `movi` holds the frames themselves.
                if &list_type != b"movi" {
                    walk(reader, body + 4, end, directory, seen)?;
                }
            },
            b"avih" if size >= 40 => main_header(reader, directory)?,
            b"IDIT" if size <= MAX_IDIT_LEN => {
                let mut raw = vec![0u8; size as usize];
                read_exact(reader, &mut raw)?;
                let text = String::from_utf8_lossy(&raw).trim_matches(|c: char| c == '\0' || c.is_whitespace()).to_string();
                if let Some(date) = parse_date(&text) {
                    directory.dates.insert(DateTag::DateTimeOriginal, date);
                }
                directory.tags.push(("Datetime Original".to_string(), text));
            },
            _ => {},
        }
        // Chunks are word-aligned.
        position = end + u64::from(size & 1);
    }
    Ok(())
}

fn main_header<R: Read>(reader: &mut R, directory: &mut Directory) -> Result<()> {
    let mut avih = [0u8; 40];
    read_exact(reader, &mut avih)?;
    let micros_per_frame = le_u32(&avih[0..4]);
    let total_frames = le_u32(&avih[16..20]);
    if micros_per_frame > 0 {
        let fps = 1_000_000.0 / f64::from(micros_per_frame);
        directory.tags.push(("Frames Per Second".to_string(), format!("{fps:.2}")));
        directory.tags.push((
            "Duration".to_string(),
            format!("{:.2} seconds", f64::from(total_frames) / fps),
        ));
    }
    directory.tags.push(("Stream Count".to_string(), le_u32(&avih[24..28]).to_string()));
    directory.tags.push(("Width".to_string(), le_u32(&avih[32..36]).to_string()));
    directory.tags.push(("Height".to_string(), le_u32(&avih[36..40]).to_string()));
    Ok(())
}

/// Accepts `ctime` layout ("THU OCT 22 14:30:00 2009") and EXIF layout
/// ("2009:10:22 14:30:00").
pub(crate) fn parse_date(text: &str) -> Option<PrimitiveDateTime> {
    if let Some(captures) = CTIME_REGEX.captures(text) {
        let month_name = captures.get(1)?.as_str().to_ascii_uppercase();
        let month = MONTHS.iter().position(|m| *m == month_name)? as u8 + 1;
        return crate::civil_datetime(
            captures.get(6)?.as_str().parse().ok()?,
            month,
            captures.get(2)?.as_str().parse().ok()?,
            captures.get(3)?.as_str().parse().ok()?,
            captures.get(4)?.as_str().parse().ok()?,
            captures.get(5)?.as_str().parse().ok()?,
        );
    }
    let captures = NUMERIC_DATETIME_REGEX.captures(text)?;
    let field = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<u8>().ok());
    crate::civil_datetime(captures.get(1)?.as_str().parse().ok()?, field(2)?, field(3)?, field(4)?, field(5)?, field(6)?)
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buffer = [0u8; 4];
    buffer.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(buffer)
}

fn read_exact<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<()> {
    match reader.read_exact(buffer) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == IoErrorKind::UnexpectedEof => exn::bail!(ErrorKind::parse(FORMAT, "truncated chunk")),
        Err(e) => exn::bail!(ErrorKind::Io(e)),
    }
}

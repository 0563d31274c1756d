//! QuickTime / ISO base media (`.mov`, `.mp4`) movie headers.
//!
//! Only the `moov/mvhd` atom is read: it carries the creation and
//! modification stamps (seconds since 1904-01-01 UTC), the time scale and the
//! duration.

use crate::error::{ErrorKind, Result};
use crate::models::{DateTag, Directory, DirectoryKind};
use std::io::{ErrorKind as IoErrorKind, Read, Seek, SeekFrom};
use time::{OffsetDateTime, PrimitiveDateTime};

const FORMAT: &str = "QuickTime";
/// Seconds between 1904-01-01 and 1970-01-01.
const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;
/// Atoms nest shallowly in practice; anything deeper is treated as corrupt.
const MAX_ATOMS: usize = 4096;

#[derive(Debug, Clone, Copy)]
struct Atom {
    kind: [u8; 4],
    body: u64,
    end: u64,
}

pub(crate) fn read<R: Read + Seek>(reader: &mut R) -> Result<Vec<Directory>> {
    let end = reader.seek(SeekFrom::End(0)).map_err(ErrorKind::Io)?;
    let Some(moov) = find_atom(reader, 0, end, b"moov")? else {
        tracing::debug!("No moov atom");
        return Ok(Vec::new());
    };
    let Some(mvhd) = find_atom(reader, moov.body, moov.end, b"mvhd")? else {
        tracing::debug!("No mvhd atom inside moov");
        return Ok(Vec::new());
    };
    Ok(vec![movie_header(reader, mvhd)?])
}

fn find_atom<R: Read + Seek>(reader: &mut R, start: u64, limit: u64, kind: &[u8; 4]) -> Result<Option<Atom>> {
    let mut position = start;
    for _ in 0..MAX_ATOMS {
        let Some(atom) = atom_at(reader, position, limit)? else {
            return Ok(None);
        };
        if &atom.kind == kind {
            return Ok(Some(atom));
        }
        position = atom.end;
    }
    exn::bail!(ErrorKind::parse(FORMAT, "too many atoms"))
}

fn atom_at<R: Read + Seek>(reader: &mut R, position: u64, limit: u64) -> Result<Option<Atom>> {
    if position + 8 > limit {
        return Ok(None);
    }
    reader.seek(SeekFrom::Start(position)).map_err(ErrorKind::Io)?;
    let mut header = [0u8; 8];
    read_exact(reader, &mut header)?;
    let kind = [header[4], header[5], header[6], header[7]];
    let (size, header_len) = match u32::from_be_bytes([header[0], header[1], header[2], header[3]]) {
        0 => (limit - position, 8),
        1 => {
            let mut large = [0u8; 8];
            read_exact(reader, &mut large)?;
            (u64::from_be_bytes(large), 16)
        },
        n => (u64::from(n), 8),
    };
    if size < header_len {
        exn::bail!(ErrorKind::parse(FORMAT, format!("atom '{}' is smaller than its header", kind_name(&kind))));
    }
    let end = position.saturating_add(size);
    if end > limit {
        exn::bail!(ErrorKind::parse(FORMAT, format!("atom '{}' overruns its parent", kind_name(&kind))));
    }
    Ok(Some(Atom {
        kind,
        body: position + header_len,
        end,
    }))
}

fn movie_header<R: Read + Seek>(reader: &mut R, mvhd: Atom) -> Result<Directory> {
    reader.seek(SeekFrom::Start(mvhd.body)).map_err(ErrorKind::Io)?;
    let mut version = [0u8; 4];
    read_exact(reader, &mut version)?;
    let (created, modified, scale, duration) = match version[0] {
        0 => (
            u64::from(read_u32(reader)?),
            u64::from(read_u32(reader)?),
            read_u32(reader)?,
            u64::from(read_u32(reader)?),
        ),
        1 => (read_u64(reader)?, read_u64(reader)?, read_u32(reader)?, read_u64(reader)?),
        v => exn::bail!(ErrorKind::parse(FORMAT, format!("unknown mvhd version {v}"))),
    };

    let mut directory = Directory::new(DirectoryKind::QuickTime);
    if let Some(created) = mac_time(created) {
        directory = directory.with_tag("Creation Time", crate::display_datetime(created)).with_date(DateTag::CreationTime, created);
    }
    if let Some(modified) = mac_time(modified) {
        directory = directory.with_tag("Modification Time", crate::display_datetime(modified));
    }
    directory = directory.with_tag("Media Time Scale", scale.to_string());
    if scale > 0 {
        directory = directory.with_tag("Duration", format!("{:.2} seconds", duration as f64 / f64::from(scale)));
    }
    Ok(directory)
}

/// Zero means "never set", not midnight on 1904-01-01.
fn mac_time(seconds: u64) -> Option<PrimitiveDateTime> {
    if seconds == 0 {
        return None;
    }
    let unix = i64::try_from(seconds).ok()?.checked_sub(MAC_EPOCH_OFFSET)?;
    let utc = OffsetDateTime::from_unix_timestamp(unix).ok()?;
    Some(PrimitiveDateTime::new(utc.date(), utc.time()))
}

fn read_exact<R: Read>(reader: &mut R, buffer: &mut [u8]) -> Result<()> {
    match reader.read_exact(buffer) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == IoErrorKind::UnexpectedEof => exn::bail!(ErrorKind::parse(FORMAT, "truncated atom")),
        Err(e) => exn::bail!(ErrorKind::Io(e)),
    }
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buffer = [0u8; 4];
    read_exact(reader, &mut buffer)?;
    Ok(u32::from_be_bytes(buffer))
}

fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut buffer = [0u8; 8];
    read_exact(reader, &mut buffer)?;
    Ok(u64::from_be_bytes(buffer))
}

fn kind_name(kind: &[u8; 4]) -> String {
    String::from_utf8_lossy(kind).into_owned()
}

use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// `ctime`-style stamp written by most cameras into the AVI `IDIT` chunk:
// "THU OCT 22 14:30:00 2009".
regex!(
    CTIME_REGEX,
    r"(?i)^\s*[a-z]{3}\s+([a-z]{3})\s+(\d{1,2})\s+(\d{1,2}):(\d{2}):(\d{2})\s+(\d{4})"
);
// Some encoders use the EXIF layout instead: "2009:10:22 14:30:00".
regex!(NUMERIC_DATETIME_REGEX, r"^\s*(\d{4})[:/-](\d{1,2})[:/-](\d{1,2})[ T](\d{1,2}):(\d{2}):(\d{2})");

pub(crate) const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
pub(crate) const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
pub(crate) const TIFF_LE_MAGIC: &[u8] = b"II*\0";
pub(crate) const TIFF_BE_MAGIC: &[u8] = b"MM\0*";
pub(crate) const RIFF_MAGIC: &[u8] = b"RIFF";
pub(crate) const AVI_FORM: &[u8] = b"AVI ";
pub(crate) const WEBP_FORM: &[u8] = b"WEBP";

/// ISO base media brands that carry still images (HEIF/HEIC/AVIF); EXIF lives
/// in their `meta` box rather than in a QuickTime `mvhd`.
pub(crate) const HEIF_BRANDS: &[&[u8; 4]] = &[b"heic", b"heix", b"heim", b"heis", b"mif1", b"msf1", b"avif"];

/// Top-level atoms a QuickTime/MP4 file may open with.
pub(crate) const QUICKTIME_LEADING_ATOMS: &[&[u8; 4]] =
    &[b"ftyp", b"moov", b"mdat", b"wide", b"free", b"skip", b"pnot"];

pub(crate) const MONTHS: [&str; 12] = ["JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC"];

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use log::{debug, warn};
use serde::Serialize;

use crate::error::{Error, IoResultExt, Result};
use crate::filename::FilenameInfo;
use crate::media;

const EXIF_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const EXIF_FORMAT_TZ: &str = "%Y:%m:%d %H:%M:%S%:z";
const FILENAME_FORMAT: &str = "%Y.%m.%d_%H.%M.%S";
const FILENAME_FORMAT_TZ: &str = "%Y.%m.%d_%H.%M.%S%z";

/// Where a resolved timestamp came from. Reported, never acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// `DateTimeOriginal` plus `OffsetTimeOriginal`
    Exif,
    /// `DateTimeOriginal` alone
    ExifNoTz,
    /// Recovered from a filename written by a previous run
    Filename,
    /// Filesystem creation/modification time
    Ctime,
}

impl TimestampSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampSource::Exif => "exif",
            TimestampSource::ExifNoTz => "exif_no_tz",
            TimestampSource::Filename => "filename",
            TimestampSource::Ctime => "ctime",
        }
    }
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// When a file was created, with its UTC offset when one is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTime {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl CaptureTime {
    fn local(&self) -> NaiveDateTime {
        match self {
            CaptureTime::Zoned(dt) => dt.naive_local(),
            CaptureTime::Naive(dt) => *dt,
        }
    }

    pub fn year(&self) -> i32 {
        self.local().year()
    }

    pub fn month(&self) -> u32 {
        self.local().month()
    }

    /// `2020.08.27_11.00.00+0100`, or without the offset when it is unknown.
    pub fn canonical(&self) -> String {
        match self {
            CaptureTime::Zoned(dt) => dt.format(FILENAME_FORMAT_TZ).to_string(),
            CaptureTime::Naive(dt) => dt.format(FILENAME_FORMAT).to_string(),
        }
    }
}

impl fmt::Display for CaptureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureTime::Zoned(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%:z")),
            CaptureTime::Naive(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl Serialize for CaptureTime {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Resolve the creation time of `path`, first success wins:
/// EXIF, then a previous run's filename, then filesystem times.
///
/// Absent or unparsable metadata falls through to the next source. Only
/// hard I/O failures are returned as errors.
pub fn resolve_timestamp(
    path: &Path,
    info: Option<&FilenameInfo>,
) -> Result<(CaptureTime, TimestampSource)> {
    if media::is_exif_capable(path) {
        if let Some(resolved) = from_exif(path)? {
            return Ok(resolved);
        }
    }

    if let Some(info) = info.filter(|i| !i.original_name.is_empty()) {
        match from_filename(info) {
            Some(time) => return Ok((time, TimestampSource::Filename)),
            None => warn!(
                "{}: unparsable date {:?} in filename, using filesystem time",
                path.display(),
                info.datetime_string()
            ),
        }
    }

    Ok((from_filesystem(path)?, TimestampSource::Ctime))
}

fn from_exif(path: &Path) -> Result<Option<(CaptureTime, TimestampSource)>> {
    let file = File::open(path).at(path)?;
    let exif = match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif,
        // A truncated container is unparsable, not an I/O failure.
        Err(exif::Error::Io(e)) if e.kind() != io::ErrorKind::UnexpectedEof => {
            return Err(Error::Exif {
                path: path.to_path_buf(),
                source: exif::Error::Io(e),
            });
        }
        Err(e) => {
            debug!("{}: no EXIF data ({})", path.display(), e);
            return Ok(None);
        }
    };

    let Some(taken) = ascii_field(&exif, Tag::DateTimeOriginal) else {
        debug!("{}: no DateTimeOriginal tag", path.display());
        return Ok(None);
    };

    if let Some(offset) = ascii_field(&exif, Tag::OffsetTimeOriginal) {
        match DateTime::parse_from_str(&format!("{}{}", taken, offset), EXIF_FORMAT_TZ) {
            Ok(dt) => return Ok(Some((CaptureTime::Zoned(dt), TimestampSource::Exif))),
            Err(e) => debug!(
                "{}: ignoring OffsetTimeOriginal {:?} ({})",
                path.display(),
                offset,
                e
            ),
        }
    }

    match NaiveDateTime::parse_from_str(&taken, EXIF_FORMAT) {
        Ok(dt) => Ok(Some((CaptureTime::Naive(dt), TimestampSource::ExifNoTz))),
        Err(e) => {
            warn!(
                "{}: unparsable DateTimeOriginal {:?} ({})",
                path.display(),
                taken,
                e
            );
            Ok(None)
        }
    }
}

fn ascii_field(exif: &exif::Exif, tag: Tag) -> Option<String> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|raw| String::from_utf8_lossy(raw).trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn from_filename(info: &FilenameInfo) -> Option<CaptureTime> {
    let s = info.datetime_string();
    if info.offset.is_some() {
        DateTime::parse_from_str(&s, FILENAME_FORMAT_TZ)
            .ok()
            .map(CaptureTime::Zoned)
    } else {
        NaiveDateTime::parse_from_str(&s, FILENAME_FORMAT)
            .ok()
            .map(CaptureTime::Naive)
    }
}

/// Earlier of creation and modification time, in local time.
fn from_filesystem(path: &Path) -> Result<CaptureTime> {
    let meta = fs::metadata(path).at(path)?;
    let modified = meta.modified().at(path)?;
    let earliest = match meta.created() {
        Ok(created) => created.min(modified),
        Err(_) => modified,
    };
    let local: DateTime<Local> = earliest.into();
    Ok(CaptureTime::Zoned(local.fixed_offset()))
}

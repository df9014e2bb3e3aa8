use regex::{Captures, Regex};
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;

/// Naming conventions written by earlier and current runs, oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameFormat {
    /// `2021.01.29_17.17.31_60132e3223bcaafe_IMG_E8373.JPG`
    UnderscoreHashed,
    /// `2008.05.17-12.52.06_IMG_3761 (1).jpeg`
    Plain,
    /// `2022.07.06_14.21.40+0000-c273bdc6833b42d7-DSCF0033.JPG.xmp`
    Current,
    /// `2022.07.06_14.21.40-c273bdc6833b42d7-DSCF0033.JPG`
    CurrentNoOffset,
}

/// Fragments captured from a filename produced by a previous run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameInfo {
    pub format: FilenameFormat,
    pub year: String,
    pub month: String,
    pub day: String,
    pub hour: String,
    pub minute: String,
    pub second: String,
    /// Signed `+hhmm` / `-hhmm`, when the format records one
    pub offset: Option<String>,
    pub hash: Option<String>,
    pub original_name: String,
}

impl FilenameInfo {
    /// `YYYY.MM.DD_hh.mm.ss` followed by the offset, if any.
    pub fn datetime_string(&self) -> String {
        format!(
            "{}.{}.{}_{}.{}.{}{}",
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.offset.as_deref().unwrap_or("")
        )
    }
}

struct FilenamePattern {
    regex: &'static LazyLock<Regex>,
    format: FilenameFormat,
}

const DATE: &str = r"(?P<year>\d{4})\.(?P<month>\d{2})\.(?P<day>\d{2})";
const TIME: &str = r"(?P<hour>\d{2})\.(?P<minute>\d{2})\.(?P<second>\d{2})";

static RE_UNDERSCORE_HASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{DATE}_{TIME}_(?P<hash>[0-9a-f]+)_(?P<name>.*)")).unwrap()
});
static RE_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"{DATE}-{TIME}_(?P<name>.*)")).unwrap());
static RE_CURRENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"{DATE}_{TIME}(?P<offset>[+-]\d{{4}})-(?P<hash>[0-9a-f]+)-(?P<name>.*)"
    ))
    .unwrap()
});
static RE_CURRENT_NO_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{DATE}_{TIME}-(?P<hash>[0-9a-f]{{16}})-(?P<name>.*)")).unwrap()
});

static PATTERNS: &[FilenamePattern] = &[
    FilenamePattern { regex: &RE_UNDERSCORE_HASHED, format: FilenameFormat::UnderscoreHashed },
    FilenamePattern { regex: &RE_PLAIN, format: FilenameFormat::Plain },
    FilenamePattern { regex: &RE_CURRENT, format: FilenameFormat::Current },
    FilenamePattern { regex: &RE_CURRENT_NO_OFFSET, format: FilenameFormat::CurrentNoOffset },
];

impl FilenamePattern {
    fn matches(&self, filename: &str) -> Option<FilenameInfo> {
        let caps = self.regex.captures(filename)?;
        let group = |caps: &Captures, name: &str| caps.name(name).map(|m| m.as_str().to_string());
        Some(FilenameInfo {
            format: self.format,
            year: group(&caps, "year")?,
            month: group(&caps, "month")?,
            day: group(&caps, "day")?,
            hour: group(&caps, "hour")?,
            minute: group(&caps, "minute")?,
            second: group(&caps, "second")?,
            offset: group(&caps, "offset"),
            hash: group(&caps, "hash"),
            original_name: group(&caps, "name")?,
        })
    }
}

/// Recognize a filename written by a previous run. Purely syntactic: the
/// captured date is not range-checked here.
pub fn parse_filename(filename: &str) -> Option<FilenameInfo> {
    PATTERNS.iter().find_map(|pat| pat.matches(filename))
}

static RE_TIMESTAMP_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}\.\d{2}\.\d{2}_\d{2}\.\d{2}\.\d{2}(?:[+-]\d{4})?-").unwrap()
});

/// `filename` without a leading `<timestamp>-` written by a previous run.
pub fn strip_timestamp_prefix(filename: &str) -> &str {
    match RE_TIMESTAMP_PREFIX.find(filename) {
        Some(m) if m.end() < filename.len() => &filename[m.end()..],
        _ => filename,
    }
}

// Timestamp (with optional offset), fingerprint field, name.
static RE_CANONICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}\.\d{2}\.\d{2}_\d{2}\.\d{2}\.\d{2}(?:[+-]\d{4})?-(?P<hash>[^-]*)-(?P<name>.+)$")
        .unwrap()
});

/// Fingerprint recorded in a canonical media destination name.
///
/// The timestamp component is skipped before splitting on `-`, so a negative
/// UTC offset does not shift the fields.
pub fn embedded_fingerprint(path: &Path) -> Result<Fingerprint> {
    let malformed = |reason: String| Error::MalformedName {
        path: path.to_path_buf(),
        reason,
    };

    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| malformed("not valid UTF-8".to_string()))?;

    let caps = RE_CANONICAL.captures(name).ok_or_else(|| {
        malformed("expected <timestamp>-<fingerprint>-<name>".to_string())
    })?;
    let hash = &caps["hash"];
    if hash.len() != 16 {
        return Err(malformed(format!(
            "expected a 16 character fingerprint, found {:?}",
            hash
        )));
    }
    hash.parse()
        .map_err(|_| malformed(format!("fingerprint {:?} is not hexadecimal", hash)))
}

use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filename::{parse_filename, strip_timestamp_prefix};
use crate::fingerprint::{fingerprint_file, Fingerprint};
use crate::media;
use crate::timestamp::{resolve_timestamp, CaptureTime, TimestampSource};

/// How non-media (sidecar) files are named in the destination tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidecarNaming {
    /// Keep the filename exactly as found.
    #[default]
    Bare,
    /// Prefix the timestamp: `<timestamp>-<name>`. A timestamp prefix from a
    /// previous run is replaced, not stacked.
    Timestamped,
}

/// Where a source file belongs in the destination tree.
#[derive(Debug, Clone)]
pub struct Destination {
    pub path: PathBuf,
    pub time: CaptureTime,
    pub source: TimestampSource,
    pub is_media: bool,
    /// Fingerprint of the source, computed for media files only
    pub fingerprint: Option<Fingerprint>,
}

/// `<base>/<YYYY>/<MM>/<name>` for `source`.
///
/// Media files are named `<timestamp>-<fingerprint>-<name>`. When the source
/// was named by a previous run, its recovered original name is used so
/// prefixes don't pile up.
pub fn destination_for(
    source: &Path,
    base_dir: &Path,
    sidecar_naming: SidecarNaming,
) -> Result<Destination> {
    let current_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::MalformedName {
            path: source.to_path_buf(),
            reason: "not valid UTF-8".to_string(),
        })?;

    let info = parse_filename(current_name);
    if let Some(info) = &info {
        debug!("{}: matched {:?} naming", source.display(), info.format);
    }

    let (time, time_source) = resolve_timestamp(source, info.as_ref())?;
    let is_media = media::is_media(source);

    let (filename, fingerprint) = if is_media {
        let name = info
            .as_ref()
            .map(|i| i.original_name.as_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(current_name);
        let fingerprint = fingerprint_file(source)?;
        (format!("{}-{}-{}", time.canonical(), fingerprint, name), Some(fingerprint))
    } else {
        let name = match sidecar_naming {
            SidecarNaming::Bare => current_name.to_string(),
            SidecarNaming::Timestamped => {
                format!("{}-{}", time.canonical(), strip_timestamp_prefix(current_name))
            }
        };
        (name, None)
    };

    let path = base_dir
        .join(format!("{:04}", time.year()))
        .join(format!("{:02}", time.month()))
        .join(filename);

    Ok(Destination {
        path,
        time,
        source: time_source,
        is_media,
        fingerprint,
    })
}

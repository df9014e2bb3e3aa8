use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use filetime::FileTime;
use log::{debug, warn};
use serde::Serialize;

use crate::error::{Error, IoResultExt, Result};
use crate::filename::embedded_fingerprint;
use crate::fingerprint::fingerprint_file;
use crate::naming::{destination_for, Destination};
use crate::timestamp::TimestampSource;
use crate::ProcessOptions;

/// What was found at the destination path before acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationState {
    Absent,
    ExistsValid,
    /// Contents don't match the fingerprint in the destination's name
    ExistsInvalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Skip,
    Repair,
    Write,
}

impl From<DestinationState> for Action {
    fn from(state: DestinationState) -> Self {
        match state {
            DestinationState::Absent => Action::Write,
            DestinationState::ExistsValid => Action::Skip,
            DestinationState::ExistsInvalid => Action::Repair,
        }
    }
}

/// One line of output per placed file.
#[derive(Debug, Clone, Serialize)]
pub struct PlacementReport {
    pub index: usize,
    pub total: usize,
    pub dry_run: bool,
    pub exists: bool,
    pub is_media: bool,
    pub invalid: bool,
    pub action: Action,
    pub bytes_written: u64,
    pub time_source: TimestampSource,
    pub source_name: String,
    pub destination: PathBuf,
}

fn yes_no(b: bool) -> char {
    if b {
        'y'
    } else {
        'n'
    }
}

impl fmt::Display for PlacementReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            f.write_str("(dry run) ")?;
        }
        write!(
            f,
            "[{:4}/{:4}] (exists? {}) (media? {}) (invalid? {}) (wrote {:8}b) (time from {:>10}) {}  ->  {}",
            self.index,
            self.total,
            yes_no(self.exists),
            yes_no(self.is_media),
            yes_no(self.invalid),
            self.bytes_written,
            self.time_source,
            self.source_name,
            self.destination.display()
        )
    }
}

/// Decide whether an existing destination can be kept.
///
/// Media destinations are checked against the fingerprint recorded in their
/// own name. Sidecars carry no fingerprint and are always kept.
pub fn check_destination(dest: &Destination) -> Result<DestinationState> {
    let meta = match fs::metadata(&dest.path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DestinationState::Absent),
        Err(source) => {
            return Err(Error::Io {
                path: dest.path.clone(),
                source,
            })
        }
    };
    if !meta.is_file() {
        return Err(Error::NotAFile(dest.path.clone()));
    }
    if !dest.is_media {
        return Ok(DestinationState::ExistsValid);
    }

    let recorded = embedded_fingerprint(&dest.path)?;
    let actual = fingerprint_file(&dest.path)?;
    if recorded == actual {
        Ok(DestinationState::ExistsValid)
    } else {
        warn!(
            "{}: contents hash to {}, expected {}",
            dest.path.display(),
            actual,
            recorded
        );
        Ok(DestinationState::ExistsInvalid)
    }
}

/// Copy `source` to `dest` through a hidden `.partial` sibling, carrying over
/// the source's modification time. Only a complete copy is renamed into place.
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64> {
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let partial = dest.with_file_name(format!(".{}.partial", name));

    let result = write_partial(source, &partial).and_then(|bytes| {
        fs::rename(&partial, dest).at(dest)?;
        Ok(bytes)
    });
    if result.is_err() {
        let _ = fs::remove_file(&partial);
    }
    result
}

fn write_partial(source: &Path, partial: &Path) -> Result<u64> {
    let mut src = File::open(source).at(source)?;
    let mtime = FileTime::from_last_modification_time(&src.metadata().at(source)?);

    let mut out = BufWriter::new(File::create(partial).at(partial)?);
    let bytes = io::copy(&mut src, &mut out).at(partial)?;
    let file = out.into_inner().map_err(|e| e.into_error()).at(partial)?;
    file.sync_all().at(partial)?;
    drop(file);

    filetime::set_file_mtime(partial, mtime).at(partial)?;
    Ok(bytes)
}

/// Place one source file: name it, check what is already there, then skip,
/// repair or write. `index` is 1-based.
///
/// A dry run makes no changes at all: no directories, no deletions, no copies.
pub fn place_file(
    source: &Path,
    options: &ProcessOptions,
    index: usize,
    total: usize,
) -> Result<PlacementReport> {
    let dest = destination_for(source, &options.destination_dir, options.sidecar_naming)?;

    if !options.dry_run {
        if let Some(parent) = dest.path.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
    }

    let state = check_destination(&dest)?;
    let action = Action::from(state);
    debug!("{} -> {:?} ({:?})", source.display(), action, state);

    let mut bytes_written = 0;
    if !options.dry_run {
        if state == DestinationState::ExistsInvalid {
            fs::remove_file(&dest.path).at(&dest.path)?;
        }
        if action != Action::Skip {
            bytes_written = copy_file(source, &dest.path)?;
        }
    }

    Ok(PlacementReport {
        index,
        total,
        dry_run: options.dry_run,
        exists: state != DestinationState::Absent,
        is_media: dest.is_media,
        invalid: state == DestinationState::ExistsInvalid,
        action,
        bytes_written,
        time_source: dest.source,
        source_name: source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        destination: dest.path,
    })
}

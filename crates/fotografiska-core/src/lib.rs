pub mod error;
pub mod filename;
pub mod fingerprint;
pub mod media;
pub mod naming;
pub mod placement;
pub mod timestamp;
pub mod walk;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use error::{Error, Result};
pub use naming::SidecarNaming;
pub use placement::{Action, PlacementReport};
pub use timestamp::{CaptureTime, TimestampSource};

fn default_recursive() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessOptions {
    pub source_dir: PathBuf,
    /// Must already exist
    pub destination_dir: PathBuf,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_recursive")]
    pub recursive: bool,
    #[serde(default)]
    pub sidecar_naming: SidecarNaming,
}

/// Per-action counts for one run. In a dry run these are planned actions and
/// `bytes_written` stays 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub dry_run: bool,
    pub total: u64,
    pub written: u64,
    pub repaired: u64,
    pub skipped: u64,
    pub bytes_written: u64,
}

impl fmt::Display for ProcessResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dry_run {
            write!(
                f,
                "(dry run) {} files, {} to write, {} to repair, {} to skip",
                self.total, self.written, self.repaired, self.skipped
            )
        } else {
            write!(
                f,
                "{} files, {} written, {} repaired, {} skipped, {} bytes",
                self.total, self.written, self.repaired, self.skipped, self.bytes_written
            )
        }
    }
}

/// Callback invoked once per file, in traversal order
pub type ReportCallback<'a> = dyn FnMut(&PlacementReport) + 'a;

fn require_dir(path: &Path) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(Error::NotADirectory(path.to_path_buf())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::MissingDirectory(path.to_path_buf()))
        }
        Err(source) => Err(Error::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Sort every file under the source directory into the destination tree.
///
/// Files are handled one at a time; the first error stops the run. Running
/// again over the same trees writes nothing new.
pub fn process(options: &ProcessOptions, on_report: &mut ReportCallback<'_>) -> Result<ProcessResult> {
    require_dir(&options.source_dir)?;
    require_dir(&options.destination_dir)?;

    let sources = walk::collect_sources(&options.source_dir, options.recursive)?;
    let total = sources.len();
    log::info!(
        "Found {} files in {}",
        total,
        options.source_dir.display()
    );

    let mut result = ProcessResult {
        dry_run: options.dry_run,
        total: total as u64,
        ..Default::default()
    };
    for (i, source) in sources.iter().enumerate() {
        let report = placement::place_file(source, options, i + 1, total)?;
        match report.action {
            Action::Write => result.written += 1,
            Action::Repair => result.repaired += 1,
            Action::Skip => result.skipped += 1,
        }
        result.bytes_written += report.bytes_written;
        on_report(&report);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_marks_dry_run() {
        let mut result = ProcessResult {
            dry_run: true,
            total: 3,
            written: 2,
            skipped: 1,
            ..Default::default()
        };
        assert_eq!(
            result.to_string(),
            "(dry run) 3 files, 2 to write, 0 to repair, 1 to skip"
        );

        result.dry_run = false;
        result.bytes_written = 42;
        assert_eq!(
            result.to_string(),
            "3 files, 2 written, 0 repaired, 1 skipped, 42 bytes"
        );
    }
}

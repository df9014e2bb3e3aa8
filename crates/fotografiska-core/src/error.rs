use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fatal conditions. Any of these stops the whole run.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Directory does not exist: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("Expected a directory, but it wasn't: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Destination exists but is not a regular file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Read zero bytes from non-empty file: {}", .0.display())]
    EmptyRead(PathBuf),

    #[error("Malformed destination filename {}: {reason}", .path.display())]
    MalformedName { path: PathBuf, reason: String },

    #[error("Failed to read EXIF data from {}: {source}", .path.display())]
    Exif {
        path: PathBuf,
        #[source]
        source: exif::Error,
    },

    #[error("Directory traversal failed: {0}")]
    Walk(#[from] walkdir::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Attach the offending path to an `io::Error`.
pub(crate) trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

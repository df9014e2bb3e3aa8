use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::Result;

/// Regular files under `dir`, in file-name order. Symlinks are not followed.
pub fn collect_sources(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(dir).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        } else {
            log::trace!("Skipping non-file entry: {}", entry.path().display());
        }
    }
    Ok(files)
}

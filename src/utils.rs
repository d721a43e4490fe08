//! Filesystem helpers shared by the loaders and the sequence driver.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Fail with `MissingPath` unless `path` exists.
pub fn require_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::MissingPath(path.to_path_buf()));
    }
    Ok(())
}

/// Absolute, symlink-free form of an existing path.
pub fn absolute_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    fs::canonicalize(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::MissingPath(path.to_path_buf()),
        _ => Error::IoError(e),
    })
}

/// Sub-directories of `dir`, sorted by name.
pub fn sorted_subdirectories<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir.as_ref())? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Frame index embedded in a file name like `bear01_0042.json`.
///
/// The index is the integer after the last `_` of the file stem.
pub fn frame_index_from_path<P: AsRef<Path>>(path: P) -> Option<usize> {
    let stem = path.as_ref().file_stem()?.to_str()?;
    let (_, index) = stem.rsplit_once('_')?;
    index.parse().ok()
}

/// File name of a path as UTF-8, or an empty string.
pub fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

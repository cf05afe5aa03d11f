//! Static asset overlay.
//!
//! Copies a front-end asset tree (HTML, JS, CSS) over the destination root
//! before the build writes its own artifacts. Existing files are replaced;
//! files the overlay does not mention are left alone, so repeated builds
//! do not disturb `scaled/`, `json/`, or the catalog document.
//!
//! With `symlink` set, files are linked instead of copied, so asset edits
//! show up without re-running the build.

use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("overlay source is not a directory: {0}")]
    NotADirectory(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("overlay walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Copy (or symlink) every file under `source` to the same relative path
/// under `dest`. Returns the number of files placed.
pub fn apply(source: &Path, dest: &Path, symlink: bool) -> Result<usize, OverlayError> {
    if !source.is_dir() {
        return Err(OverlayError::NotADirectory(source.display().to_string()));
    }

    let mut placed = 0;
    for entry in WalkDir::new(source) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| io::Error::other(e.to_string()))?;
        let target = dest.join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        place_file(entry.path(), &target, symlink)?;
        placed += 1;
    }
    Ok(placed)
}

fn place_file(source: &Path, target: &Path, symlink: bool) -> io::Result<()> {
    // Replace, never merge. Removing first also clears a stale symlink
    // whose presence would make `copy` write through to the asset tree.
    match fs::remove_file(target) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    if symlink {
        symlink_file(&fs::canonicalize(source)?, target)
    } else {
        fs::copy(source, target).map(|_| ())
    }
}

#[cfg(unix)]
fn symlink_file(source: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, dest)
}

#[cfg(not(unix))]
fn symlink_file(source: &Path, dest: &Path) -> io::Result<()> {
    // No portable file symlink here; fall back to a copy.
    fs::copy(source, dest).map(|_| ())
}

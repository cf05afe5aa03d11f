//! Source tree scanning.
//!
//! Walks the source directory and produces one [`SourceItem`] per plausible
//! image file, carrying its path relative to the root and its modification
//! time. The scan is complete and cheap — it reads directory entries and
//! stat data only, never file contents — so it runs fresh on every build.
//! The change detector then decides what actually needs work.
//!
//! Hidden files and hidden directories (leading `.`) are skipped, as is
//! anything without a recognized image extension.

use crate::types::SourceItem;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("source is not a directory: {0}")]
    NotADirectory(PathBuf),
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tif", "tiff"];

/// Walk `root` and collect every image file, ordered by relative path.
pub fn scan(root: &Path) -> Result<Vec<SourceItem>, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut items = Vec::new();
    // Depth 0 is the root itself; its name (which may well start with a
    // dot) must not hide the whole tree.
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }
        let rel_path = entry
            .path()
            .strip_prefix(root)
            .expect("walk entries stay under root")
            .to_string_lossy()
            .replace('\\', "/");
        let mtime_ms = mtime_millis(&entry.metadata()?);
        items.push(SourceItem { rel_path, mtime_ms });
    }

    items.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    Ok(items)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn mtime_millis(meta: &std::fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

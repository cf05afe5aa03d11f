//! Derived artifact layout, freshness checks, and orphan cleanup.
//!
//! Every catalog image is published in a fixed set of size classes under
//! `<dest>/scaled/<label>/<rel-path>`. Output paths are a deterministic
//! function of the relative path and the size label, which is what makes
//! jobs idempotent: re-running a job overwrites its own outputs and can
//! never duplicate them.
//!
//! Freshness is mtime-based, exactly like the source scan: an artifact is
//! current when it exists and is no older than its source. Cleanup walks the
//! size directories and deletes anything whose relative path is not in the
//! kept set — this is the single mechanism that removes artifacts of pruned
//! *and* excluded records.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use walkdir::WalkDir;

/// How a derived image relates to its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSpec {
    /// Fit within `n`×`n`, preserving aspect.
    Max(u32),
    /// Fill `n`×`n`, cropping overflow (thumbnail grids).
    Min(u32),
    /// Verbatim copy (or link) of the source.
    Original,
}

/// A published size: its directory label plus the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeClass {
    pub label: &'static str,
    pub spec: SizeSpec,
}

/// Grid thumbnails: crop-to-fill squares.
pub const THUMB: SizeClass = SizeClass { label: "150", spec: SizeSpec::Min(150) };
/// Screen-sized fit-within rendition.
pub const SCREEN: SizeClass = SizeClass { label: "1000", spec: SizeSpec::Max(1000) };
/// Full-resolution copy, published only when the originals policy allows.
pub const ORIGINAL: SizeClass = SizeClass { label: "original", spec: SizeSpec::Original };

/// The active size classes for a build.
pub fn size_classes(publish_originals: bool) -> Vec<SizeClass> {
    let mut classes = vec![THUMB, SCREEN];
    if publish_originals {
        classes.push(ORIGINAL);
    }
    classes
}

fn scaled_root(dest: &Path) -> PathBuf {
    dest.join("scaled")
}

/// Deterministic output path for one (size, source) pair.
pub fn artifact_path(dest: &Path, class: SizeClass, rel_path: &str) -> PathBuf {
    scaled_root(dest).join(class.label).join(rel_path)
}

/// Whether every active size of `rel_path` exists and is at least as new as
/// the source mtime. Any unreadable artifact counts as stale.
pub fn up_to_date(dest: &Path, classes: &[SizeClass], rel_path: &str, source_mtime_ms: u64) -> bool {
    classes.iter().all(|class| {
        let path = artifact_path(dest, *class, rel_path);
        artifact_mtime_ms(&path).is_some_and(|m| m >= source_mtime_ms)
    })
}

fn artifact_mtime_ms(path: &Path) -> Option<u64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    Some(modified.duration_since(UNIX_EPOCH).ok()?.as_millis() as u64)
}

/// Delete every derived file whose relative path is not in `kept`.
///
/// Size directories that are no longer active (e.g. `original/` after the
/// policy switched to omit) are removed wholesale. Returns the number of
/// files deleted.
pub fn clean_orphans(
    dest: &Path,
    classes: &[SizeClass],
    kept: &BTreeSet<String>,
) -> io::Result<usize> {
    let root = scaled_root(dest);
    if !root.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(&root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let label = entry.file_name().to_string_lossy().into_owned();
        let size_dir = entry.path();

        if !classes.iter().any(|c| c.label == label) {
            removed += count_files(&size_dir)?;
            fs::remove_dir_all(&size_dir)?;
            continue;
        }

        for file in WalkDir::new(&size_dir) {
            let file = file.map_err(io::Error::other)?;
            if !file.file_type().is_file() {
                continue;
            }
            let rel = file
                .path()
                .strip_prefix(&size_dir)
                .expect("walk entries stay under the size dir")
                .to_string_lossy()
                .replace('\\', "/");
            if !kept.contains(&rel) {
                fs::remove_file(file.path())?;
                removed += 1;
            }
        }
        prune_empty_dirs(&size_dir)?;
    }
    Ok(removed)
}

fn count_files(dir: &Path) -> io::Result<usize> {
    let mut n = 0;
    for entry in WalkDir::new(dir) {
        if entry.map_err(io::Error::other)?.file_type().is_file() {
            n += 1;
        }
    }
    Ok(n)
}

/// Remove directories left empty by cleanup, deepest first. The size
/// directory itself is kept.
fn prune_empty_dirs(size_dir: &Path) -> io::Result<()> {
    let mut dirs: Vec<PathBuf> = WalkDir::new(size_dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for dir in dirs {
        // Fails while non-empty; that is the signal to keep it.
        let _ = fs::remove_dir(&dir);
    }
    Ok(())
}

//! Shared types for the catalog pipeline.
//!
//! These types are serialized into the catalog document and the generated
//! index artifacts, so their JSON field names are part of the on-disk
//! contract consumed by the front end.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// One image found by a source scan. Ephemeral — recomputed from a full
/// walk on every run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    /// Path relative to the source root, `/`-separated.
    pub rel_path: String,
    /// Source file modification time, epoch milliseconds.
    pub mtime_ms: u64,
}

/// Canonical persisted metadata for one source image.
///
/// Only successfully processed images become records; a failed job never
/// reaches the catalog (see [`JobError`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    /// Derived from the relative path via [`id_from_rel_path`]. Unique.
    pub id: String,
    /// Source path relative to the source root.
    pub file: String,
    /// IPTC keywords plus any synthesized tags (e.g. star ratings).
    pub keywords: Vec<String>,
    pub width: u32,
    pub height: u32,
    /// Capture time, epoch milliseconds (the front end expects JS millis).
    pub taken: i64,
    /// Month bucket derived from `taken`, `YYYY-MM`.
    pub month: String,
    /// Remaining extracted metadata, keyed by display label.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub exif: BTreeMap<String, String>,
    /// Source mtime (epoch ms) at the last successful processing. The
    /// change detector compares this against a fresh scan.
    pub timestamp: u64,
}

/// Derive a filesystem/URL-safe id from a relative source path.
///
/// Path separators become dashes, so `trips/2020/dawn.jpg` →
/// `trips-2020-dawn.jpg`.
pub fn id_from_rel_path(rel_path: &str) -> String {
    rel_path.replace(['/', '\\'], "-")
}

/// Why a single job failed. Per-item failures are contained: the item is
/// dropped from the catalog merge and the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobErrorKind {
    /// Capture timestamp absent or unparseable. Kept as its own variant so
    /// tests and summaries can name it.
    #[error("no capture timestamp")]
    MissingTimestamp,
    #[error("metadata extraction failed: {0}")]
    Extract(String),
    #[error("derived image generation failed: {0}")]
    Derive(String),
}

/// An error-tagged job result: the file it belongs to plus the failure kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}: {kind}")]
pub struct JobError {
    pub file: String,
    pub kind: JobErrorKind,
}

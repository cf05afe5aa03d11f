//! Media backend trait and shared types.
//!
//! The [`MediaBackend`] trait is the seam between the pipeline core and the
//! external tooling that actually reads metadata and produces derived
//! images. The production implementation is
//! [`MagickBackend`](super::magick::MagickBackend), which shells out to
//! ImageMagick; tests use a recording mock so the whole pipeline runs
//! without any external tool installed.

use crate::derived::SizeSpec;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("tool failed: {0}")]
    Tool(String),
}

/// Raw extraction result for one file: pixel dimensions plus the unmapped
/// field values, keyed by the probe tag that produced them.
///
/// A missing capture time is *not* a backend error — the field is simply
/// absent from the map, and the record builder decides what that means.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProbe {
    pub width: u32,
    pub height: u32,
    pub fields: BTreeMap<String, String>,
}

/// The two operations every backend must support.
///
/// `Sync` because probes and derivations run concurrently on the worker
/// pool; implementations must not share mutable state across calls.
pub trait MediaBackend: Sync {
    /// Extract dimensions and raw metadata fields from a source image.
    fn probe(&self, path: &Path) -> Result<RawProbe, BackendError>;

    /// Produce one derived rendition of `source` at `dest`, creating any
    /// missing destination directories.
    fn derive(&self, source: &Path, dest: &Path, spec: SizeSpec) -> Result<(), BackendError>;
}

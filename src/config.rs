//! Build configuration.
//!
//! Defaults are overridden by an optional `facet.toml` in the source
//! directory, which is in turn overridden by command-line flags. Config
//! files are sparse — set only the values you want:
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! require_tags = []         # Keep only records carrying one of these tags
//! exclude_tags = []         # Drop records carrying any of these tags
//! originals = "omit"        # "copy" | "symlink" | "omit"
//! overlay = "assets"        # Static asset tree copied over the destination
//! symlink_assets = false    # Symlink overlay files instead of copying
//!
//! [processing]
//! max_workers = 4           # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file name looked up in the source directory.
pub const CONFIG_FILE: &str = "facet.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// How full-resolution originals are published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OriginalsPolicy {
    /// Copy each original into the destination.
    Copy,
    /// Symlink originals (development mode, saves disk).
    Symlink,
    /// Do not publish originals at all.
    #[default]
    Omit,
}

impl OriginalsPolicy {
    pub fn publishes(self) -> bool {
        !matches!(self, OriginalsPolicy::Omit)
    }
}

/// Build configuration loaded from `facet.toml`.
///
/// All fields have defaults; a missing file means "all defaults". Unknown
/// keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Keep only records carrying at least one of these tags (empty = all).
    pub require_tags: Vec<String>,
    /// Drop records carrying any of these tags.
    pub exclude_tags: Vec<String>,
    /// Originals publication policy.
    pub originals: OriginalsPolicy,
    /// Static asset tree copied over the destination before the build.
    pub overlay: Option<PathBuf>,
    /// Symlink overlay files instead of copying them.
    pub symlink_assets: bool,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers. When absent, defaults to the
    /// number of CPU cores. Values larger than the core count are clamped
    /// down.
    pub max_workers: Option<usize>,
}

impl BuildConfig {
    /// Load `facet.toml` from the source directory, or defaults when the
    /// file does not exist. A present-but-invalid file is an error.
    pub fn load(source: &Path) -> Result<Self, ConfigError> {
        let path = source.join(CONFIG_FILE);
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&content)?)
    }
}

/// Resolve the effective worker count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (config can constrain down, not up)
pub fn effective_workers(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.map(|n| n.min(cores)).unwrap_or(cores)
}

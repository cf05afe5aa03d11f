//! The build pipeline.
//!
//! Wires the stages end to end, in an order the individual modules rely on:
//!
//! 1. apply the static asset overlay (if configured),
//! 2. scan the source tree,
//! 3. load the catalog and compute the build plan,
//! 4. prune records whose source vanished,
//! 5. dispatch the job batch (checkpointing as it goes),
//! 6. persist the catalog,
//! 7. apply the inclusion filter to pick the published set,
//! 8. clean orphaned derived artifacts,
//! 9. rebuild the facet index.
//!
//! Filtering happens after persist on purpose: excluded records stay in the
//! catalog (see the filter module docs), they just never reach the index or
//! keep their derived artifacts.

use crate::catalog::{Catalog, CatalogError};
use crate::config::OriginalsPolicy;
use crate::derived::{self, size_classes};
use crate::detect;
use crate::dispatch::{self, DispatchError, ProgressEvent};
use crate::facets::{self, FacetError};
use crate::filter::TagFilter;
use crate::media::MediaBackend;
use crate::overlay::{self, OverlayError};
use crate::scan::{self, ScanError};
use crate::types::JobError;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Catalog document name under the destination root.
pub const CATALOG_FILE: &str = "db.json";

#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Facet(#[from] FacetError),
    #[error(transparent)]
    Overlay(#[from] OverlayError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Everything a build run needs besides the backend.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub source: PathBuf,
    pub dest: PathBuf,
    pub filter: TagFilter,
    pub originals: OriginalsPolicy,
    pub overlay: Option<PathBuf>,
    pub symlink_assets: bool,
}

/// Counts for the run summary. `errors` are the contained per-item
/// failures; fatal errors surface as [`BuildError`] instead.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub processed: usize,
    pub pruned: usize,
    pub excluded: usize,
    pub groups: usize,
    pub records: usize,
    pub errors: Vec<JobError>,
}

pub fn catalog_path(dest: &Path) -> PathBuf {
    dest.join(CATALOG_FILE)
}

/// Run one full incremental build.
pub fn run<B: MediaBackend>(
    backend: &B,
    opts: &BuildOptions,
    events: Option<&Sender<ProgressEvent>>,
) -> Result<BuildReport, BuildError> {
    std::fs::create_dir_all(&opts.dest)?;
    if let Some(assets) = &opts.overlay {
        overlay::apply(assets, &opts.dest, opts.symlink_assets)?;
    }

    let items = scan::scan(&opts.source)?;
    let db = catalog_path(&opts.dest);
    let mut catalog = Catalog::load(&db)?;

    let classes = size_classes(opts.originals.publishes());
    let plan = detect::plan(&items, &catalog, &opts.filter, |rel, mtime| {
        derived::up_to_date(&opts.dest, &classes, rel, mtime)
    });

    for id in &plan.prune {
        catalog.delete(id);
    }

    let stats = dispatch::run_batch(
        backend,
        &opts.source,
        &opts.dest,
        &classes,
        &plan.todo,
        &mut catalog,
        &db,
        events,
    )?;
    catalog.persist(&db)?;

    let kept: Vec<_> = catalog
        .records()
        .filter(|r| opts.filter.keep(r))
        .cloned()
        .collect();
    let excluded = catalog.len() - kept.len();

    let kept_paths: BTreeSet<String> = kept.iter().map(|r| r.file.clone()).collect();
    derived::clean_orphans(&opts.dest, &classes, &kept_paths)?;

    let index = facets::build_indexes(&opts.dest, &kept, opts.originals.publishes())?;

    Ok(BuildReport {
        processed: stats.processed,
        pruned: plan.prune.len(),
        excluded,
        groups: index.groups,
        records: index.records,
        errors: stats.errors,
    })
}

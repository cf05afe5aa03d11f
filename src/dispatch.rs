//! Parallel job dispatch with checkpointed progress.
//!
//! Jobs (probe + record build + derived images for one source item) run on
//! the rayon pool and stream their results over a channel to the calling
//! thread in completion order. That calling thread is the *coordinator*:
//! it is the only place the catalog is touched, so the store needs no
//! locking — workers share nothing mutable and write disjoint output paths.
//!
//! Every [`CHECKPOINT_INTERVAL`]th completion the coordinator persists a
//! full catalog snapshot. Because the coordinator applies results strictly
//! in the order it receives them, a checkpoint always reflects a causally
//! consistent prefix of the applied upserts. A failed checkpoint aborts the
//! run: continuing silently un-checkpointed would forfeit the one
//! durability promise this pipeline makes.
//!
//! A failed *job* does not abort anything. Its error result is counted and
//! reported, the catalog entry (if any) is left untouched, and the batch
//! moves on.

use crate::catalog::{Catalog, CatalogError};
use crate::derived::{self, SizeClass};
use crate::media::MediaBackend;
use crate::media::fields;
use crate::types::{CatalogRecord, JobError, JobErrorKind, SourceItem};
use rayon::prelude::*;
use std::path::Path;
use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Completions between catalog checkpoints.
pub const CHECKPOINT_INTERVAL: usize = 10;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("checkpoint write failed: {0}")]
    Checkpoint(#[from] CatalogError),
}

/// Progress reporting for an observer (the CLI's printer thread).
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Started {
        total: usize,
    },
    Completed {
        done: usize,
        total: usize,
        file: String,
        ok: bool,
        /// Extrapolated from elapsed time and completion rate; absent on
        /// the final completion.
        eta: Option<Duration>,
    },
}

/// What a batch did: successful upserts plus the contained failures.
#[derive(Debug, Default)]
pub struct BatchStats {
    pub processed: usize,
    pub errors: Vec<JobError>,
}

/// Run every job in `todo`, merging successes into `catalog` and
/// checkpointing to `catalog_path` at interval.
pub fn run_batch<B: MediaBackend>(
    backend: &B,
    source_root: &Path,
    dest_root: &Path,
    classes: &[SizeClass],
    todo: &[SourceItem],
    catalog: &mut Catalog,
    catalog_path: &Path,
    events: Option<&Sender<ProgressEvent>>,
) -> Result<BatchStats, DispatchError> {
    let total = todo.len();
    notify(events, ProgressEvent::Started { total });

    let mut stats = BatchStats::default();
    if total == 0 {
        return Ok(stats);
    }

    let started = Instant::now();
    let (tx, rx) = mpsc::channel::<(SourceItem, Result<CatalogRecord, JobError>)>();
    let mut failure: Option<DispatchError> = None;

    // in_place_scope, not scope: the coordinator must stay on the calling
    // thread. Migrating it into the pool would wedge a single-worker pool
    // (the blocked coordinator is the only thread that could run the
    // producer), and the receiver half of the channel cannot cross threads
    // anyway.
    rayon::in_place_scope(|scope| {
        scope.spawn(move |_| {
            todo.par_iter().for_each_with(tx, |tx, item| {
                let outcome = run_job(backend, source_root, dest_root, classes, item);
                // Send fails only if the coordinator bailed; nothing to do.
                tx.send((item.clone(), outcome)).ok();
            });
        });

        for (done, (item, outcome)) in rx.iter().enumerate() {
            let done = done + 1;
            let ok = outcome.is_ok();
            match outcome {
                Ok(record) => {
                    catalog.upsert(record);
                    stats.processed += 1;
                }
                Err(error) => stats.errors.push(error),
            }

            if done % CHECKPOINT_INTERVAL == 0
                && let Err(e) = catalog.persist(catalog_path)
            {
                failure = Some(e.into());
                break;
            }

            notify(
                events,
                ProgressEvent::Completed {
                    done,
                    total,
                    file: item.rel_path,
                    ok,
                    eta: estimate_eta(started.elapsed(), done, total),
                },
            );
        }
    });

    match failure {
        Some(error) => Err(error),
        None => Ok(stats),
    }
}

fn notify(events: Option<&Sender<ProgressEvent>>, event: ProgressEvent) {
    if let Some(tx) = events {
        // A hung-up observer is not our problem.
        tx.send(event).ok();
    }
}

/// Remaining time at the observed completion rate.
fn estimate_eta(elapsed: Duration, done: usize, total: usize) -> Option<Duration> {
    let remaining = total.checked_sub(done)?;
    if remaining == 0 || done == 0 {
        return None;
    }
    Some(elapsed.mul_f64(remaining as f64 / done as f64))
}

/// One job: probe, build the record, derive every size class. All failures
/// are contained as error-tagged results.
fn run_job<B: MediaBackend>(
    backend: &B,
    source_root: &Path,
    dest_root: &Path,
    classes: &[SizeClass],
    item: &SourceItem,
) -> Result<CatalogRecord, JobError> {
    let tag = |kind: JobErrorKind| JobError {
        file: item.rel_path.clone(),
        kind,
    };

    let source = source_root.join(&item.rel_path);
    let probe = backend
        .probe(&source)
        .map_err(|e| tag(JobErrorKind::Extract(e.to_string())))?;
    let record = fields::build_record(item, probe).map_err(tag)?;

    for class in classes {
        let dest = derived::artifact_path(dest_root, *class, &item.rel_path);
        backend
            .derive(&source, &dest, class.spec)
            .map_err(|e| tag(JobErrorKind::Derive(e.to_string())))?;
    }
    Ok(record)
}

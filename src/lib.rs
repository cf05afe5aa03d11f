//! # Facet Gal
//!
//! An incremental catalog and faceted-index generator for photo collections.
//! Point it at a directory of images and it produces a static site data set:
//! scaled renditions of every image, a persistent metadata catalog, and a
//! tree of JSON index documents a front end can navigate by keyword, month,
//! or camera — no server, no database.
//!
//! # Architecture: Incremental Pipeline
//!
//! Every run is a full pipeline pass, but the change detector makes repeat
//! runs cheap — only new, modified, or artifact-stale images are processed:
//!
//! ```text
//! 1. Scan      source/      →  items          (walk + mtimes)
//! 2. Detect    items + db   →  plan           (todo + prune sets)
//! 3. Dispatch  plan         →  scaled/ + db   (parallel jobs, checkpoints)
//! 4. Filter    db           →  published set  (require/exclude tags)
//! 5. Index     published    →  json/          (facet groups + navigation)
//! ```
//!
//! The catalog document (`db.json`) is the only state carried between runs.
//! It is persisted atomically and checkpointed during long batches, so an
//! interrupted run loses at most a few jobs — the next run's detector picks
//! up exactly where the last checkpoint left off.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the source tree and collects image paths + mtimes |
//! | [`detect`] | Change detection — computes the todo and prune sets |
//! | [`dispatch`] | Parallel job execution with checkpointed progress |
//! | [`catalog`] | The persisted id → record store with atomic writes |
//! | [`filter`] | Require/exclude tag filtering of the published set |
//! | [`facets`] | Facet grouping and JSON index generation |
//! | [`derived`] | Scaled-artifact layout, freshness, and orphan cleanup |
//! | [`media`] | Metadata extraction and image derivation (ImageMagick) |
//! | [`overlay`] | Static front-end asset overlay onto the destination |
//! | [`config`] | `facet.toml` loading and CLI merging |
//! | [`build`] | The pipeline — wires all of the above end to end |
//! | [`output`] | CLI output formatting for progress and summaries |
//! | [`types`] | Shared serialized types (`CatalogRecord`, job errors) |
//!
//! # Design Decisions
//!
//! ## The Catalog Is the Only Truth Carried Forward
//!
//! Scans are recomputed from the filesystem every run; derived artifacts
//! are a pure function of (source, size class). Only extracted metadata is
//! expensive to recreate, so only it is persisted. Everything else can be
//! deleted and regenerates.
//!
//! ## Exclusion Is Not Deletion
//!
//! Tag-excluded images disappear from the index and lose their scaled
//! renditions, but keep their catalog entry. Un-excluding them restores the
//! published set without re-running metadata extraction for the whole
//! collection — the detector regenerates just their artifacts.
//!
//! ## ImageMagick Behind a Trait
//!
//! Extraction and scaling shell out to `identify`/`convert`, but only the
//! [`media`] module knows that. The pipeline is written against the
//! [`media::MediaBackend`] trait, so the entire test suite runs against a
//! recording mock with no external tools installed.

pub mod build;
pub mod catalog;
pub mod config;
pub mod derived;
pub mod detect;
pub mod dispatch;
pub mod facets;
pub mod filter;
pub mod media;
pub mod output;
pub mod overlay;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

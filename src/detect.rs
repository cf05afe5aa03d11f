//! Change detection.
//!
//! Compares a fresh source scan against the catalog and decides, per item,
//! whether it needs re-extraction and re-derivation. The rules, in order:
//!
//! 1. the id is not in the catalog, or
//! 2. the stored source mtime differs from the scanned one, or
//! 3. some derived artifact is missing/stale *and* the stored record passes
//!    the inclusion filter.
//!
//! Rule 3 is the deliberate coupling between staleness and the filter: an
//! excluded record keeps its catalog entry, so rules 1 and 2 stay quiet,
//! and rule 3 refuses to regenerate artifacts nobody will publish. When the
//! filter later admits the record, its (by then cleaned-up) artifacts fail
//! the freshness check and rule 3 selects it again.
//!
//! The planner also computes the prune set: ids whose source file vanished
//! from the scan. Those are deleted unconditionally, before dispatch.

use crate::catalog::Catalog;
use crate::filter::TagFilter;
use crate::types::{SourceItem, id_from_rel_path};
use std::collections::BTreeSet;

/// What a build run has to do: items to reprocess (ordered by relative
/// path) and catalog ids to delete.
#[derive(Debug, Default)]
pub struct BuildPlan {
    pub todo: Vec<SourceItem>,
    pub prune: Vec<String>,
}

/// Compute the plan. `artifacts_fresh(rel_path, mtime_ms)` reports whether
/// every derived artifact for the item exists and is current.
pub fn plan(
    items: &[SourceItem],
    catalog: &Catalog,
    filter: &TagFilter,
    artifacts_fresh: impl Fn(&str, u64) -> bool,
) -> BuildPlan {
    let todo = items
        .iter()
        .filter(|item| {
            match catalog.get(&id_from_rel_path(&item.rel_path)) {
                None => true,
                Some(record) if record.timestamp != item.mtime_ms => true,
                Some(record) => {
                    !artifacts_fresh(&item.rel_path, item.mtime_ms) && filter.keep(record)
                }
            }
        })
        .cloned()
        .collect();

    let scanned: BTreeSet<String> = items
        .iter()
        .map(|item| id_from_rel_path(&item.rel_path))
        .collect();
    let prune = catalog
        .ids()
        .filter(|id| !scanned.contains(*id))
        .map(String::from)
        .collect();

    BuildPlan { todo, prune }
}

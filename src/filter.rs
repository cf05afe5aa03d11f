//! Inclusion filtering by tag.
//!
//! A record participates in index building when it carries at least one
//! required tag (or no tags are required) and none of the excluded tags.
//! The filter runs after pruning and after the batch completes, before the
//! facet builder and before derived-artifact cleanup — so excluded records
//! also lose their scaled images.
//!
//! Exclusion never touches the persisted catalog: an excluded record keeps
//! its entry (and its stored mtime) so the change detector does not
//! re-extract it every run, and it springs back fully formed the moment the
//! filter configuration admits it again.

use crate::types::CatalogRecord;
use std::collections::BTreeSet;

/// Require/exclude tag sets. Both may be empty; an empty filter keeps
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    require: BTreeSet<String>,
    exclude: BTreeSet<String>,
}

impl TagFilter {
    pub fn new<R, E>(require: R, exclude: E) -> Self
    where
        R: IntoIterator<Item = String>,
        E: IntoIterator<Item = String>,
    {
        Self {
            require: require.into_iter().collect(),
            exclude: exclude.into_iter().collect(),
        }
    }

    /// `keep(r) = (require = ∅ ∨ tags ∩ require ≠ ∅) ∧ tags ∩ exclude = ∅`
    pub fn keep(&self, record: &CatalogRecord) -> bool {
        let required = self.require.is_empty()
            || record.keywords.iter().any(|k| self.require.contains(k));
        let excluded = record.keywords.iter().any(|k| self.exclude.contains(k));
        required && !excluded
    }
}

//! Shared test utilities for the facet-gal test suite.
//!
//! Builders for the two data shapes nearly every test needs: fully-formed
//! catalog records and canned backend probes. Tests that care about other
//! fields (capture time, exif, dimensions) construct records inline instead.

use crate::media::RawProbe;
use crate::media::fields::DATE_TAG;
use crate::types::{CatalogRecord, SourceItem, id_from_rel_path};
use std::collections::BTreeMap;

/// A catalog record with the fields most tests vary: source path, tags,
/// and stored source mtime. Everything else is fixed and plausible.
pub fn record(file: &str, tags: &[&str], timestamp: u64) -> CatalogRecord {
    CatalogRecord {
        id: id_from_rel_path(file),
        file: file.to_string(),
        keywords: tags.iter().map(|t| t.to_string()).collect(),
        width: 800,
        height: 600,
        taken: 1_577_836_800_000 + timestamp as i64,
        month: "2020-01".to_string(),
        exif: BTreeMap::new(),
        timestamp,
    }
}

/// A probe carrying a capture time and a `;`-joined keyword field.
pub fn probe_taken(date: &str, tags: &[&str]) -> RawProbe {
    let mut fields = BTreeMap::from([(DATE_TAG.to_string(), date.to_string())]);
    if !tags.is_empty() {
        fields.insert("IPTC:2:25".to_string(), tags.join(";"));
    }
    RawProbe {
        width: 800,
        height: 600,
        fields,
    }
}

/// A probe with keywords but no capture time.
pub fn probe_no_date(tags: &[&str]) -> RawProbe {
    let mut probe = probe_taken("", tags);
    probe.fields.remove(DATE_TAG);
    probe
}

/// `n` flat-named source items: `img-000.jpg`, `img-001.jpg`, ...
pub fn source_items(n: usize) -> Vec<SourceItem> {
    (0..n)
        .map(|i| SourceItem {
            rel_path: format!("img-{i:03}.jpg"),
            mtime_ms: 1_000 + i as u64,
        })
        .collect()
}

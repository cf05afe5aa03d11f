//! The persisted catalog store.
//!
//! A single JSON document maps record id → [`CatalogRecord`]. The store is
//! mutated only by the dispatch coordinator, which keeps all concurrency
//! concerns out of this module: it is a plain map with explicit operations.
//!
//! # Persistence
//!
//! `persist` writes the full document to a sibling temp file and renames it
//! into place, so an external observer either sees the previous complete
//! snapshot or the new one — never a torn write. Interval checkpoints during
//! a batch run go through the same path.
//!
//! A missing document on first run is not an error: `load` returns an empty
//! catalog, matching the "empty initial state" contract.
//!
//! Records live in a `BTreeMap` so serialization order is stable: rebuilding
//! an unchanged catalog produces a byte-identical document.

use crate::types::CatalogRecord;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("catalog document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Id → record map with load/persist. See the module docs for the
/// mutation and atomicity contract.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: BTreeMap<String, CatalogRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the catalog document, or an empty catalog if none exists yet.
    ///
    /// A present-but-unparseable document is an error: silently discarding
    /// a catalog would re-process the entire collection.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let records: BTreeMap<String, CatalogRecord> = serde_json::from_str(&content)?;
        Ok(Self { records })
    }

    /// Insert or fully replace the record under its id. Last write wins;
    /// there is no partial-field merge.
    pub fn upsert(&mut self, record: CatalogRecord) {
        self.records.insert(record.id.clone(), record);
    }

    /// Remove a record. Returns whether it was present.
    pub fn delete(&mut self, id: &str) -> bool {
        self.records.remove(id).is_some()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in id order (the catalog's stable enumeration order).
    pub fn records(&self) -> impl Iterator<Item = &CatalogRecord> {
        self.records.values()
    }

    /// Ids in order, for prune-set computation.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// An immutable full copy, for checkpointing.
    pub fn snapshot(&self) -> Catalog {
        self.clone()
    }

    /// Atomically write the full document: temp file, then rename over the
    /// destination.
    pub fn persist(&self, path: &Path) -> Result<(), CatalogError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::record;
    use tempfile::TempDir;

    #[test]
    fn load_missing_document_is_empty_not_error() {
        let tmp = TempDir::new().unwrap();
        let catalog = Catalog::load(&tmp.path().join("db.json")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn load_corrupt_document_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(Catalog::load(&path), Err(CatalogError::Json(_))));
    }

    #[test]
    fn upsert_replaces_whole_record() {
        let mut catalog = Catalog::new();
        let mut r = record("a.jpg", &["trip"], 100);
        catalog.upsert(r.clone());

        r.keywords = vec!["beach".into()];
        r.timestamp = 200;
        catalog.upsert(r);

        let stored = catalog.get("a.jpg").unwrap();
        assert_eq!(stored.keywords, vec!["beach"]);
        assert_eq!(stored.timestamp, 200);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn delete_reports_presence() {
        let mut catalog = Catalog::new();
        catalog.upsert(record("a.jpg", &[], 100));
        assert!(catalog.delete("a.jpg"));
        assert!(!catalog.delete("a.jpg"));
        assert!(catalog.is_empty());
    }

    #[test]
    fn persist_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");

        let mut catalog = Catalog::new();
        catalog.upsert(record("a.jpg", &["trip"], 100));
        catalog.upsert(record("b.jpg", &["beach"], 200));
        catalog.persist(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("a.jpg").unwrap().keywords, vec!["trip"]);
    }

    #[test]
    fn persist_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");
        let mut catalog = Catalog::new();
        catalog.upsert(record("a.jpg", &[], 100));
        catalog.persist(&path).unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["db.json"]);
    }

    #[test]
    fn persist_replaces_existing_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("db.json");

        let mut catalog = Catalog::new();
        catalog.upsert(record("a.jpg", &[], 100));
        catalog.persist(&path).unwrap();

        catalog.upsert(record("b.jpg", &[], 200));
        catalog.persist(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn persist_is_byte_stable() {
        let tmp = TempDir::new().unwrap();
        let path1 = tmp.path().join("one.json");
        let path2 = tmp.path().join("two.json");

        let mut catalog = Catalog::new();
        // Insert out of id order; BTreeMap serialization must not care.
        catalog.upsert(record("b.jpg", &["trip"], 200));
        catalog.upsert(record("a.jpg", &["trip"], 100));
        catalog.persist(&path1).unwrap();

        let reloaded = Catalog::load(&path1).unwrap();
        reloaded.persist(&path2).unwrap();

        assert_eq!(fs::read(&path1).unwrap(), fs::read(&path2).unwrap());
    }

    #[test]
    fn snapshot_is_independent() {
        let mut catalog = Catalog::new();
        catalog.upsert(record("a.jpg", &[], 100));
        let snap = catalog.snapshot();
        catalog.delete("a.jpg");
        assert!(snap.contains("a.jpg"));
    }

    #[test]
    fn records_enumerate_in_id_order() {
        let mut catalog = Catalog::new();
        catalog.upsert(record("c.jpg", &[], 1));
        catalog.upsert(record("a.jpg", &[], 1));
        catalog.upsert(record("b.jpg", &[], 1));
        let ids: Vec<&str> = catalog.records().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }
}

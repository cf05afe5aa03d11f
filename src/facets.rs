//! Facet index generation.
//!
//! Takes the filtered record set and materializes the JSON artifacts the
//! front end navigates: one document per (key type, key value) group, one
//! per record, a manifest of all key values, and a build marker. The index
//! directory is cleared wholesale before writing — key values that vanished
//! since the last build must not leave stale documents behind, and a full
//! rewrite is cheaper than diffing.
//!
//! Key types are a declarative table, like the field-mapping rules: adding
//! a facet means adding one [`KeyType`] row.
//!
//! Orderings:
//! - group members: capture time descending (stable),
//! - the manifest lists each key type's groups ascending or descending per
//!   the table (months newest-first),
//! - the global record chain: capture time descending across all records.
//!
//! Group prev/next links always follow ascending key order — for months,
//! `prev` is the earlier month and `next` the later one — independent of
//! the manifest's display order. Navigation is total either way: exactly
//! one group lacks a prev and exactly one lacks a next.

use crate::types::CatalogRecord;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Thumbnails sampled per group for its cover strip.
const GROUP_THUMBS: usize = 3;

#[derive(Error, Debug)]
pub enum FacetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("index serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupOrder {
    Ascending,
    /// Reverse-chronological facets (months) list newest first.
    Descending,
}

/// One facet: its name, group ordering, and how to read a record's key
/// values. Multi-valued extractors place the record in several groups.
pub struct KeyType {
    pub name: &'static str,
    pub order: GroupOrder,
    pub values: fn(&CatalogRecord) -> Vec<String>,
}

pub const KEY_TYPES: &[KeyType] = &[
    KeyType {
        name: "keyword",
        order: GroupOrder::Ascending,
        values: |r| r.keywords.clone(),
    },
    KeyType {
        name: "month",
        order: GroupOrder::Descending,
        values: |r| vec![r.month.clone()],
    },
    KeyType {
        name: "camera",
        order: GroupOrder::Ascending,
        values: |r| r.exif.get("Model").cloned().into_iter().collect(),
    },
];

#[derive(Debug, Serialize)]
struct GroupMeta {
    id: String,
    count: usize,
    thumbs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<String>,
}

/// Manifest entry for one group: enough to render a facet overview page
/// without fetching every group document.
#[derive(Debug, Clone, Serialize)]
struct GroupSummary {
    id: String,
    count: usize,
    thumbs: Vec<String>,
}

#[derive(Serialize)]
struct GroupDoc<'a> {
    images: Vec<&'a CatalogRecord>,
    meta: GroupMeta,
}

#[derive(Serialize)]
struct RecordDoc<'a> {
    image: &'a CatalogRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    prev: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<String>,
}

#[derive(Serialize)]
struct Manifest {
    #[serde(rename = "keyTypes")]
    key_types: BTreeMap<&'static str, Vec<GroupSummary>>,
    #[serde(rename = "originalsPublished")]
    originals_published: bool,
}

#[derive(Serialize)]
struct BuildMarker {
    #[serde(rename = "buildTimestamp")]
    build_timestamp: u64,
}

/// What a rebuild produced, for the run summary.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub groups: usize,
    pub records: usize,
}

/// Encode a key value into a file-name-safe token. Anything outside
/// `[A-Za-z0-9._-]` collapses to a dash.
pub fn encode_key(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn index_dir(dest: &Path) -> PathBuf {
    dest.join("json")
}

fn write_doc<T: Serialize>(path: &Path, doc: &T) -> Result<(), FacetError> {
    fs::write(path, serde_json::to_string_pretty(doc)?)?;
    Ok(())
}

/// Rebuild the full index under `<dest>/json/` from the given (already
/// filtered) records. The build marker is written last, so its presence
/// means the index is complete.
pub fn build_indexes(
    dest: &Path,
    records: &[CatalogRecord],
    originals_published: bool,
) -> Result<IndexStats, FacetError> {
    let dir = index_dir(dest);
    if dir.is_dir() {
        fs::remove_dir_all(&dir)?;
    }
    fs::create_dir_all(&dir)?;

    // Global chain, newest first. The sort is stable, so records sharing a
    // capture time keep their catalog (id) order.
    let mut ordered: Vec<&CatalogRecord> = records.iter().collect();
    ordered.sort_by_key(|r| Reverse(r.taken));

    let mut rng = rand::thread_rng();
    let mut manifest_keys = BTreeMap::new();
    let mut stats = IndexStats {
        groups: 0,
        records: ordered.len(),
    };

    for key_type in KEY_TYPES {
        // Members inherit taken-desc order from the global chain.
        let mut groups: BTreeMap<String, Vec<&CatalogRecord>> = BTreeMap::new();
        for &record in &ordered {
            for value in (key_type.values)(record) {
                groups.entry(value).or_default().push(record);
            }
        }

        // Links are assigned over ascending key order; the display order
        // below only affects the manifest listing.
        let keys: Vec<String> = groups.keys().cloned().collect();

        let mut summaries = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let members = &groups[key];
            let summary = GroupSummary {
                id: key.clone(),
                count: members.len(),
                // File paths, not ids: ids flatten separators and cannot
                // be mapped back to `scaled/<label>/<rel_path>`.
                thumbs: members
                    .choose_multiple(&mut rng, GROUP_THUMBS)
                    .map(|r| r.file.clone())
                    .collect(),
            };
            let doc = GroupDoc {
                images: members.clone(),
                meta: GroupMeta {
                    id: summary.id.clone(),
                    count: summary.count,
                    thumbs: summary.thumbs.clone(),
                    prev: i.checked_sub(1).map(|j| keys[j].clone()),
                    next: keys.get(i + 1).cloned(),
                },
            };
            let file = format!("{}-{}.json", key_type.name, encode_key(key));
            write_doc(&dir.join(file), &doc)?;
            summaries.push(summary);
            stats.groups += 1;
        }
        if key_type.order == GroupOrder::Descending {
            summaries.reverse();
        }
        manifest_keys.insert(key_type.name, summaries);
    }

    for (i, &record) in ordered.iter().enumerate() {
        let doc = RecordDoc {
            image: record,
            prev: i.checked_sub(1).map(|j| ordered[j].id.clone()),
            next: ordered.get(i + 1).map(|r| r.id.clone()),
        };
        write_doc(&dir.join(format!("image-{}.json", record.id)), &doc)?;
    }

    write_doc(
        &dir.join("index.json"),
        &Manifest {
            key_types: manifest_keys,
            originals_published,
        },
    )?;
    write_doc(
        &dir.join("build.json"),
        &BuildMarker {
            build_timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
        },
    )?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn rec(file: &str, tags: &[&str], taken: i64, month: &str, camera: Option<&str>) -> CatalogRecord {
        CatalogRecord {
            id: crate::types::id_from_rel_path(file),
            file: file.into(),
            keywords: tags.iter().map(|t| t.to_string()).collect(),
            width: 800,
            height: 600,
            taken,
            month: month.into(),
            exif: camera
                .map(|c| BTreeMap::from([("Model".to_string(), c.to_string())]))
                .unwrap_or_default(),
            timestamp: 1,
        }
    }

    fn read(dir: &Path, name: &str) -> Value {
        let path = dir.join("json").join(name);
        serde_json::from_str(&fs::read_to_string(&path).unwrap_or_else(|_| panic!("missing {name}")))
            .unwrap()
    }

    fn sample() -> Vec<CatalogRecord> {
        vec![
            rec("a.jpg", &["trip"], 300, "2020-03", Some("X100V")),
            rec("b.jpg", &["trip", "beach"], 100, "2020-01", Some("X100V")),
            rec("c.jpg", &["beach"], 200, "2020-01", None),
        ]
    }

    #[test]
    fn group_members_are_newest_first() {
        let tmp = TempDir::new().unwrap();
        build_indexes(tmp.path(), &sample(), false).unwrap();

        let doc = read(tmp.path(), "keyword-trip.json");
        let files: Vec<&str> = doc["images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["file"].as_str().unwrap())
            .collect();
        assert_eq!(files, vec!["a.jpg", "b.jpg"]);
        assert_eq!(doc["meta"]["count"], 2);
        assert_eq!(doc["meta"]["id"], "trip");
    }

    #[test]
    fn multi_valued_records_appear_in_each_group() {
        let tmp = TempDir::new().unwrap();
        build_indexes(tmp.path(), &sample(), false).unwrap();

        for name in ["keyword-trip.json", "keyword-beach.json"] {
            let doc = read(tmp.path(), name);
            let ids: Vec<&str> = doc["images"]
                .as_array()
                .unwrap()
                .iter()
                .map(|i| i["id"].as_str().unwrap())
                .collect();
            assert!(ids.contains(&"b.jpg"), "{name} missing b.jpg");
        }
    }

    #[test]
    fn months_are_reverse_chronological_with_total_navigation() {
        let tmp = TempDir::new().unwrap();
        build_indexes(tmp.path(), &sample(), false).unwrap();

        let manifest = read(tmp.path(), "index.json");
        let months: Vec<&str> = manifest["keyTypes"]["month"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap())
            .collect();
        assert_eq!(months, vec!["2020-03", "2020-01"]);

        // Links are temporal regardless of display order: the newest month
        // has nothing after it, the oldest nothing before it.
        let newest = read(tmp.path(), "month-2020-03.json");
        assert_eq!(newest["meta"]["prev"], "2020-01");
        assert!(newest["meta"].get("next").is_none());

        let oldest = read(tmp.path(), "month-2020-01.json");
        assert!(oldest["meta"].get("prev").is_none());
        assert_eq!(oldest["meta"]["next"], "2020-03");
    }

    #[test]
    fn group_chain_visits_every_group_exactly_once() {
        let tmp = TempDir::new().unwrap();
        let records: Vec<CatalogRecord> = (1..=4)
            .map(|m| rec(&format!("m{m}.jpg"), &[], m, &format!("2020-0{m}"), None))
            .collect();
        build_indexes(tmp.path(), &records, false).unwrap();

        // Start at the group with no prev and follow next to the end.
        let mut visited = Vec::new();
        let mut current = Some("2020-01".to_string());
        while let Some(id) = current {
            let doc = read(tmp.path(), &format!("month-{id}.json"));
            assert_eq!(doc["meta"]["prev"].as_str().map(String::from), visited.last().cloned());
            visited.push(id);
            current = doc["meta"]["next"].as_str().map(String::from);
        }
        assert_eq!(visited, vec!["2020-01", "2020-02", "2020-03", "2020-04"]);
    }

    #[test]
    fn camera_groups_only_cover_records_with_a_model() {
        let tmp = TempDir::new().unwrap();
        build_indexes(tmp.path(), &sample(), false).unwrap();

        let doc = read(tmp.path(), "camera-X100V.json");
        assert_eq!(doc["meta"]["count"], 2);
        let manifest = read(tmp.path(), "index.json");
        let cameras = manifest["keyTypes"]["camera"].as_array().unwrap();
        assert_eq!(cameras.len(), 1);
        assert_eq!(cameras[0]["id"], "X100V");
        assert_eq!(cameras[0]["count"], 2);
    }

    #[test]
    fn thumbs_are_member_file_paths_capped_at_three() {
        let tmp = TempDir::new().unwrap();
        // Nested paths: a thumb must be the relative source path (which
        // resolves under scaled/<label>/), not the separator-flattened id.
        let records: Vec<CatalogRecord> = (0..5)
            .map(|i| rec(&format!("trips/img-{i}.jpg"), &["trip"], i, "2020-01", None))
            .collect();
        build_indexes(tmp.path(), &records, false).unwrap();

        let doc = read(tmp.path(), "keyword-trip.json");
        let thumbs = doc["meta"]["thumbs"].as_array().unwrap();
        assert_eq!(thumbs.len(), 3);
        for thumb in thumbs {
            let thumb = thumb.as_str().unwrap();
            assert!(thumb.starts_with("trips/img-"), "thumb {thumb:?} is not a file path");
        }
    }

    #[test]
    fn small_groups_use_every_member_as_thumb() {
        let tmp = TempDir::new().unwrap();
        let records = vec![rec("trips/solo.jpg", &["trip"], 1, "2020-01", None)];
        build_indexes(tmp.path(), &records, false).unwrap();
        let doc = read(tmp.path(), "keyword-trip.json");
        assert_eq!(doc["meta"]["thumbs"], serde_json::json!(["trips/solo.jpg"]));
    }

    #[test]
    fn record_chain_is_total_and_newest_first() {
        let tmp = TempDir::new().unwrap();
        build_indexes(tmp.path(), &sample(), false).unwrap();

        // taken desc: a (300) → c (200) → b (100).
        let a = read(tmp.path(), "image-a.jpg.json");
        assert!(a.get("prev").is_none());
        assert_eq!(a["next"], "c.jpg");

        let c = read(tmp.path(), "image-c.jpg.json");
        assert_eq!(c["prev"], "a.jpg");
        assert_eq!(c["next"], "b.jpg");

        let b = read(tmp.path(), "image-b.jpg.json");
        assert_eq!(b["prev"], "c.jpg");
        assert!(b.get("next").is_none());
        assert_eq!(b["image"]["file"], "b.jpg");
    }

    #[test]
    fn manifest_reports_originals_policy() {
        let tmp = TempDir::new().unwrap();
        build_indexes(tmp.path(), &sample(), true).unwrap();
        assert_eq!(read(tmp.path(), "index.json")["originalsPublished"], true);
    }

    #[test]
    fn rebuild_clears_stale_documents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("json");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("keyword-vanished.json"), "{}").unwrap();

        build_indexes(tmp.path(), &sample(), false).unwrap();
        assert!(!dir.join("keyword-vanished.json").exists());
        assert!(dir.join("keyword-trip.json").exists());
    }

    #[test]
    fn build_marker_is_written_with_a_current_timestamp() {
        let tmp = TempDir::new().unwrap();
        build_indexes(tmp.path(), &sample(), false).unwrap();
        let marker = read(tmp.path(), "build.json");
        assert!(marker["buildTimestamp"].as_u64().unwrap() > 1_600_000_000);
    }

    #[test]
    fn empty_record_set_still_writes_manifest_and_marker() {
        let tmp = TempDir::new().unwrap();
        let stats = build_indexes(tmp.path(), &[], false).unwrap();
        assert_eq!(stats, IndexStats { groups: 0, records: 0 });

        let manifest = read(tmp.path(), "index.json");
        assert_eq!(manifest["keyTypes"]["keyword"], serde_json::json!([]));
        assert!(tmp.path().join("json/build.json").exists());
    }

    #[test]
    fn stats_count_groups_across_key_types() {
        let tmp = TempDir::new().unwrap();
        let stats = build_indexes(tmp.path(), &sample(), false).unwrap();
        // keyword: trip, beach; month: 2020-03, 2020-01; camera: X100V.
        assert_eq!(stats, IndexStats { groups: 5, records: 3 });
    }

    #[test]
    fn encode_key_flattens_unsafe_characters() {
        assert_eq!(encode_key("2020-01"), "2020-01");
        assert_eq!(encode_key("FUJIFILM X100V"), "FUJIFILM-X100V");
        assert_eq!(encode_key("a/b:c"), "a-b-c");
    }
}

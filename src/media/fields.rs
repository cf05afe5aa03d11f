//! Field mapping: raw probe output → catalog record.
//!
//! Extraction tools hand back a flat bag of string-valued fields. Rather
//! than branching on tag names inline, a declarative table maps each probe
//! tag to a target and a transform:
//!
//! | transform        | example                                      |
//! |------------------|----------------------------------------------|
//! | passthrough      | `EXIF:Model` → exif `Model`                  |
//! | rational parse   | `EXIF:FNumber` `28/10` → exif `Aperture` 2.8 |
//! | repeated values  | `IPTC:2:25` `a;b;c` → keywords               |
//! | synthetic tag    | `EXIF:Rating` `4` → keyword `4-star`         |
//!
//! The capture timestamp is handled by [`build_record`] itself, because its
//! absence is the documented per-item failure, not just a missing field.

use crate::media::backend::RawProbe;
use crate::types::{CatalogRecord, JobErrorKind, SourceItem, id_from_rel_path};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Probe tag carrying the capture time, EXIF's `YYYY:MM:DD HH:MM:SS`.
pub const DATE_TAG: &str = "EXIF:DateTimeOriginal";
const DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// What to do with one probe field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Apply {
    /// Store verbatim in the exif map under this label.
    Exif(&'static str),
    /// Parse `p/q` into a trimmed decimal, store under this label.
    ExifRational(&'static str),
    /// Split a `;`-separated repeated value into the keyword set.
    Keywords,
    /// Synthesize an `N-star` keyword from a 1–5 rating.
    RatingTag,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub tag: &'static str,
    pub apply: Apply,
}

pub const FIELD_RULES: &[FieldRule] = &[
    FieldRule { tag: "IPTC:2:25", apply: Apply::Keywords },
    FieldRule { tag: "EXIF:Model", apply: Apply::Exif("Model") },
    FieldRule { tag: "EXIF:LensModel", apply: Apply::Exif("Lens") },
    FieldRule { tag: "EXIF:FNumber", apply: Apply::ExifRational("Aperture") },
    FieldRule { tag: "EXIF:ExposureTime", apply: Apply::Exif("Exposure") },
    FieldRule { tag: "EXIF:PhotographicSensitivity", apply: Apply::Exif("ISO") },
    FieldRule { tag: "EXIF:Rating", apply: Apply::RatingTag },
];

/// Every tag a backend probe should request, in table order, capture time
/// last.
pub fn probe_tags() -> Vec<&'static str> {
    let mut tags: Vec<&'static str> = FIELD_RULES.iter().map(|r| r.tag).collect();
    tags.push(DATE_TAG);
    tags
}

/// Build a catalog record from a probe, applying the field table and
/// deriving `taken`/`month` from the capture timestamp.
pub fn build_record(item: &SourceItem, probe: RawProbe) -> Result<CatalogRecord, JobErrorKind> {
    let taken = probe
        .fields
        .get(DATE_TAG)
        .and_then(|v| NaiveDateTime::parse_from_str(v.trim(), DATE_FORMAT).ok())
        .ok_or(JobErrorKind::MissingTimestamp)?;

    let mut keywords = Vec::new();
    let mut exif = BTreeMap::new();

    for rule in FIELD_RULES {
        let Some(value) = probe.fields.get(rule.tag).map(|v| v.trim()) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        match rule.apply {
            Apply::Exif(label) => {
                exif.insert(label.to_string(), value.to_string());
            }
            Apply::ExifRational(label) => {
                let parsed = parse_rational(value).unwrap_or_else(|| value.to_string());
                exif.insert(label.to_string(), parsed);
            }
            Apply::Keywords => {
                keywords.extend(
                    value
                        .split(';')
                        .map(str::trim)
                        .filter(|k| !k.is_empty())
                        .map(String::from),
                );
            }
            Apply::RatingTag => {
                if let Ok(stars @ 1..=5) = value.parse::<u8>() {
                    keywords.push(format!("{stars}-star"));
                }
            }
        }
    }

    Ok(CatalogRecord {
        id: id_from_rel_path(&item.rel_path),
        file: item.rel_path.clone(),
        keywords,
        width: probe.width,
        height: probe.height,
        taken: taken.and_utc().timestamp_millis(),
        month: taken.format("%Y-%m").to_string(),
        exif,
        timestamp: item.mtime_ms,
    })
}

/// Parse an EXIF rational (`28/10`) or plain decimal into a trimmed decimal
/// string (`2.8`). Returns `None` when the value is not numeric.
pub fn parse_rational(value: &str) -> Option<String> {
    let number = match value.split_once('/') {
        Some((p, q)) => {
            let p: f64 = p.trim().parse().ok()?;
            let q: f64 = q.trim().parse().ok()?;
            if q == 0.0 {
                return None;
            }
            p / q
        }
        None => value.trim().parse().ok()?,
    };
    // f64 Display already trims: 2.8 → "2.8", 4.0 → "4".
    Some(format!("{number}"))
}

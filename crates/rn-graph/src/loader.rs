//! Segment loaders for the two bulk formats the upstream store exports.
//!
//! # GeoJSON
//!
//! A `FeatureCollection` (or a single `Feature`) of `LineString` /
//! `MultiLineString` features.  Recognised properties:
//!
//! | Property    | Meaning                                         |
//! |-------------|-------------------------------------------------|
//! | `id`        | upstream id (integer)                           |
//! | `class`     | road class; falls back to `subtype`             |
//! | `oneway`    | one-way tag (string, bool, or number)           |
//! | `is_oneway` | one-way flag (bool, 0/1, or "true"/"false")     |
//!
//! # CSV
//!
//! ```csv
//! id,class,oneway,is_oneway,wkt
//! 1,primary,no,false,"LINESTRING(106.70 10.77, 106.71 10.77)"
//! 2,residential,-1,,"LINESTRING(106.71 10.77, 106.71 10.78)"
//! ```
//!
//! In both formats a record with missing or unparsable geometry still
//! becomes a [`Segment`] (with an empty line) so that the topology builder
//! reports it as dropped.  A file that is not valid GeoJSON / CSV at all
//! fails with [`GraphError::Load`].

use std::io::Read;
use std::path::Path;

use geo::{Geometry, LineString};
use geojson::{Feature, GeoJson};
use log::warn;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use wkt::TryFromWkt;

use crate::segment::Segment;
use crate::{GraphError, GraphResult};

// ── Format dispatch ───────────────────────────────────────────────────────────

/// Load segments, choosing the format from the file extension
/// (`.csv` → CSV, anything else → GeoJSON).
pub fn load_segments(path: &Path) -> GraphResult<Vec<Segment>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv { load_csv(path) } else { load_geojson(path) }
}

// ── GeoJSON ───────────────────────────────────────────────────────────────────

pub fn load_geojson(path: &Path) -> GraphResult<Vec<Segment>> {
    let file = std::fs::File::open(path)?;
    load_geojson_reader(file)
}

/// Like [`load_geojson`] but accepts any `Read` source.
pub fn load_geojson_reader<R: Read>(mut reader: R) -> GraphResult<Vec<Segment>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;

    let parsed: GeoJson = text.parse().map_err(|e: geojson::Error| GraphError::Load(e.to_string()))?;
    let features = match parsed {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(_) => {
            return Err(GraphError::Load(
                "expected a Feature or FeatureCollection, got a bare Geometry".into(),
            ));
        }
    };

    Ok(features.into_iter().enumerate().map(|(i, f)| feature_to_segment(i, f)).collect())
}

fn feature_to_segment(index: usize, feature: Feature) -> Segment {
    let prop = |key: &str| feature.properties.as_ref().and_then(|p| p.get(key));

    let source_id = prop("id").and_then(JsonValue::as_i64);
    let class = prop("class")
        .or_else(|| prop("subtype"))
        .and_then(JsonValue::as_str)
        .map(str::to_owned);
    let oneway_tag = prop("oneway").and_then(json_tag);
    let oneway_flag = prop("is_oneway").and_then(json_flag);

    let geometry = match feature.geometry.clone().map(Geometry::<f64>::try_from) {
        Some(Ok(g)) => g,
        Some(Err(e)) => {
            warn!("feature #{index}: unreadable geometry: {e}");
            empty_line()
        }
        None => {
            warn!("feature #{index}: no geometry");
            empty_line()
        }
    };

    Segment { source_id, geometry, class, oneway_tag, oneway_flag }
}

fn json_tag(v: &JsonValue) -> Option<String> {
    match v {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(b) => Some(if *b { "yes" } else { "no" }.to_owned()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_flag(v: &JsonValue) -> Option<bool> {
    match v {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => n.as_i64().map(|n| n != 0),
        JsonValue::String(s) => parse_flag(s),
        _ => None,
    }
}

// ── CSV ───────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SegmentRecord {
    id:        Option<i64>,
    class:     Option<String>,
    oneway:    Option<String>,
    is_oneway: Option<String>,
    wkt:       String,
}

pub fn load_csv(path: &Path) -> GraphResult<Vec<Segment>> {
    let file = std::fs::File::open(path)?;
    load_csv_reader(file)
}

/// Like [`load_csv`] but accepts any `Read` source.
///
/// Useful for testing (pass a `std::io::Cursor`) or reading an export
/// stream directly.
pub fn load_csv_reader<R: Read>(reader: R) -> GraphResult<Vec<Segment>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut segments = Vec::new();

    for (i, result) in csv_reader.deserialize::<SegmentRecord>().enumerate() {
        let row = result.map_err(|e| GraphError::Load(e.to_string()))?;

        let geometry = match Geometry::<f64>::try_from_wkt_str(&row.wkt) {
            Ok(g) => g,
            Err(e) => {
                warn!("row #{i}: unreadable WKT: {e}");
                empty_line()
            }
        };

        segments.push(Segment {
            source_id:   row.id,
            geometry,
            class:       row.class.filter(|c| !c.is_empty()),
            oneway_tag:  row.oneway.filter(|t| !t.is_empty()),
            oneway_flag: row.is_oneway.as_deref().and_then(parse_flag),
        });
    }

    Ok(segments)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "1" => Some(true),
        "false" | "f" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn empty_line() -> Geometry<f64> {
    Geometry::LineString(LineString::new(Vec::new()))
}

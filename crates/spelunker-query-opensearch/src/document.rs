//! Standard places results from indexed (truncated) record documents.

use serde_json::Value;
use spelunker_query::spr::{derive, UNKNOWN_ID};
use spelunker_query::uri::{id_to_rel_path, AltGeom, UriArgs};
use spelunker_query::{EdtfDate, ExistentialFlag, Result, SpelunkerError, StandardPlacesResult};

/// Integers may be indexed as whole floats (`85922583.0`); fractional
/// values are not integers and read as missing
fn int(doc: &Value, key: &str) -> Option<i64> {
    match doc.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float(doc: &Value, key: &str) -> Option<f64> {
    match doc.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text<'a>(doc: &'a Value, key: &str) -> Option<&'a str> {
    doc.get(key)?.as_str()
}

fn id_list(doc: &Value, key: &str) -> Vec<i64> {
    match doc.get(key) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|v| match v {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            })
            .collect(),
        Some(Value::Number(n)) => n.as_i64().into_iter().collect(),
        Some(Value::String(s)) => derive::id_list(Some(s.as_str())),
        _ => Vec::new(),
    }
}

/// `[min_lon, min_lat, max_lon, max_lat]`, stored either as an array or as
/// a comma separated string
fn bbox(doc: &Value) -> Option<[f64; 4]> {
    let values: Vec<f64> = match doc.get("geom:bbox")? {
        Value::Array(values) => values.iter().filter_map(Value::as_f64).collect(),
        Value::String(s) => s
            .split(',')
            .filter_map(|v| v.trim().parse().ok())
            .collect(),
        _ => return None,
    };

    values.try_into().ok()
}

/// The `wof:repo` of a document, if any
pub fn repo(doc: &Value) -> Option<&str> {
    text(doc, "wof:repo").filter(|r| !r.is_empty())
}

/// Build an SPR from an indexed document
pub fn spr_from_document(doc: &Value) -> Result<StandardPlacesResult> {
    let id = int(doc, "wof:id").ok_or_else(|| {
        SpelunkerError::Serialization("Indexed document has no integer wof:id".to_string())
    })?;

    let alt_label = text(doc, "src:alt_label").unwrap_or_default().to_string();
    let is_alt = !alt_label.is_empty();

    let args = match AltGeom::from_label(&alt_label) {
        Ok(alt) if is_alt => UriArgs::alternate(alt),
        _ => UriArgs::default(),
    };

    let path = id_to_rel_path(id, &args)?;

    let [min_longitude, min_latitude, max_longitude, max_latitude] =
        bbox(doc).unwrap_or([0.0; 4]);

    let superseded_by = id_list(doc, "wof:superseded_by");
    let supersedes = id_list(doc, "wof:supersedes");

    // The deprecation date wins over the indexer's derived flag
    let is_deprecated = match text(doc, "edtf:deprecated") {
        Some(date) => derive::is_deprecated(Some(date)),
        None => match int(doc, "mz:is_deprecated") {
            Some(flag) => ExistentialFlag::from_stored(Some(flag)),
            None => derive::is_deprecated(None),
        },
    };

    Ok(StandardPlacesResult {
        id,
        parent_id: int(doc, "wof:parent_id").unwrap_or(UNKNOWN_ID),
        name: text(doc, "wof:name").unwrap_or_default().to_string(),
        placetype: text(doc, "wof:placetype").unwrap_or_default().to_string(),
        country: text(doc, "wof:country").unwrap_or_default().to_string(),
        repo: repo(doc).unwrap_or_default().to_string(),
        uri: path.clone(),
        path,
        latitude: float(doc, "geom:latitude").unwrap_or(0.0),
        longitude: float(doc, "geom:longitude").unwrap_or(0.0),
        min_latitude,
        min_longitude,
        max_latitude,
        max_longitude,
        inception: EdtfDate::from_optional(text(doc, "edtf:inception")),
        cessation: EdtfDate::from_optional(text(doc, "edtf:cessation")),
        is_current: derive::is_current(int(doc, "mz:is_current")),
        is_ceased: derive::is_ceased(text(doc, "edtf:cessation")),
        is_deprecated,
        is_superseded: derive::is_superseded(&superseded_by),
        is_superseding: derive::is_superseding(&supersedes),
        superseded_by,
        supersedes,
        belongs_to: id_list(doc, "wof:belongsto"),
        is_alt,
        alt_label,
        last_modified: int(doc, "wof:lastmodified").unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> Value {
        json!({
            "wof:id": 85922583,
            "wof:parent_id": "102087579",
            "wof:name": "San Francisco",
            "wof:placetype": "locality",
            "wof:country": "US",
            "wof:repo": "whosonfirst-data-admin-us",
            "geom:latitude": 37.759715,
            "geom:longitude": -122.693976,
            "geom:bbox": "-122.51489,37.70809,-122.35698,37.81079",
            "mz:is_current": 1,
            "edtf:inception": "1850-04-15",
            "edtf:cessation": "..",
            "wof:supersedes": [],
            "wof:superseded_by": [],
            "wof:belongsto": [102087579, 85688637, 85633793],
            "wof:lastmodified": 1700000000
        })
    }

    #[test]
    fn test_spr_from_document() {
        let spr = spr_from_document(&document()).unwrap();

        assert_eq!(spr.id, 85922583);
        assert_eq!(spr.parent_id, 102087579);
        assert_eq!(spr.path, "859/225/83/85922583.geojson");
        assert_eq!(spr.min_longitude, -122.51489);
        assert_eq!(spr.max_latitude, 37.81079);
        assert_eq!(spr.is_current, ExistentialFlag::True);
        assert_eq!(spr.is_ceased, ExistentialFlag::False);
        assert_eq!(spr.is_deprecated, ExistentialFlag::False);
        assert_eq!(spr.is_superseded, ExistentialFlag::False);
        assert_eq!(spr.cessation, EdtfDate::Open);
        assert!(spr.descends_from(85633793));
    }

    #[test]
    fn test_deprecation_sources() {
        let mut doc = document();
        doc["mz:is_deprecated"] = json!(1);
        assert_eq!(spr_from_document(&doc).unwrap().is_deprecated, ExistentialFlag::True);

        doc["edtf:deprecated"] = json!("uuuu");
        assert_eq!(
            spr_from_document(&doc).unwrap().is_deprecated,
            ExistentialFlag::Unknown
        );
    }

    #[test]
    fn test_supersession_lists() {
        let mut doc = document();
        doc["wof:superseded_by"] = json!([1108830809]);
        doc["wof:supersedes"] = json!([85923517, 85923519]);

        let spr = spr_from_document(&doc).unwrap();
        assert_eq!(spr.superseded_by, vec![1108830809]);
        assert_eq!(spr.supersedes, vec![85923517, 85923519]);
        assert_eq!(spr.is_superseded, ExistentialFlag::True);
        assert_eq!(spr.is_superseding, ExistentialFlag::True);
    }

    #[test]
    fn test_alternate_document() {
        let mut doc = document();
        doc["src:alt_label"] = json!("quattroshapes");

        let spr = spr_from_document(&doc).unwrap();
        assert!(spr.is_alt);
        assert_eq!(spr.path, "859/225/83/85922583-alt-quattroshapes.geojson");
    }

    #[test]
    fn test_missing_id() {
        let err = spr_from_document(&json!({ "wof:name": "nowhere" })).unwrap_err();
        assert!(matches!(err, SpelunkerError::Serialization(_)));
    }

    #[test]
    fn test_float_ids() {
        let mut doc = document();
        doc["wof:id"] = json!(85922583.0);
        assert_eq!(spr_from_document(&doc).unwrap().id, 85922583);

        doc["wof:id"] = json!(85922583.7);
        let err = spr_from_document(&doc).unwrap_err();
        assert!(matches!(err, SpelunkerError::Serialization(_)));

        doc["wof:id"] = json!(85922583);
        doc["wof:parent_id"] = json!(102087579.5);
        assert_eq!(spr_from_document(&doc).unwrap().parent_id, UNKNOWN_ID);
    }
}

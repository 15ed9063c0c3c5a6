use crate::edtf::EdtfDate;
use crate::flag::ExistentialFlag;
use crate::pagination::PaginationResults;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Placeholder for ids the store does not know
pub const UNKNOWN_ID: i64 = -1;

/// Normalized, backend independent summary of a gazetteer record.
///
/// Every field is always populated. Missing data is expressed with sentinels:
/// [`UNKNOWN_ID`] for ids, empty strings, [`ExistentialFlag::Unknown`],
/// [`EdtfDate::Unknown`] and `0.0` coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardPlacesResult {
    pub id: i64,
    pub parent_id: i64,
    pub name: String,
    pub placetype: String,
    pub country: String,
    pub repo: String,
    pub path: String,
    pub uri: String,
    pub latitude: f64,
    pub longitude: f64,
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
    pub inception: EdtfDate,
    pub cessation: EdtfDate,
    pub is_current: ExistentialFlag,
    pub is_ceased: ExistentialFlag,
    pub is_deprecated: ExistentialFlag,
    pub is_superseded: ExistentialFlag,
    pub is_superseding: ExistentialFlag,
    pub superseded_by: Vec<i64>,
    pub supersedes: Vec<i64>,
    pub belongs_to: Vec<i64>,
    pub is_alt: bool,
    pub alt_label: String,
    pub last_modified: i64,
}

impl Default for StandardPlacesResult {
    fn default() -> Self {
        Self {
            id: UNKNOWN_ID,
            parent_id: UNKNOWN_ID,
            name: String::new(),
            placetype: String::new(),
            country: String::new(),
            repo: String::new(),
            path: String::new(),
            uri: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            min_latitude: 0.0,
            min_longitude: 0.0,
            max_latitude: 0.0,
            max_longitude: 0.0,
            inception: EdtfDate::Unknown,
            cessation: EdtfDate::Unknown,
            is_current: ExistentialFlag::Unknown,
            is_ceased: ExistentialFlag::Unknown,
            is_deprecated: ExistentialFlag::Unknown,
            is_superseded: ExistentialFlag::Unknown,
            is_superseding: ExistentialFlag::Unknown,
            superseded_by: Vec::new(),
            supersedes: Vec::new(),
            belongs_to: Vec::new(),
            is_alt: false,
            alt_label: String::new(),
            last_modified: 0,
        }
    }
}

impl StandardPlacesResult {
    /// Whether `id` is this record or one of its ancestors
    pub fn descends_from(&self, id: i64) -> bool {
        self.id == id || self.belongs_to.contains(&id)
    }
}

/// Unix timestamp `within` before now, the lower bound for "recently modified"
pub fn modified_since(within: Duration) -> i64 {
    let within = chrono::Duration::from_std(within).unwrap_or(chrono::Duration::MAX);
    chrono::Utc::now()
        .checked_sub_signed(within)
        .map(|t| t.timestamp())
        .unwrap_or(0)
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Places {
    pub results: Vec<StandardPlacesResult>,
    pub pagination: PaginationResults,
}

impl Places {
    pub fn new(results: Vec<StandardPlacesResult>, pagination: PaginationResults) -> Self {
        Self {
            results,
            pagination,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Flag derivation shared by every backend, so a record reports the same
/// flags whichever store it was read from.
pub mod derive {
    use super::*;

    /// Ceased from a cessation date: absent or open means not ceased,
    /// an unknown marker means unknown, anything else means ceased.
    pub fn is_ceased(cessation: Option<&str>) -> ExistentialFlag {
        date_flag(cessation)
    }

    /// Deprecated from a deprecation date, same rules as [`is_ceased`]
    pub fn is_deprecated(deprecated: Option<&str>) -> ExistentialFlag {
        date_flag(deprecated)
    }

    fn date_flag(date: Option<&str>) -> ExistentialFlag {
        match date.map(EdtfDate::parse) {
            None | Some(EdtfDate::Open) => ExistentialFlag::False,
            Some(EdtfDate::Unknown) => ExistentialFlag::Unknown,
            Some(EdtfDate::Known(_)) => ExistentialFlag::True,
        }
    }

    /// Superseded when anything supersedes the record
    pub fn is_superseded(superseded_by: &[i64]) -> ExistentialFlag {
        ExistentialFlag::from(!superseded_by.is_empty())
    }

    /// Superseding when the record supersedes anything
    pub fn is_superseding(supersedes: &[i64]) -> ExistentialFlag {
        ExistentialFlag::from(!supersedes.is_empty())
    }

    /// Current is stored as a tri-state integer
    pub fn is_current(stored: Option<i64>) -> ExistentialFlag {
        ExistentialFlag::from_stored(stored)
    }

    /// Parse a comma separated id list as stored in relational columns
    pub fn id_list(value: Option<&str>) -> Vec<i64> {
        value
            .unwrap_or_default()
            .split(',')
            .filter_map(|v| v.trim().parse::<i64>().ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_uses_sentinels() {
        let spr = StandardPlacesResult::default();
        assert_eq!(spr.id, UNKNOWN_ID);
        assert_eq!(spr.is_current, ExistentialFlag::Unknown);
        assert!(spr.inception.is_unknown());
    }

    #[test]
    fn test_ceased_derivation() {
        assert_eq!(derive::is_ceased(None), ExistentialFlag::False);
        assert_eq!(derive::is_ceased(Some("..")), ExistentialFlag::False);
        assert_eq!(derive::is_ceased(Some("uuuu")), ExistentialFlag::Unknown);
        assert_eq!(derive::is_ceased(Some("")), ExistentialFlag::Unknown);
        assert_eq!(derive::is_ceased(Some("2019-04-01")), ExistentialFlag::True);
    }

    #[test]
    fn test_supersession_derivation() {
        assert_eq!(derive::is_superseded(&[]), ExistentialFlag::False);
        assert_eq!(derive::is_superseded(&[101736545]), ExistentialFlag::True);
        assert_eq!(derive::is_superseding(&[]), ExistentialFlag::False);
    }

    #[test]
    fn test_modified_since() {
        let now = chrono::Utc::now().timestamp();
        let since = modified_since(Duration::from_secs(3600));
        assert!(now - since >= 3600 && now - since <= 3601);
        assert_eq!(modified_since(Duration::MAX), 0);
    }

    #[test]
    fn test_id_list() {
        assert_eq!(derive::id_list(Some("1, 2,x,3")), vec![1, 2, 3]);
        assert!(derive::id_list(None).is_empty());
        assert!(derive::id_list(Some("")).is_empty());
    }
}

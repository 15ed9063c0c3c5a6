use spelunker_query::spr::{derive, UNKNOWN_ID};
use spelunker_query::uri::{id_to_rel_path, AltGeom, UriArgs};
use spelunker_query::{EdtfDate, ExistentialFlag, StandardPlacesResult};

/// One row of the `spr` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SprRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: Option<String>,
    pub placetype: Option<String>,
    pub inception: Option<String>,
    pub cessation: Option<String>,
    pub country: Option<String>,
    pub repo: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub min_latitude: Option<f64>,
    pub min_longitude: Option<f64>,
    pub max_latitude: Option<f64>,
    pub max_longitude: Option<f64>,
    pub is_current: Option<i64>,
    pub is_deprecated: Option<i64>,
    pub supersedes: Option<String>,
    pub superseded_by: Option<String>,
    pub belongsto: Option<String>,
    pub is_alt: Option<i64>,
    pub alt_label: Option<String>,
    pub lastmodified: Option<i64>,
}

impl From<SprRow> for StandardPlacesResult {
    fn from(row: SprRow) -> Self {
        let superseded_by = derive::id_list(row.superseded_by.as_deref());
        let supersedes = derive::id_list(row.supersedes.as_deref());
        let belongs_to = derive::id_list(row.belongsto.as_deref());

        let alt_label = row.alt_label.unwrap_or_default();
        let is_alt = row.is_alt.unwrap_or(0) != 0;

        let args = match AltGeom::from_label(&alt_label) {
            Ok(alt) if is_alt => UriArgs::alternate(alt),
            _ => UriArgs::default(),
        };

        let path = id_to_rel_path(row.id, &args).unwrap_or_default();

        StandardPlacesResult {
            id: row.id,
            parent_id: row.parent_id.unwrap_or(UNKNOWN_ID),
            name: row.name.unwrap_or_default(),
            placetype: row.placetype.unwrap_or_default(),
            country: row.country.unwrap_or_default(),
            repo: row.repo.unwrap_or_default(),
            uri: path.clone(),
            path,
            latitude: row.latitude.unwrap_or(0.0),
            longitude: row.longitude.unwrap_or(0.0),
            min_latitude: row.min_latitude.unwrap_or(0.0),
            min_longitude: row.min_longitude.unwrap_or(0.0),
            max_latitude: row.max_latitude.unwrap_or(0.0),
            max_longitude: row.max_longitude.unwrap_or(0.0),
            inception: EdtfDate::from_optional(row.inception.as_deref()),
            is_ceased: derive::is_ceased(row.cessation.as_deref()),
            cessation: EdtfDate::from_optional(row.cessation.as_deref()),
            is_current: derive::is_current(row.is_current),
            // There is no deprecation date column, only the stored flag
            is_deprecated: ExistentialFlag::from_stored(row.is_deprecated),
            is_superseded: derive::is_superseded(&superseded_by),
            is_superseding: derive::is_superseding(&supersedes),
            superseded_by,
            supersedes,
            belongs_to,
            is_alt,
            alt_label,
            last_modified: row.lastmodified.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> SprRow {
        SprRow {
            id: 101736545,
            parent_id: Some(404568827),
            name: Some("Montreal".to_string()),
            placetype: Some("locality".to_string()),
            inception: Some("uuuu".to_string()),
            cessation: None,
            country: Some("CA".to_string()),
            repo: Some("whosonfirst-data-admin-ca".to_string()),
            latitude: Some(45.5),
            longitude: Some(-73.6),
            min_latitude: None,
            min_longitude: None,
            max_latitude: None,
            max_longitude: None,
            is_current: Some(1),
            is_deprecated: Some(0),
            supersedes: Some("".to_string()),
            superseded_by: Some("1729792387".to_string()),
            belongsto: Some("85633041,136251273".to_string()),
            is_alt: Some(0),
            alt_label: Some("".to_string()),
            lastmodified: Some(1700000000),
        }
    }

    #[test]
    fn test_row_to_spr() {
        let spr = StandardPlacesResult::from(row());

        assert_eq!(spr.path, "101/736/545/101736545.geojson");
        assert_eq!(spr.is_current, ExistentialFlag::True);
        assert_eq!(spr.is_ceased, ExistentialFlag::False);
        assert_eq!(spr.is_superseded, ExistentialFlag::True);
        assert_eq!(spr.is_superseding, ExistentialFlag::False);
        assert_eq!(spr.belongs_to, vec![85633041, 136251273]);
        assert!(spr.inception.is_unknown());
        assert_eq!(spr.min_latitude, 0.0);
    }

    #[test]
    fn test_missing_values_use_sentinels() {
        let mut r = row();
        r.parent_id = None;
        r.is_current = None;
        r.cessation = Some("uuuu".to_string());

        let spr = StandardPlacesResult::from(r);
        assert_eq!(spr.parent_id, UNKNOWN_ID);
        assert_eq!(spr.is_current, ExistentialFlag::Unknown);
        assert_eq!(spr.is_ceased, ExistentialFlag::Unknown);
    }
}

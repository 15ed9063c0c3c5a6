//! Tables and columns of the relational gazetteer.

pub const SPR_TABLE: &str = "spr";
pub const ANCESTORS_TABLE: &str = "ancestors";
pub const SEARCH_TABLE: &str = "search";
pub const CONCORDANCES_TABLE: &str = "concordances";
pub const GEOJSON_TABLE: &str = "geojson";

/// Columns read into a [`crate::row::SprRow`]
pub const SPR_COLUMNS: &str = "spr.id, spr.parent_id, spr.name, spr.placetype, spr.inception, spr.cessation, spr.country, spr.repo, spr.latitude, spr.longitude, spr.min_latitude, spr.min_longitude, spr.max_latitude, spr.max_longitude, spr.is_current, spr.is_deprecated, spr.supersedes, spr.superseded_by, spr.belongsto, spr.is_alt, spr.alt_label, spr.lastmodified";

/// SQLite DDL for an empty gazetteer database
pub const SQLITE_SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS spr (
        id INTEGER NOT NULL,
        parent_id INTEGER,
        name TEXT,
        placetype TEXT,
        inception TEXT,
        cessation TEXT,
        country TEXT,
        repo TEXT,
        latitude REAL,
        longitude REAL,
        min_latitude REAL,
        min_longitude REAL,
        max_latitude REAL,
        max_longitude REAL,
        is_current INTEGER,
        is_deprecated INTEGER,
        is_ceased INTEGER,
        is_superseded INTEGER,
        is_superseding INTEGER,
        superseded_by TEXT,
        supersedes TEXT,
        belongsto TEXT,
        is_alt INTEGER NOT NULL DEFAULT 0,
        alt_label TEXT NOT NULL DEFAULT '',
        lastmodified INTEGER
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS spr_by_id ON spr (id, alt_label)",
    "CREATE INDEX IF NOT EXISTS spr_by_placetype ON spr (placetype, country)",
    "CREATE INDEX IF NOT EXISTS spr_by_lastmod ON spr (lastmodified)",
    "CREATE TABLE IF NOT EXISTS ancestors (
        id INTEGER NOT NULL,
        ancestor_id INTEGER NOT NULL,
        ancestor_placetype TEXT,
        lastmodified INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS ancestors_by_ancestor ON ancestors (ancestor_id, id)",
    "CREATE TABLE IF NOT EXISTS concordances (
        id INTEGER NOT NULL,
        other_id TEXT NOT NULL,
        other_source TEXT NOT NULL,
        lastmodified INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS concordances_by_source ON concordances (other_source, other_id)",
    "CREATE VIRTUAL TABLE IF NOT EXISTS search USING fts5(
        id UNINDEXED, placetype, name, names_all, is_current UNINDEXED, is_deprecated UNINDEXED
    )",
    "CREATE TABLE IF NOT EXISTS geojson (
        id INTEGER NOT NULL,
        body TEXT NOT NULL,
        is_alt INTEGER NOT NULL DEFAULT 0,
        alt_label TEXT NOT NULL DEFAULT '',
        lastmodified INTEGER
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS geojson_by_id ON geojson (id, alt_label)",
];

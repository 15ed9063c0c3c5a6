//! Relational backend for spelunker-query
//!
//! Implements the `Spelunker` contract over a SQLite or PostgreSQL database
//! holding the `spr`, `ancestors`, `search`, `concordances` and `geojson`
//! tables. Configured with `sql://{engine}?dsn={dsn}`.

pub mod dialect;
mod executor;
pub mod query;
pub mod row;
pub mod schema;

use async_trait::async_trait;
use bytes::Bytes;
use dialect::Dialect;
use query::{SqlArg, Statement};
use schema::{ANCESTORS_TABLE, CONCORDANCES_TABLE, GEOJSON_TABLE, SPR_COLUMNS, SPR_TABLE};
use spelunker_query::{
    modified_since, namespace_faceting, Concordance, ConnectionConfig, Facet, Faceting, Filter,
    PaginationOptions, Placetype, Places, Result, SearchOptions, Spelunker, SpelunkerError,
    StandardPlacesResult, UriArgs,
};
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::time::Duration;
use tracing::{debug, info};

pub const SQL_SCHEME: &str = "sql";

const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Spelunker backed by a relational database
#[derive(Debug, Clone)]
pub struct SqlSpelunker {
    pool: AnyPool,
    dialect: Dialect,
}

impl SqlSpelunker {
    /// Connect using a `sql://{engine}?dsn={dsn}` configuration
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        if config.scheme != SQL_SCHEME {
            return Err(SpelunkerError::invalid_configuration(format!(
                "Expected {}:// URI, got {}://",
                SQL_SCHEME, config.scheme
            )));
        }

        let dialect = Dialect::from_engine(config.require_host()?)?;
        let dsn = config.require_option("dsn")?;
        let max_connections = config
            .parse_option::<u32>("max-connections")?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS);

        debug!(
            "Connecting to {} database: {}",
            dialect.name(),
            config.connection_string()
        );

        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections.max(2))
            .connect(dsn)
            .await
            .map_err(|e| SpelunkerError::backend("Failed to connect to database", e))?;

        info!("Connected to {} database", dialect.name());

        Ok(Self::with_pool(pool, dialect))
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: AnyPool, dialect: Dialect) -> Self {
        Self { pool, dialect }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn alt_predicate(args: &UriArgs) -> (&'static str, Vec<SqlArg>) {
        match args.alt_label() {
            Some(label) => ("alt_label = ?", vec![SqlArg::Text(label)]),
            None => ("is_alt = 0", vec![]),
        }
    }
}

fn describe(id: i64, args: &UriArgs) -> String {
    match args.alt_label() {
        Some(label) => format!("{} ({})", id, label),
        None => id.to_string(),
    }
}

#[async_trait]
impl Spelunker for SqlSpelunker {
    fn scheme(&self) -> &'static str {
        SQL_SCHEME
    }

    async fn get_record_for_id(&self, id: i64, args: &UriArgs) -> Result<Bytes> {
        let feature = self.get_feature_for_id(id, args).await?;

        let mut feature: serde_json::Value = serde_json::from_slice(&feature)
            .map_err(|e| SpelunkerError::Serialization(format!("Invalid feature {}: {}", id, e)))?;

        let properties = feature
            .get_mut("properties")
            .map(serde_json::Value::take)
            .ok_or_else(|| {
                SpelunkerError::Serialization(format!("Feature {} has no properties", id))
            })?;

        Ok(Bytes::from(serde_json::to_vec(&properties)?))
    }

    async fn get_spr_for_id(&self, id: i64, args: &UriArgs) -> Result<StandardPlacesResult> {
        let (alt_clause, alt_args) = Self::alt_predicate(args);

        let sql = format!(
            "SELECT {} FROM {} WHERE spr.id = ? AND spr.{}",
            SPR_COLUMNS, SPR_TABLE, alt_clause
        );
        let mut bind = vec![SqlArg::Int(id)];
        bind.extend(alt_args);

        let row = self
            .fetch_spr(&sql, &bind)
            .await
            .map_err(|e| e.with_context(format!("Failed to get SPR for {}", describe(id, args))))?
            .into_iter()
            .next()
            .ok_or_else(|| SpelunkerError::not_found(format!("Record {}", describe(id, args))))?;

        Ok(StandardPlacesResult::from(row))
    }

    async fn get_feature_for_id(&self, id: i64, args: &UriArgs) -> Result<Bytes> {
        let (alt_clause, alt_args) = Self::alt_predicate(args);

        let sql = format!(
            "SELECT body FROM {} WHERE id = ? AND {}",
            GEOJSON_TABLE, alt_clause
        );
        let mut bind = vec![SqlArg::Int(id)];
        bind.extend(alt_args);

        let body = self
            .fetch_optional_text(&sql, &bind)
            .await
            .map_err(|e| {
                e.with_context(format!("Failed to get feature for {}", describe(id, args)))
            })?
            .ok_or_else(|| SpelunkerError::not_found(format!("Feature {}", describe(id, args))))?;

        Ok(Bytes::from(body))
    }

    async fn get_descendants(
        &self,
        opts: &PaginationOptions,
        id: i64,
        filters: &[Filter],
    ) -> Result<Places> {
        let stmt = Statement::descendants(id).with_filters(filters)?;

        self.query_places(opts, &stmt)
            .await
            .map_err(|e| e.with_context(format!("Failed to get descendants of {}", id)))
    }

    async fn get_descendants_faceted(
        &self,
        id: i64,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let stmt = Statement::descendants(id).with_filters(filters)?;

        self.query_facets(&stmt, facets)
            .await
            .map_err(|e| e.with_context(format!("Failed to facet descendants of {}", id)))
    }

    async fn count_descendants(&self, id: i64) -> Result<i64> {
        let stmt = Statement::new(ANCESTORS_TABLE, "ancestors.id")
            .and("ancestors.ancestor_id = ?", [SqlArg::Int(id)])
            .and("ancestors.id != ?", [SqlArg::Int(id)]);

        self.count(&stmt)
            .await
            .map_err(|e| e.with_context(format!("Failed to count descendants of {}", id)))
    }

    async fn search(
        &self,
        opts: &PaginationOptions,
        search: &SearchOptions,
        filters: &[Filter],
    ) -> Result<Places> {
        let stmt = Statement::search(&self.dialect, &search.query, !filters.is_empty())
            .with_filters(filters)?;

        self.query_ids_then_places(opts, &stmt)
            .await
            .map_err(|e| e.with_context(format!("Failed to search for '{}'", search.query)))
    }

    async fn search_faceted(
        &self,
        search: &SearchOptions,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let stmt = Statement::search(&self.dialect, &search.query, true).with_filters(filters)?;

        self.query_facets(&stmt, facets)
            .await
            .map_err(|e| e.with_context(format!("Failed to facet search for '{}'", search.query)))
    }

    async fn get_recent(
        &self,
        opts: &PaginationOptions,
        within: Duration,
        filters: &[Filter],
    ) -> Result<Places> {
        let since = modified_since(within);
        let stmt = Statement::spr()
            .and("spr.lastmodified >= ?", [SqlArg::Int(since)])
            .with_filters(filters)?;

        self.query_places(opts, &stmt)
            .await
            .map_err(|e| e.with_context(format!("Failed to get records modified since {}", since)))
    }

    async fn get_recent_faceted(
        &self,
        within: Duration,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let since = modified_since(within);
        let stmt = Statement::spr()
            .and("spr.lastmodified >= ?", [SqlArg::Int(since)])
            .with_filters(filters)?;

        self.query_facets(&stmt, facets).await.map_err(|e| {
            e.with_context(format!("Failed to facet records modified since {}", since))
        })
    }

    async fn get_placetypes(&self) -> Result<Faceting> {
        let facet = Facet::new("placetype")?;

        self.query_facets(&Statement::spr(), std::slice::from_ref(&facet))
            .await?
            .pop()
            .ok_or_else(|| SpelunkerError::Backend("Missing placetype faceting".to_string()))
    }

    async fn has_placetype(
        &self,
        opts: &PaginationOptions,
        placetype: &Placetype,
        filters: &[Filter],
    ) -> Result<Places> {
        let stmt = Statement::spr()
            .and("spr.placetype = ?", [SqlArg::Text(placetype.name().to_string())])
            .with_filters(filters)?;

        self.query_places(opts, &stmt)
            .await
            .map_err(|e| e.with_context(format!("Failed to get records with placetype {}", placetype)))
    }

    async fn has_placetype_faceted(
        &self,
        placetype: &Placetype,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let stmt = Statement::spr()
            .and("spr.placetype = ?", [SqlArg::Text(placetype.name().to_string())])
            .with_filters(filters)?;

        self.query_facets(&stmt, facets).await.map_err(|e| {
            e.with_context(format!("Failed to facet records with placetype {}", placetype))
        })
    }

    async fn get_alternate_placetypes(&self) -> Result<Faceting> {
        Err(SpelunkerError::not_implemented(
            "Alternate placetypes are not supported by the SQL backend",
        ))
    }

    async fn has_alternate_placetype(
        &self,
        _opts: &PaginationOptions,
        _placetype: &str,
        _filters: &[Filter],
    ) -> Result<Places> {
        Err(SpelunkerError::not_implemented(
            "Alternate placetypes are not supported by the SQL backend",
        ))
    }

    async fn has_alternate_placetype_faceted(
        &self,
        _placetype: &str,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        Err(SpelunkerError::not_implemented(
            "Alternate placetypes are not supported by the SQL backend",
        ))
    }

    async fn get_concordances(&self) -> Result<Faceting> {
        let stmt = Statement::new(CONCORDANCES_TABLE, "concordances.id");
        let (sql, args) = stmt.facet("concordances.other_source");

        let sources = self
            .fetch_facet_counts(&sql, &args)
            .await
            .map_err(|e| e.with_context("Failed to get concordances"))?;

        namespace_faceting(sources)
    }

    async fn has_concordance(
        &self,
        opts: &PaginationOptions,
        concordance: &Concordance,
        filters: &[Filter],
    ) -> Result<Places> {
        let stmt =
            Statement::concordance(concordance, !filters.is_empty())?.with_filters(filters)?;

        self.query_ids_then_places(opts, &stmt).await.map_err(|e| {
            e.with_context(format!("Failed to get records with concordance {}", concordance))
        })
    }

    async fn has_concordance_faceted(
        &self,
        concordance: &Concordance,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let stmt = Statement::concordance(concordance, true)?.with_filters(filters)?;

        self.query_facets(&stmt, facets).await.map_err(|e| {
            e.with_context(format!("Failed to facet records with concordance {}", concordance))
        })
    }

    async fn get_tags(&self) -> Result<Faceting> {
        Err(SpelunkerError::not_implemented(
            "Tags are not supported by the SQL backend",
        ))
    }

    async fn has_tag(
        &self,
        _opts: &PaginationOptions,
        _tag: &str,
        _filters: &[Filter],
    ) -> Result<Places> {
        Err(SpelunkerError::not_implemented(
            "Tags are not supported by the SQL backend",
        ))
    }

    async fn has_tag_faceted(
        &self,
        _tag: &str,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        Err(SpelunkerError::not_implemented(
            "Tags are not supported by the SQL backend",
        ))
    }

    async fn visiting_null_island(
        &self,
        opts: &PaginationOptions,
        filters: &[Filter],
    ) -> Result<Places> {
        let stmt = Statement::spr()
            .and("spr.latitude = ?", [SqlArg::Float(0.0)])
            .and("spr.longitude = ?", [SqlArg::Float(0.0)])
            .with_filters(filters)?;

        self.query_places(opts, &stmt)
            .await
            .map_err(|e| e.with_context("Failed to get records visiting null island"))
    }

    async fn visiting_null_island_faceted(
        &self,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let stmt = Statement::spr()
            .and("spr.latitude = ?", [SqlArg::Float(0.0)])
            .and("spr.longitude = ?", [SqlArg::Float(0.0)])
            .with_filters(filters)?;

        self.query_facets(&stmt, facets)
            .await
            .map_err(|e| e.with_context("Failed to facet records visiting null island"))
    }
}

use async_trait::async_trait;
use bytes::Bytes;
use spelunker_query::null::NULL_SCHEME;
use spelunker_query::{
    Concordance, ConnectionConfig, Facet, Faceting, Filter, NullSpelunker, PaginationOptions,
    Placetype, Places, Result, SearchOptions, Spelunker, SpelunkerError, StandardPlacesResult,
    UriArgs,
};
use spelunker_query_opensearch::{OpenSearchSpelunker, OPENSEARCH_SCHEME};
use spelunker_query_sql::{SqlSpelunker, SQL_SCHEME};
use std::time::Duration;
use tracing::info;

/// One of the supported backends, chosen at startup
#[derive(Clone)]
pub enum AnySpelunker {
    Sql(SqlSpelunker),
    OpenSearch(OpenSearchSpelunker),
    Null(NullSpelunker),
}

/// Schemes accepted by [`open`]
pub fn schemes() -> Vec<&'static str> {
    vec![NULL_SCHEME, OPENSEARCH_SCHEME, SQL_SCHEME]
}

/// Create the backend named by the scheme of `uri`
pub async fn open(uri: &str) -> Result<AnySpelunker> {
    let config = ConnectionConfig::parse(uri)?;

    let spelunker = match config.scheme.as_str() {
        SQL_SCHEME => AnySpelunker::Sql(SqlSpelunker::connect(&config).await?),
        OPENSEARCH_SCHEME => AnySpelunker::OpenSearch(OpenSearchSpelunker::new(&config)?),
        NULL_SCHEME => AnySpelunker::Null(NullSpelunker::new()),
        other => {
            return Err(SpelunkerError::not_implemented(format!(
                "scheme not implemented: {}",
                other
            )))
        }
    };

    info!("Opened {} spelunker", spelunker.scheme());
    Ok(spelunker)
}

impl From<SqlSpelunker> for AnySpelunker {
    fn from(s: SqlSpelunker) -> Self {
        AnySpelunker::Sql(s)
    }
}

impl From<OpenSearchSpelunker> for AnySpelunker {
    fn from(s: OpenSearchSpelunker) -> Self {
        AnySpelunker::OpenSearch(s)
    }
}

impl From<NullSpelunker> for AnySpelunker {
    fn from(s: NullSpelunker) -> Self {
        AnySpelunker::Null(s)
    }
}

macro_rules! dispatch {
    ($self:ident, $inner:ident => $call:expr) => {
        match $self {
            AnySpelunker::Sql($inner) => $call,
            AnySpelunker::OpenSearch($inner) => $call,
            AnySpelunker::Null($inner) => $call,
        }
    };
}

#[async_trait]
impl Spelunker for AnySpelunker {
    fn scheme(&self) -> &'static str {
        dispatch!(self, s => s.scheme())
    }

    async fn get_record_for_id(&self, id: i64, args: &UriArgs) -> Result<Bytes> {
        dispatch!(self, s => s.get_record_for_id(id, args).await)
    }

    async fn get_spr_for_id(&self, id: i64, args: &UriArgs) -> Result<StandardPlacesResult> {
        dispatch!(self, s => s.get_spr_for_id(id, args).await)
    }

    async fn get_feature_for_id(&self, id: i64, args: &UriArgs) -> Result<Bytes> {
        dispatch!(self, s => s.get_feature_for_id(id, args).await)
    }

    async fn get_descendants(
        &self,
        opts: &PaginationOptions,
        id: i64,
        filters: &[Filter],
    ) -> Result<Places> {
        dispatch!(self, s => s.get_descendants(opts, id, filters).await)
    }

    async fn get_descendants_faceted(
        &self,
        id: i64,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        dispatch!(self, s => s.get_descendants_faceted(id, filters, facets).await)
    }

    async fn count_descendants(&self, id: i64) -> Result<i64> {
        dispatch!(self, s => s.count_descendants(id).await)
    }

    async fn search(
        &self,
        opts: &PaginationOptions,
        search: &SearchOptions,
        filters: &[Filter],
    ) -> Result<Places> {
        dispatch!(self, s => s.search(opts, search, filters).await)
    }

    async fn search_faceted(
        &self,
        search: &SearchOptions,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        dispatch!(self, s => s.search_faceted(search, filters, facets).await)
    }

    async fn get_recent(
        &self,
        opts: &PaginationOptions,
        within: Duration,
        filters: &[Filter],
    ) -> Result<Places> {
        dispatch!(self, s => s.get_recent(opts, within, filters).await)
    }

    async fn get_recent_faceted(
        &self,
        within: Duration,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        dispatch!(self, s => s.get_recent_faceted(within, filters, facets).await)
    }

    async fn get_placetypes(&self) -> Result<Faceting> {
        dispatch!(self, s => s.get_placetypes().await)
    }

    async fn has_placetype(
        &self,
        opts: &PaginationOptions,
        placetype: &Placetype,
        filters: &[Filter],
    ) -> Result<Places> {
        dispatch!(self, s => s.has_placetype(opts, placetype, filters).await)
    }

    async fn has_placetype_faceted(
        &self,
        placetype: &Placetype,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        dispatch!(self, s => s.has_placetype_faceted(placetype, filters, facets).await)
    }

    async fn get_alternate_placetypes(&self) -> Result<Faceting> {
        dispatch!(self, s => s.get_alternate_placetypes().await)
    }

    async fn has_alternate_placetype(
        &self,
        opts: &PaginationOptions,
        placetype: &str,
        filters: &[Filter],
    ) -> Result<Places> {
        dispatch!(self, s => s.has_alternate_placetype(opts, placetype, filters).await)
    }

    async fn has_alternate_placetype_faceted(
        &self,
        placetype: &str,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        dispatch!(self, s => s.has_alternate_placetype_faceted(placetype, filters, facets).await)
    }

    async fn get_concordances(&self) -> Result<Faceting> {
        dispatch!(self, s => s.get_concordances().await)
    }

    async fn has_concordance(
        &self,
        opts: &PaginationOptions,
        concordance: &Concordance,
        filters: &[Filter],
    ) -> Result<Places> {
        dispatch!(self, s => s.has_concordance(opts, concordance, filters).await)
    }

    async fn has_concordance_faceted(
        &self,
        concordance: &Concordance,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        dispatch!(self, s => s.has_concordance_faceted(concordance, filters, facets).await)
    }

    async fn get_tags(&self) -> Result<Faceting> {
        dispatch!(self, s => s.get_tags().await)
    }

    async fn has_tag(
        &self,
        opts: &PaginationOptions,
        tag: &str,
        filters: &[Filter],
    ) -> Result<Places> {
        dispatch!(self, s => s.has_tag(opts, tag, filters).await)
    }

    async fn has_tag_faceted(
        &self,
        tag: &str,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        dispatch!(self, s => s.has_tag_faceted(tag, filters, facets).await)
    }

    async fn visiting_null_island(
        &self,
        opts: &PaginationOptions,
        filters: &[Filter],
    ) -> Result<Places> {
        dispatch!(self, s => s.visiting_null_island(opts, filters).await)
    }

    async fn visiting_null_island_faceted(
        &self,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        dispatch!(self, s => s.visiting_null_island_faceted(filters, facets).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelunker_query_sql::schema::SQLITE_SCHEMA;

    #[tokio::test]
    async fn test_open_null() {
        let spelunker = open("null://").await.unwrap();

        assert_eq!(spelunker.scheme(), "null");
        assert!(spelunker
            .count_descendants(85633793)
            .await
            .unwrap_err()
            .is_not_implemented());
    }

    #[tokio::test]
    async fn test_open_unknown_scheme() {
        let err = open("bogus://").await.err().unwrap();

        assert!(err.is_not_implemented());
        assert!(err.to_string().contains("scheme not implemented: bogus"));
    }

    #[tokio::test]
    async fn test_open_invalid_uri() {
        let err = open("not a uri").await.err().unwrap();
        assert!(matches!(err, SpelunkerError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_open_opensearch() {
        let spelunker = open("opensearch://?client-uri=http://localhost:9200/spelunker")
            .await
            .unwrap();
        assert_eq!(spelunker.scheme(), "opensearch");

        let err = open("opensearch://").await.err().unwrap();
        assert!(matches!(err, SpelunkerError::InvalidConfiguration(_)));
    }

    #[tokio::test]
    async fn test_open_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let dsn = format!("sqlite://{}?mode=rwc", dir.path().join("gazetteer.db").display());
        let uri = format!("sql://sqlite?dsn={}", urlencoding::encode(&dsn));

        let spelunker = open(&uri).await.unwrap();
        assert_eq!(spelunker.scheme(), "sql");

        let AnySpelunker::Sql(sql) = &spelunker else {
            panic!("expected the sql backend");
        };

        for ddl in SQLITE_SCHEMA {
            sqlx::query(ddl).execute(sql.pool()).await.unwrap();
        }

        assert_eq!(spelunker.count_descendants(85633793).await.unwrap(), 0);

        let err = spelunker
            .get_spr_for_id(85633793, &UriArgs::default())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_schemes() {
        assert_eq!(schemes(), vec!["null", "opensearch", "sql"]);
    }
}

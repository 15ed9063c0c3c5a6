//! OpenSearch backend for spelunker-query
//!
//! Queries an index of truncated record documents. Complete GeoJSON features
//! are not indexed and are read through a [`reader::DocumentReader`] instead,
//! optionally wrapped in a [`cache::MemoryCache`].
//!
//! Configured with
//! `opensearch://?client-uri={http(s)://host/index}&reader-uri={uri}&cache-uri={uri}`.

pub mod cache;
pub mod client;
pub mod document;
mod executor;
pub mod query;
pub mod reader;

use async_trait::async_trait;
use bytes::Bytes;
use cache::MemoryCache;
use client::{OpenSearchClient, SearchParams};
use reader::{reader_from_uri, CachingReader, DocumentReader, HttpReader};
use serde_json::Value;
use spelunker_query::{
    id_to_rel_path, modified_since, Concordance, ConnectionConfig, Facet, Faceting, Filter,
    PaginationOptions, Placetype, Places, Result, SearchOptions, Spelunker, SpelunkerError,
    StandardPlacesResult, UriArgs, CONCORDANCE_FACET,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub use executor::{select_strategy, Strategy, SCROLL_THRESHOLD};

pub const OPENSEARCH_SCHEME: &str = "opensearch";

/// Spelunker backed by an OpenSearch index
#[derive(Clone)]
pub struct OpenSearchSpelunker {
    client: OpenSearchClient,
    reader: Option<Arc<dyn DocumentReader>>,
    cache: Option<MemoryCache>,
}

impl OpenSearchSpelunker {
    /// Create a spelunker from an `opensearch://` configuration.
    ///
    /// Without a `reader-uri`, features are read from the GitHub repository
    /// named by each record's `wof:repo`.
    pub fn new(config: &ConnectionConfig) -> Result<Self> {
        if config.scheme != OPENSEARCH_SCHEME {
            return Err(SpelunkerError::invalid_configuration(format!(
                "Expected {}:// URI, got {}://",
                OPENSEARCH_SCHEME, config.scheme
            )));
        }

        let client = OpenSearchClient::from_uri(config.require_option("client-uri")?)?;
        let mut spelunker = Self::with_client(client);

        if let Some(uri) = config.option("reader-uri") {
            spelunker = spelunker.with_reader(reader_from_uri(uri)?);
        }

        if let Some(uri) = config.option("cache-uri") {
            if let Some(cache) = MemoryCache::from_uri(uri)? {
                spelunker = spelunker.with_cache(cache);
            }
        }

        info!(
            "Using OpenSearch index {} at {}",
            spelunker.client.index(),
            spelunker.client.base_url()
        );

        Ok(spelunker)
    }

    pub fn with_client(client: OpenSearchClient) -> Self {
        Self {
            client,
            reader: None,
            cache: None,
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn DocumentReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_cache(mut self, cache: MemoryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn client(&self) -> &OpenSearchClient {
        &self.client
    }

    /// Indexed document id, `{id}` or `{id}-alt-{label}`
    fn document_id(id: i64, args: &UriArgs) -> String {
        match args.alt_label() {
            Some(label) => format!("{}-alt-{}", id, label),
            None => id.to_string(),
        }
    }

    async fn get_document(&self, id: i64, args: &UriArgs) -> Result<Value> {
        let doc_id = Self::document_id(id, args);
        let body = query::query_body(query::ids(&doc_id));

        let rsp = self
            .client
            .search(&body, SearchParams::window(1, 0))
            .await
            .map_err(|e| e.with_context(format!("Failed to retrieve {}", doc_id)))?;

        rsp.hits
            .hits
            .into_iter()
            .next()
            .map(|hit| hit.source)
            .ok_or_else(|| SpelunkerError::not_found(format!("Record {} not found", doc_id)))
    }

    async fn feature_reader(&self, id: i64, args: &UriArgs) -> Result<Arc<dyn DocumentReader>> {
        let reader: Arc<dyn DocumentReader> = match &self.reader {
            Some(reader) => reader.clone(),
            None => {
                let doc = self.get_document(id, args).await?;
                let repo = document::repo(&doc).ok_or_else(|| {
                    SpelunkerError::invalid_configuration(format!(
                        "Record {} has no wof:repo and no reader-uri is configured",
                        id
                    ))
                })?;

                Arc::new(HttpReader::github(repo)?)
            }
        };

        let reader: Arc<dyn DocumentReader> = match &self.cache {
            Some(cache) => Arc::new(CachingReader::new(reader, cache.clone())),
            None => reader,
        };

        Ok(reader)
    }

    async fn single_faceting(&self, facet: &str) -> Result<Faceting> {
        let facets = vec![Facet::new(facet)?];

        self.query_facets(query::match_all(), &facets)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SpelunkerError::Backend(format!("No {} faceting returned", facet)))
    }
}

fn alternate_placetype(placetype: &str) -> Result<&str> {
    let placetype = placetype.trim();

    if placetype.is_empty() {
        return Err(SpelunkerError::invalid_input("Empty alternate placetype"));
    }

    Ok(placetype)
}

#[async_trait]
impl Spelunker for OpenSearchSpelunker {
    fn scheme(&self) -> &'static str {
        OPENSEARCH_SCHEME
    }

    async fn get_record_for_id(&self, id: i64, args: &UriArgs) -> Result<Bytes> {
        let doc = self.get_document(id, args).await?;
        Ok(Bytes::from(serde_json::to_vec(&doc)?))
    }

    async fn get_spr_for_id(&self, id: i64, args: &UriArgs) -> Result<StandardPlacesResult> {
        let doc = self.get_document(id, args).await?;
        document::spr_from_document(&doc)
    }

    async fn get_feature_for_id(&self, id: i64, args: &UriArgs) -> Result<Bytes> {
        let rel_path = id_to_rel_path(id, args)?;
        let reader = self.feature_reader(id, args).await?;

        reader
            .read(&rel_path)
            .await
            .map_err(|e| e.with_context(format!("Failed to read feature {}", id)))
    }

    async fn get_descendants(
        &self,
        opts: &PaginationOptions,
        id: i64,
        filters: &[Filter],
    ) -> Result<Places> {
        let criteria = query::with_filters(query::descendants(id), filters)?;

        self.search_paginated(opts, criteria)
            .await
            .map_err(|e| e.with_context(format!("Failed to get descendants of {}", id)))
    }

    async fn get_descendants_faceted(
        &self,
        id: i64,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let criteria = query::with_filters(query::descendants(id), filters)?;

        self.query_facets(criteria, facets)
            .await
            .map_err(|e| e.with_context(format!("Failed to facet descendants of {}", id)))
    }

    async fn count_descendants(&self, id: i64) -> Result<i64> {
        self.count(&query::descendants(id))
            .await
            .map_err(|e| e.with_context(format!("Failed to count descendants of {}", id)))
    }

    async fn search(
        &self,
        opts: &PaginationOptions,
        search: &SearchOptions,
        filters: &[Filter],
    ) -> Result<Places> {
        let criteria = query::with_filters(query::search(search), filters)?;

        self.search_paginated(opts, criteria)
            .await
            .map_err(|e| e.with_context(format!("Failed to search for '{}'", search.query)))
    }

    async fn search_faceted(
        &self,
        search: &SearchOptions,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let criteria = query::with_filters(query::search(search), filters)?;

        self.query_facets(criteria, facets)
            .await
            .map_err(|e| e.with_context(format!("Failed to facet search for '{}'", search.query)))
    }

    async fn get_recent(
        &self,
        opts: &PaginationOptions,
        within: Duration,
        filters: &[Filter],
    ) -> Result<Places> {
        let criteria = query::with_filters(query::recent(modified_since(within)), filters)?;

        self.search_paginated(opts, criteria)
            .await
            .map_err(|e| e.with_context("Failed to get recent records"))
    }

    async fn get_recent_faceted(
        &self,
        within: Duration,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let criteria = query::with_filters(query::recent(modified_since(within)), filters)?;

        self.query_facets(criteria, facets)
            .await
            .map_err(|e| e.with_context("Failed to facet recent records"))
    }

    async fn get_placetypes(&self) -> Result<Faceting> {
        self.single_faceting("placetype")
            .await
            .map_err(|e| e.with_context("Failed to get placetypes"))
    }

    async fn has_placetype(
        &self,
        opts: &PaginationOptions,
        placetype: &Placetype,
        filters: &[Filter],
    ) -> Result<Places> {
        let criteria = query::with_filters(query::placetype(placetype.name()), filters)?;

        self.search_paginated(opts, criteria)
            .await
            .map_err(|e| e.with_context(format!("Failed to get records with placetype {}", placetype)))
    }

    async fn has_placetype_faceted(
        &self,
        placetype: &Placetype,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let criteria = query::with_filters(query::placetype(placetype.name()), filters)?;

        self.query_facets(criteria, facets).await.map_err(|e| {
            e.with_context(format!("Failed to facet records with placetype {}", placetype))
        })
    }

    async fn get_alternate_placetypes(&self) -> Result<Faceting> {
        self.single_faceting("placetypealt")
            .await
            .map_err(|e| e.with_context("Failed to get alternate placetypes"))
    }

    async fn has_alternate_placetype(
        &self,
        opts: &PaginationOptions,
        placetype: &str,
        filters: &[Filter],
    ) -> Result<Places> {
        let placetype = alternate_placetype(placetype)?;
        let criteria = query::with_filters(query::alternate_placetype(placetype), filters)?;

        self.search_paginated(opts, criteria).await.map_err(|e| {
            e.with_context(format!(
                "Failed to get records with alternate placetype {}",
                placetype
            ))
        })
    }

    async fn has_alternate_placetype_faceted(
        &self,
        placetype: &str,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let placetype = alternate_placetype(placetype)?;
        let criteria = query::with_filters(query::alternate_placetype(placetype), filters)?;

        self.query_facets(criteria, facets).await.map_err(|e| {
            e.with_context(format!(
                "Failed to facet records with alternate placetype {}",
                placetype
            ))
        })
    }

    async fn get_concordances(&self) -> Result<Faceting> {
        let sources = self
            .single_faceting(CONCORDANCE_FACET)
            .await
            .map_err(|e| e.with_context("Failed to get concordances"))?;

        spelunker_query::namespace_faceting(sources.results)
    }

    async fn has_concordance(
        &self,
        opts: &PaginationOptions,
        concordance: &Concordance,
        filters: &[Filter],
    ) -> Result<Places> {
        let criteria = query::with_filters(query::concordance(concordance)?, filters)?;

        self.search_paginated(opts, criteria).await.map_err(|e| {
            e.with_context(format!("Failed to get records with concordance {}", concordance))
        })
    }

    async fn has_concordance_faceted(
        &self,
        concordance: &Concordance,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let criteria = query::with_filters(query::concordance(concordance)?, filters)?;

        self.query_facets(criteria, facets).await.map_err(|e| {
            e.with_context(format!("Failed to facet records with concordance {}", concordance))
        })
    }

    async fn get_tags(&self) -> Result<Faceting> {
        Err(SpelunkerError::not_implemented(
            "Tags are not supported by the opensearch backend",
        ))
    }

    async fn has_tag(
        &self,
        _opts: &PaginationOptions,
        _tag: &str,
        _filters: &[Filter],
    ) -> Result<Places> {
        Err(SpelunkerError::not_implemented(
            "Tags are not supported by the opensearch backend",
        ))
    }

    async fn has_tag_faceted(
        &self,
        _tag: &str,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        Err(SpelunkerError::not_implemented(
            "Tags are not supported by the opensearch backend",
        ))
    }

    async fn visiting_null_island(
        &self,
        opts: &PaginationOptions,
        filters: &[Filter],
    ) -> Result<Places> {
        let criteria = query::with_filters(query::null_island(), filters)?;

        self.search_paginated(opts, criteria)
            .await
            .map_err(|e| e.with_context("Failed to get records visiting null island"))
    }

    async fn visiting_null_island_faceted(
        &self,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let criteria = query::with_filters(query::null_island(), filters)?;

        self.query_facets(criteria, facets)
            .await
            .map_err(|e| e.with_context("Failed to facet records visiting null island"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spelunker_query::AltGeom;

    #[test]
    fn test_new_from_config() {
        let config = ConnectionConfig::parse(
            "opensearch://?client-uri=http%3A%2F%2Flocalhost%3A9200%2Fspelunker&cache-uri=memory%3A%2F%2F",
        )
        .unwrap();

        let spelunker = OpenSearchSpelunker::new(&config).unwrap();
        assert_eq!(spelunker.client().index(), "spelunker");
        assert!(spelunker.reader.is_none());
        assert!(spelunker.cache.is_some());
    }

    #[test]
    fn test_new_requires_client_uri() {
        let err = OpenSearchSpelunker::new(&ConnectionConfig::new("opensearch")).err().unwrap();
        assert!(matches!(err, SpelunkerError::InvalidConfiguration(_)));

        let err = OpenSearchSpelunker::new(&ConnectionConfig::new("sql")).err().unwrap();
        assert!(matches!(err, SpelunkerError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_document_id() {
        assert_eq!(
            OpenSearchSpelunker::document_id(85922583, &UriArgs::default()),
            "85922583"
        );

        let args = UriArgs::alternate(AltGeom::new("quattroshapes"));
        assert_eq!(
            OpenSearchSpelunker::document_id(85922583, &args),
            "85922583-alt-quattroshapes"
        );
    }
}

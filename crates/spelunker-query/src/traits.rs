use crate::concordance::Concordance;
use crate::error::Result;
use crate::facet::{Facet, Faceting};
use crate::filter::Filter;
use crate::pagination::PaginationOptions;
use crate::placetype::Placetype;
use crate::search::SearchOptions;
use crate::spr::{Places, StandardPlacesResult};
use crate::uri::UriArgs;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

/// Read-only access to the gazetteer, whichever store backs it.
///
/// Every query axis comes in a paginated form returning [`Places`] and a
/// faceted form returning one [`Faceting`] per requested [`Facet`]. Callers
/// must pass a non-empty facet list to the faceted forms.
///
/// Backends that cannot answer a method return
/// [`SpelunkerError::NotImplemented`](crate::SpelunkerError::NotImplemented).
#[async_trait]
pub trait Spelunker: Send + Sync {
    /// Get the scheme name of this backend
    fn scheme(&self) -> &'static str;

    /// The stored record for an id, as JSON
    async fn get_record_for_id(&self, id: i64, args: &UriArgs) -> Result<Bytes>;

    async fn get_spr_for_id(&self, id: i64, args: &UriArgs) -> Result<StandardPlacesResult>;

    /// The complete GeoJSON feature for an id, geometry included
    async fn get_feature_for_id(&self, id: i64, args: &UriArgs) -> Result<Bytes>;

    /// Records whose ancestry includes `id`
    async fn get_descendants(
        &self,
        opts: &PaginationOptions,
        id: i64,
        filters: &[Filter],
    ) -> Result<Places>;

    async fn get_descendants_faceted(
        &self,
        id: i64,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>>;

    /// Number of descendants of `id`, not counting `id` itself
    async fn count_descendants(&self, id: i64) -> Result<i64>;

    async fn search(
        &self,
        opts: &PaginationOptions,
        search: &SearchOptions,
        filters: &[Filter],
    ) -> Result<Places>;

    async fn search_faceted(
        &self,
        search: &SearchOptions,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>>;

    /// Records modified within `within` of now
    async fn get_recent(
        &self,
        opts: &PaginationOptions,
        within: Duration,
        filters: &[Filter],
    ) -> Result<Places>;

    async fn get_recent_faceted(
        &self,
        within: Duration,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>>;

    /// Distribution of placetypes across all records
    async fn get_placetypes(&self) -> Result<Faceting>;

    async fn has_placetype(
        &self,
        opts: &PaginationOptions,
        placetype: &Placetype,
        filters: &[Filter],
    ) -> Result<Places>;

    async fn has_placetype_faceted(
        &self,
        placetype: &Placetype,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>>;

    async fn get_alternate_placetypes(&self) -> Result<Faceting>;

    async fn has_alternate_placetype(
        &self,
        opts: &PaginationOptions,
        placetype: &str,
        filters: &[Filter],
    ) -> Result<Places>;

    async fn has_alternate_placetype_faceted(
        &self,
        placetype: &str,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>>;

    /// Distribution of concordance namespaces across all records
    async fn get_concordances(&self) -> Result<Faceting>;

    async fn has_concordance(
        &self,
        opts: &PaginationOptions,
        concordance: &Concordance,
        filters: &[Filter],
    ) -> Result<Places>;

    async fn has_concordance_faceted(
        &self,
        concordance: &Concordance,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>>;

    async fn get_tags(&self) -> Result<Faceting>;

    async fn has_tag(
        &self,
        opts: &PaginationOptions,
        tag: &str,
        filters: &[Filter],
    ) -> Result<Places>;

    async fn has_tag_faceted(
        &self,
        tag: &str,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>>;

    /// Records whose centroid is (0.0, 0.0)
    async fn visiting_null_island(
        &self,
        opts: &PaginationOptions,
        filters: &[Filter],
    ) -> Result<Places>;

    async fn visiting_null_island_faceted(
        &self,
        filters: &[Filter],
        facets: &[Facet],
    ) -> Result<Vec<Faceting>>;
}

//! A backend that answers nothing.
//!
//! Every method fails with [`SpelunkerError::NotImplemented`]. Useful as a
//! placeholder while wiring up callers.

use crate::concordance::Concordance;
use crate::error::{Result, SpelunkerError};
use crate::facet::{Facet, Faceting};
use crate::filter::Filter;
use crate::pagination::PaginationOptions;
use crate::placetype::Placetype;
use crate::search::SearchOptions;
use crate::spr::{Places, StandardPlacesResult};
use crate::traits::Spelunker;
use crate::uri::UriArgs;
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;

pub const NULL_SCHEME: &str = "null";

#[derive(Debug, Clone, Default)]
pub struct NullSpelunker;

impl NullSpelunker {
    pub fn new() -> Self {
        Self
    }
}

fn not_implemented<T>(method: &str) -> Result<T> {
    Err(SpelunkerError::not_implemented(format!(
        "{} is not implemented by the null backend",
        method
    )))
}

#[async_trait]
impl Spelunker for NullSpelunker {
    fn scheme(&self) -> &'static str {
        NULL_SCHEME
    }

    async fn get_record_for_id(&self, _id: i64, _args: &UriArgs) -> Result<Bytes> {
        not_implemented("get_record_for_id")
    }

    async fn get_spr_for_id(&self, _id: i64, _args: &UriArgs) -> Result<StandardPlacesResult> {
        not_implemented("get_spr_for_id")
    }

    async fn get_feature_for_id(&self, _id: i64, _args: &UriArgs) -> Result<Bytes> {
        not_implemented("get_feature_for_id")
    }

    async fn get_descendants(
        &self,
        _opts: &PaginationOptions,
        _id: i64,
        _filters: &[Filter],
    ) -> Result<Places> {
        not_implemented("get_descendants")
    }

    async fn get_descendants_faceted(
        &self,
        _id: i64,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        not_implemented("get_descendants_faceted")
    }

    async fn count_descendants(&self, _id: i64) -> Result<i64> {
        not_implemented("count_descendants")
    }

    async fn search(
        &self,
        _opts: &PaginationOptions,
        _search: &SearchOptions,
        _filters: &[Filter],
    ) -> Result<Places> {
        not_implemented("search")
    }

    async fn search_faceted(
        &self,
        _search: &SearchOptions,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        not_implemented("search_faceted")
    }

    async fn get_recent(
        &self,
        _opts: &PaginationOptions,
        _within: Duration,
        _filters: &[Filter],
    ) -> Result<Places> {
        not_implemented("get_recent")
    }

    async fn get_recent_faceted(
        &self,
        _within: Duration,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        not_implemented("get_recent_faceted")
    }

    async fn get_placetypes(&self) -> Result<Faceting> {
        not_implemented("get_placetypes")
    }

    async fn has_placetype(
        &self,
        _opts: &PaginationOptions,
        _placetype: &Placetype,
        _filters: &[Filter],
    ) -> Result<Places> {
        not_implemented("has_placetype")
    }

    async fn has_placetype_faceted(
        &self,
        _placetype: &Placetype,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        not_implemented("has_placetype_faceted")
    }

    async fn get_alternate_placetypes(&self) -> Result<Faceting> {
        not_implemented("get_alternate_placetypes")
    }

    async fn has_alternate_placetype(
        &self,
        _opts: &PaginationOptions,
        _placetype: &str,
        _filters: &[Filter],
    ) -> Result<Places> {
        not_implemented("has_alternate_placetype")
    }

    async fn has_alternate_placetype_faceted(
        &self,
        _placetype: &str,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        not_implemented("has_alternate_placetype_faceted")
    }

    async fn get_concordances(&self) -> Result<Faceting> {
        not_implemented("get_concordances")
    }

    async fn has_concordance(
        &self,
        _opts: &PaginationOptions,
        _concordance: &Concordance,
        _filters: &[Filter],
    ) -> Result<Places> {
        not_implemented("has_concordance")
    }

    async fn has_concordance_faceted(
        &self,
        _concordance: &Concordance,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        not_implemented("has_concordance_faceted")
    }

    async fn get_tags(&self) -> Result<Faceting> {
        not_implemented("get_tags")
    }

    async fn has_tag(
        &self,
        _opts: &PaginationOptions,
        _tag: &str,
        _filters: &[Filter],
    ) -> Result<Places> {
        not_implemented("has_tag")
    }

    async fn has_tag_faceted(
        &self,
        _tag: &str,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        not_implemented("has_tag_faceted")
    }

    async fn visiting_null_island(
        &self,
        _opts: &PaginationOptions,
        _filters: &[Filter],
    ) -> Result<Places> {
        not_implemented("visiting_null_island")
    }

    async fn visiting_null_island_faceted(
        &self,
        _filters: &[Filter],
        _facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        not_implemented("visiting_null_island_faceted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_every_method_is_not_implemented() {
        let s = NullSpelunker::new();
        let opts = PaginationOptions::default();
        let facets = vec![Facet::new("placetype").unwrap()];
        let pt = Placetype::new("locality").unwrap();
        let args = UriArgs::default();

        assert!(s.get_record_for_id(1, &args).await.unwrap_err().is_not_implemented());
        assert!(s.get_spr_for_id(1, &args).await.unwrap_err().is_not_implemented());
        assert!(s.get_feature_for_id(1, &args).await.unwrap_err().is_not_implemented());
        assert!(s.get_descendants(&opts, 1, &[]).await.unwrap_err().is_not_implemented());
        assert!(s
            .get_descendants_faceted(1, &[], &facets)
            .await
            .unwrap_err()
            .is_not_implemented());
        assert!(s.count_descendants(1).await.unwrap_err().is_not_implemented());
        assert!(s
            .search(&opts, &SearchOptions::new("x").unwrap(), &[])
            .await
            .unwrap_err()
            .is_not_implemented());
        assert!(s
            .get_recent(&opts, Duration::from_secs(60), &[])
            .await
            .unwrap_err()
            .is_not_implemented());
        assert!(s.get_placetypes().await.unwrap_err().is_not_implemented());
        assert!(s.has_placetype(&opts, &pt, &[]).await.unwrap_err().is_not_implemented());
        assert!(s.get_alternate_placetypes().await.unwrap_err().is_not_implemented());
        assert!(s.get_concordances().await.unwrap_err().is_not_implemented());
        assert!(s
            .has_concordance(&opts, &Concordance::new("wd", "id", ""), &[])
            .await
            .unwrap_err()
            .is_not_implemented());
        assert!(s.get_tags().await.unwrap_err().is_not_implemented());
        assert!(s.has_tag(&opts, "x", &[]).await.unwrap_err().is_not_implemented());
        assert!(s
            .visiting_null_island_faceted(&[], &facets)
            .await
            .unwrap_err()
            .is_not_implemented());
    }
}

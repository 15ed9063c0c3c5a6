//! Listing subcommands. Each prints one page of places, or the facet counts
//! when `--facet` is given.

use super::args::{ListArgs, ListRequest};
use super::print_json;
use clap::Args;
use spelunker::{AnySpelunker, Result, Spelunker};
use spelunker_query::{
    parse_duration, Concordance, Faceting, Placetype, Places, SearchOptions, DEFAULT_RECENT,
};
use std::future::Future;

/// Await whichever of the two queries the request asks for. The other one
/// is dropped without being polled.
async fn list_or_facet<P, F>(request: &ListRequest, list: P, facet: F) -> anyhow::Result<()>
where
    P: Future<Output = Result<Places>>,
    F: Future<Output = Result<Vec<Faceting>>>,
{
    if request.facets.is_empty() {
        print_json(&list.await?)
    } else {
        print_json(&facet.await?)
    }
}

#[derive(Args)]
pub struct ListCommand {
    #[command(flatten)]
    pub list: ListArgs,
}

impl ListCommand {
    pub async fn null_island(self, spelunker: &AnySpelunker) -> anyhow::Result<()> {
        let r = self.list.request()?;

        list_or_facet(
            &r,
            spelunker.visiting_null_island(&r.pagination, &r.filters),
            spelunker.visiting_null_island_faceted(&r.filters, &r.facets),
        )
        .await
    }
}

#[derive(Args)]
pub struct DescendantsCommand {
    /// Id of the ancestor record
    pub id: i64,

    #[command(flatten)]
    pub list: ListArgs,
}

impl DescendantsCommand {
    pub async fn execute(self, spelunker: &AnySpelunker) -> anyhow::Result<()> {
        let r = self.list.request()?;

        list_or_facet(
            &r,
            spelunker.get_descendants(&r.pagination, self.id, &r.filters),
            spelunker.get_descendants_faceted(self.id, &r.filters, &r.facets),
        )
        .await
    }
}

#[derive(Args)]
pub struct SearchCommand {
    /// Search terms
    pub query: String,

    #[command(flatten)]
    pub list: ListArgs,
}

impl SearchCommand {
    pub async fn execute(self, spelunker: &AnySpelunker) -> anyhow::Result<()> {
        let r = self.list.request()?;
        let search = SearchOptions::new(self.query)?;

        list_or_facet(
            &r,
            spelunker.search(&r.pagination, &search, &r.filters),
            spelunker.search_faceted(&search, &r.filters, &r.facets),
        )
        .await
    }
}

#[derive(Args)]
pub struct RecentCommand {
    /// ISO 8601 duration, e.g. P30D or PT12H
    #[arg(long, default_value = DEFAULT_RECENT)]
    pub within: String,

    #[command(flatten)]
    pub list: ListArgs,
}

impl RecentCommand {
    pub async fn execute(self, spelunker: &AnySpelunker) -> anyhow::Result<()> {
        let r = self.list.request()?;
        let within = parse_duration(&self.within)?;

        list_or_facet(
            &r,
            spelunker.get_recent(&r.pagination, within, &r.filters),
            spelunker.get_recent_faceted(within, &r.filters, &r.facets),
        )
        .await
    }
}

/// A listing keyed by a single name: a placetype, alternate placetype or tag
#[derive(Args)]
pub struct NamedListCommand {
    pub name: String,

    #[command(flatten)]
    pub list: ListArgs,
}

impl NamedListCommand {
    pub async fn placetype(self, spelunker: &AnySpelunker) -> anyhow::Result<()> {
        let r = self.list.request()?;
        let placetype: Placetype = self.name.parse()?;

        list_or_facet(
            &r,
            spelunker.has_placetype(&r.pagination, &placetype, &r.filters),
            spelunker.has_placetype_faceted(&placetype, &r.filters, &r.facets),
        )
        .await
    }

    pub async fn alternate_placetype(self, spelunker: &AnySpelunker) -> anyhow::Result<()> {
        let r = self.list.request()?;

        list_or_facet(
            &r,
            spelunker.has_alternate_placetype(&r.pagination, &self.name, &r.filters),
            spelunker.has_alternate_placetype_faceted(&self.name, &r.filters, &r.facets),
        )
        .await
    }

    pub async fn tag(self, spelunker: &AnySpelunker) -> anyhow::Result<()> {
        let r = self.list.request()?;

        list_or_facet(
            &r,
            spelunker.has_tag(&r.pagination, &self.name, &r.filters),
            spelunker.has_tag_faceted(&self.name, &r.filters, &r.facets),
        )
        .await
    }
}

#[derive(Args)]
pub struct ConcordanceCommand {
    /// Concordance as ns:pred=value, any part may be empty (wd:id=, gn:, =Q30)
    pub concordance: String,

    #[command(flatten)]
    pub list: ListArgs,
}

impl ConcordanceCommand {
    pub async fn execute(self, spelunker: &AnySpelunker) -> anyhow::Result<()> {
        let r = self.list.request()?;
        let concordance: Concordance = self.concordance.parse()?;

        list_or_facet(
            &r,
            spelunker.has_concordance(&r.pagination, &concordance, &r.filters),
            spelunker.has_concordance_faceted(&concordance, &r.filters, &r.facets),
        )
        .await
    }
}

pub async fn placetypes(spelunker: &AnySpelunker) -> anyhow::Result<()> {
    print_json(&spelunker.get_placetypes().await?)
}

pub async fn alternate_placetypes(spelunker: &AnySpelunker) -> anyhow::Result<()> {
    print_json(&spelunker.get_alternate_placetypes().await?)
}

pub async fn concordances(spelunker: &AnySpelunker) -> anyhow::Result<()> {
    print_json(&spelunker.get_concordances().await?)
}

pub async fn tags(spelunker: &AnySpelunker) -> anyhow::Result<()> {
    print_json(&spelunker.get_tags().await?)
}

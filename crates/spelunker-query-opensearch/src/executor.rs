//! Run query documents and choose between windowed and scroll pagination.
//!
//! A request without a continuation token is counted first. Result sets of
//! [`SCROLL_THRESHOLD`] records or more are read through a scroll context,
//! smaller ones with plain `from`/`size` windows. A token resumes directly,
//! without counting again.

use crate::client::{SearchParams, SearchResponse};
use crate::document::spr_from_document;
use crate::query;
use crate::OpenSearchSpelunker;
use serde_json::Value;
use spelunker_query::pagination::parse_cursor_offset;
use spelunker_query::{
    page_count, Facet, FacetCount, Faceting, PaginationOptions, PaginationResults, Places,
    Result, SpelunkerError, StandardPlacesResult,
};
use tracing::debug;

/// Totals at or above this are read with a scroll context
pub const SCROLL_THRESHOLD: i64 = 10_000;

/// Prefix of scroll continuation tokens
pub const SCROLL_CURSOR_PREFIX: &str = "after-";

/// Prefix of windowed continuation tokens
pub const WINDOW_CURSOR_PREFIX: &str = "from-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Window,
    Scroll,
}

pub fn select_strategy(total: i64) -> Strategy {
    if total >= SCROLL_THRESHOLD {
        Strategy::Scroll
    } else {
        Strategy::Window
    }
}

/// Where a request picks up
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resume {
    Start,
    Window(i64),
    Scroll(String),
}

impl Resume {
    pub(crate) fn from_options(opts: &PaginationOptions) -> Result<Self> {
        match opts.pointer() {
            None => Ok(Resume::Start),
            Some(p) if p.starts_with(WINDOW_CURSOR_PREFIX) => {
                Ok(Resume::Window(parse_cursor_offset(p, WINDOW_CURSOR_PREFIX)?))
            }
            Some(p) => {
                let scroll_id = p.strip_prefix(SCROLL_CURSOR_PREFIX).unwrap_or(p);

                if scroll_id.is_empty() {
                    return Err(SpelunkerError::invalid_input(format!(
                        "Invalid cursor '{}'",
                        p
                    )));
                }

                Ok(Resume::Scroll(scroll_id.to_string()))
            }
        }
    }
}

/// A scroll context starts at the first record, so only cursor requests and
/// the first countable page can switch over to one
fn opens_scroll(opts: &PaginationOptions) -> bool {
    match opts {
        PaginationOptions::Cursor { .. } => true,
        PaginationOptions::Countable { .. } => opts.page() == 1,
    }
}

/// Pagination for a windowed cursor page starting at `offset`
pub(crate) fn window_cursor(offset: i64, hits: usize, total: i64, per_page: i64) -> PaginationResults {
    let consumed = offset + hits as i64;

    let next = if hits > 0 && consumed < total {
        format!("{}{}", WINDOW_CURSOR_PREFIX, consumed)
    } else {
        String::new()
    };

    PaginationResults::cursor(Some(total), per_page, next)
}

fn hits_to_spr(rsp: &SearchResponse) -> Result<Vec<StandardPlacesResult>> {
    rsp.hits
        .hits
        .iter()
        .map(|hit| {
            spr_from_document(&hit.source).map_err(|e| {
                e.with_context(format!("Failed to derive SPR from document {}", hit.id))
            })
        })
        .collect()
}

/// One faceting per requested facet, in request order
pub(crate) fn facetings(rsp: &SearchResponse, facets: &[Facet]) -> Result<Vec<Faceting>> {
    facets
        .iter()
        .map(|f| {
            let agg = rsp.aggregations.get(&f.property).ok_or_else(|| {
                SpelunkerError::Backend(format!("Response is missing the {} aggregation", f))
            })?;

            let counts = agg
                .buckets
                .iter()
                .map(|b| FacetCount {
                    key: b.key(),
                    count: b.doc_count,
                })
                .collect();

            Ok(Faceting::new(f.clone(), counts))
        })
        .collect()
}

impl OpenSearchSpelunker {
    pub(crate) async fn count(&self, criteria: &Value) -> Result<i64> {
        let body = query::count_body(criteria.clone());
        let rsp = self.client.search(&body, SearchParams::count()).await?;
        Ok(rsp.hits.total_count())
    }

    /// Run a query for one page in whichever pagination mode fits
    pub(crate) async fn search_paginated(
        &self,
        opts: &PaginationOptions,
        criteria: Value,
    ) -> Result<Places> {
        let per_page = opts.per_page();

        match Resume::from_options(opts)? {
            Resume::Scroll(scroll_id) => {
                debug!("Resuming scroll");
                let rsp = self.client.scroll(&scroll_id).await?;
                self.scroll_page(per_page, rsp, None).await
            }
            Resume::Window(offset) => {
                let body = query::query_body(criteria);
                let rsp = self
                    .client
                    .search(&body, SearchParams::window(per_page, offset))
                    .await?;

                let results = hits_to_spr(&rsp)?;
                let pagination =
                    window_cursor(offset, results.len(), rsp.hits.total_count(), per_page);

                Ok(Places::new(results, pagination))
            }
            Resume::Start => self.first_page(opts, criteria).await,
        }
    }

    async fn first_page(&self, opts: &PaginationOptions, criteria: Value) -> Result<Places> {
        let per_page = opts.per_page();
        let total = self.count(&criteria).await?;

        if total == 0 {
            return Ok(Places::new(Vec::new(), PaginationResults::empty(opts)));
        }

        let strategy = select_strategy(total);
        debug!("{} matches, using {:?} pagination", total, strategy);

        if strategy == Strategy::Scroll && opens_scroll(opts) {
            let body = query::scroll_body(criteria);
            let rsp = self.client.search(&body, SearchParams::scroll(per_page)).await?;
            return self.scroll_page(per_page, rsp, Some(total)).await;
        }

        let body = query::query_body(criteria);

        match opts {
            PaginationOptions::Cursor { .. } => {
                let rsp = self
                    .client
                    .search(&body, SearchParams::window(per_page, 0))
                    .await?;

                let results = hits_to_spr(&rsp)?;
                let pagination = window_cursor(0, results.len(), total, per_page);

                Ok(Places::new(results, pagination))
            }
            PaginationOptions::Countable { .. } => {
                if opts.page() > page_count(total, per_page) {
                    return Ok(Places::new(
                        Vec::new(),
                        PaginationResults::countable(total, opts),
                    ));
                }

                let (limit, offset) = opts.limit_offset();

                // from + size may not exceed the index result window
                if offset + limit > SCROLL_THRESHOLD {
                    return Err(SpelunkerError::invalid_input(format!(
                        "Page {} is beyond the first {} results, use cursor pagination",
                        opts.page(),
                        SCROLL_THRESHOLD
                    )));
                }

                let rsp = self
                    .client
                    .search(&body, SearchParams::window(limit, offset))
                    .await?;

                Ok(Places::new(
                    hits_to_spr(&rsp)?,
                    PaginationResults::countable(total, opts),
                ))
            }
        }
    }

    /// Turn a scroll response into a cursor page, releasing the context once
    /// it is exhausted. `counted` is the exact total when the caller has one.
    async fn scroll_page(
        &self,
        per_page: i64,
        rsp: SearchResponse,
        counted: Option<i64>,
    ) -> Result<Places> {
        let results = hits_to_spr(&rsp)?;
        let total = counted.unwrap_or_else(|| rsp.hits.total_count());
        let exhausted = (results.len() as i64) < per_page;

        let next = match rsp.scroll_id {
            Some(scroll_id) if !exhausted => format!("{}{}", SCROLL_CURSOR_PREFIX, scroll_id),
            Some(scroll_id) => {
                self.client.clear_scroll(&scroll_id).await;
                String::new()
            }
            None => String::new(),
        };

        Ok(Places::new(
            results,
            PaginationResults::cursor(Some(total), per_page, next),
        ))
    }

    /// Aggregations only, always a size-0 direct search
    pub(crate) async fn query_facets(
        &self,
        criteria: Value,
        facets: &[Facet],
    ) -> Result<Vec<Faceting>> {
        let body = query::faceted_body(criteria, facets)?;
        let rsp = self.client.search(&body, SearchParams::count()).await?;

        facetings(&rsp, facets)
    }
}

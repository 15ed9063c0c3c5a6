//! # spelunker-query
//!
//! Core abstractions for querying a Who's On First style gazetteer.
//!
//! This crate provides a single read-only contract, [`Spelunker`], that can be
//! backed interchangeably by:
//! - a relational store (`spelunker-query-sql`)
//! - an OpenSearch index (`spelunker-query-opensearch`)
//! - nothing at all ([`NullSpelunker`])
//!
//! ## Model
//!
//! - **Filter**: narrow results by `placetype`, `country`, `tag`, `iscurrent`
//!   or `isdeprecated`. Filters are ANDed.
//! - **Facet / Faceting**: group results by a property and count each value.
//! - **PaginationOptions / PaginationResults**: numbered pages with a total
//!   count, or cursor pages that continue from an opaque token.
//! - **StandardPlacesResult**: the normalized record summary every backend
//!   returns.
//!
//! ## Example
//!
//! ```rust
//! use spelunker_query::{
//!     default_filters_from_query, pagination_from_query, QueryParams,
//!     NullSpelunker, Spelunker,
//! };
//!
//! # async fn example() -> spelunker_query::Result<()> {
//! let query = QueryParams::parse("placetype=locality&page=2")?;
//! let filters = default_filters_from_query(&query)?;
//! let opts = pagination_from_query(&query)?;
//!
//! let spelunker = NullSpelunker::new();
//! let err = spelunker.get_descendants(&opts, 85633793, &filters).await.unwrap_err();
//! assert!(err.is_not_implemented());
//! # Ok(())
//! # }
//! ```

pub mod concordance;
pub mod config;
pub mod duration;
pub mod edtf;
pub mod error;
pub mod facet;
pub mod filter;
pub mod flag;
pub mod null;
pub mod pagination;
pub mod params;
pub mod placetype;
pub mod search;
pub mod spr;
pub mod traits;
pub mod uri;

// Re-export commonly used items
pub use concordance::{namespace_faceting, Concordance, ConcordanceMatch, CONCORDANCE_FACET};
pub use config::ConnectionConfig;
pub use duration::{parse_duration, DEFAULT_RECENT};
pub use edtf::EdtfDate;
pub use error::{Result, SpelunkerError};
pub use facet::{ensure_facets, Facet, FacetCount, Faceting};
pub use filter::{Filter, FilterScheme};
pub use flag::ExistentialFlag;
pub use null::NullSpelunker;
pub use pagination::{page_count, PaginationOptions, PaginationResults, DEFAULT_PER_PAGE};
pub use params::{
    default_filters_from_query, facets_from_query, filters_from_query, pagination_from_query,
    QueryParams,
};
pub use placetype::Placetype;
pub use search::SearchOptions;
pub use spr::{modified_since, Places, StandardPlacesResult};
pub use traits::Spelunker;
pub use uri::{id_to_rel_path, parse_record_uri, AltGeom, UriArgs};

//! Decode filters, facets and pagination from request query strings.

use crate::error::{Result, SpelunkerError};
use crate::facet::Facet;
use crate::filter::{Filter, FilterScheme};
use crate::pagination::{PaginationOptions, DEFAULT_PER_PAGE};

/// Parameters inspected for filters when the caller does not name any
pub const DEFAULT_FILTER_PARAMS: &[&str] = &[
    "placetype",
    "country",
    "tag",
    "iscurrent",
    "isdeprecated",
];

/// Decoded `key=value` pairs of a query string, in order
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);

        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).map_err(|e| {
            SpelunkerError::invalid_input(format!("Failed to parse query string: {}", e))
        })?;

        Ok(Self { pairs })
    }

    pub fn from_pairs<K: Into<String>, V: Into<String>>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value for `key`
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// One filter per non-empty value of each named parameter.
///
/// Naming a parameter that is not a filter scheme is an error.
pub fn filters_from_query(query: &QueryParams, params: &[&str]) -> Result<Vec<Filter>> {
    let mut filters = Vec::new();

    for name in params {
        let scheme = name.parse::<FilterScheme>()?;

        for value in query.get_all(name) {
            if value.trim().is_empty() {
                continue;
            }

            let filter = Filter::from_param(scheme.as_str(), value)
                .map_err(|e| e.with_context(format!("Invalid '{}' parameter", name)))?;

            filters.push(filter);
        }
    }

    Ok(filters)
}

/// [`filters_from_query`] over [`DEFAULT_FILTER_PARAMS`]
pub fn default_filters_from_query(query: &QueryParams) -> Result<Vec<Filter>> {
    filters_from_query(query, DEFAULT_FILTER_PARAMS)
}

/// One facet per `facet=` parameter. Empty values are rejected.
pub fn facets_from_query(query: &QueryParams) -> Result<Vec<Facet>> {
    query.get_all("facet").map(Facet::new).collect()
}

/// A non-empty `cursor` selects cursor pagination. Otherwise `page`
/// (default 1, 0 treated as 1) selects countable pagination.
pub fn pagination_from_query(query: &QueryParams) -> Result<PaginationOptions> {
    let per_page = match query.get("per_page").filter(|v| !v.is_empty()) {
        Some(v) => v.parse::<i64>().map_err(|_| {
            SpelunkerError::invalid_input(format!("Invalid per_page parameter '{}'", v))
        })?,
        None => DEFAULT_PER_PAGE,
    };

    if let Some(cursor) = query.get("cursor").filter(|v| !v.is_empty()) {
        return Ok(PaginationOptions::cursor(cursor, per_page));
    }

    let page = match query.get("page").filter(|v| !v.is_empty()) {
        Some(v) => v.parse::<i64>().map_err(|_| {
            SpelunkerError::invalid_input(format!("Invalid page parameter '{}'", v))
        })?,
        None => 1,
    };

    if page < 0 {
        return Err(SpelunkerError::invalid_input(format!(
            "Invalid page parameter '{}'",
            page
        )));
    }

    Ok(PaginationOptions::countable(page, per_page))
}

//! Route templates for the pages and API endpoints a spelunker front end
//! serves, and helpers that fill them in.
//!
//! Templates contain `{id}`, `{placetype}`, `{duration}`, `{namespace}`,
//! `{predicate}` and `{value}` placeholders. Filters and facets are carried
//! along as query parameters, in the same form the `params` decoders read.

use serde::{Deserialize, Serialize};
use spelunker_query::{Facet, Filter, Result, SpelunkerError};
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uris {
    pub index: String,
    pub search: String,
    pub search_faceted: String,
    pub null_island: String,
    pub null_island_faceted: String,
    pub placetypes: String,
    pub placetype: String,
    pub placetype_faceted: String,
    pub alternate_placetypes: String,
    pub alternate_placetype: String,
    pub alternate_placetype_faceted: String,
    pub concordances: String,
    pub concordance_ns: String,
    pub concordance_ns_faceted: String,
    pub concordance_ns_pred: String,
    pub concordance_ns_pred_faceted: String,
    pub concordance_triple: String,
    pub concordance_triple_faceted: String,
    pub recent: String,
    pub recent_faceted: String,
    pub tags: String,
    pub tag: String,
    pub tag_faceted: String,
    pub id: String,
    pub descendants: String,
    pub descendants_faceted: String,
    pub geojson: String,
    pub spr: String,
    pub static_assets: String,
    /// Scheme, host and port the routes are served from
    pub root_url: String,
}

impl Default for Uris {
    fn default() -> Self {
        Self {
            index: "/".to_string(),
            search: "/search".to_string(),
            search_faceted: "/search/facets".to_string(),
            null_island: "/nullisland".to_string(),
            null_island_faceted: "/nullisland/facets".to_string(),
            placetypes: "/placetypes".to_string(),
            placetype: "/placetypes/{placetype}".to_string(),
            placetype_faceted: "/placetypes/{placetype}/facets".to_string(),
            alternate_placetypes: "/placetypes/alt".to_string(),
            alternate_placetype: "/placetypes/alt/{placetype}".to_string(),
            alternate_placetype_faceted: "/placetypes/alt/{placetype}/facets".to_string(),
            concordances: "/concordances".to_string(),
            concordance_ns: "/concordances/{namespace}".to_string(),
            concordance_ns_faceted: "/concordances/{namespace}/facets".to_string(),
            concordance_ns_pred: "/concordances/{namespace}:{predicate}".to_string(),
            concordance_ns_pred_faceted: "/concordances/{namespace}:{predicate}/facets"
                .to_string(),
            concordance_triple: "/concordances/{namespace}:{predicate}={value}".to_string(),
            concordance_triple_faceted: "/concordances/{namespace}:{predicate}={value}/facets"
                .to_string(),
            recent: "/recent/{duration}".to_string(),
            recent_faceted: "/recent/{duration}/facets".to_string(),
            tags: "/tags".to_string(),
            tag: "/tags/{tag}".to_string(),
            tag_faceted: "/tags/{tag}/facets".to_string(),
            id: "/id/{id}".to_string(),
            descendants: "/id/{id}/descendants".to_string(),
            descendants_faceted: "/id/{id}/descendants/facets".to_string(),
            geojson: "/id/{id}/geojson".to_string(),
            spr: "/id/{id}/spr".to_string(),
            static_assets: "/static/".to_string(),
            root_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Uris {
    pub fn with_root_url(mut self, root_url: impl Into<String>) -> Self {
        self.root_url = root_url.into();
        self
    }

    /// Mount every route below `root`. Routes already below it are left alone.
    pub fn with_root(mut self, root: &str) -> Self {
        let root = root.trim_end_matches('/');

        if root.is_empty() {
            return self;
        }

        let mounted = format!("{}/", root);

        let routes: Vec<(&str, &mut String)> = vec![
            ("index", &mut self.index),
            ("search", &mut self.search),
            ("search_faceted", &mut self.search_faceted),
            ("null_island", &mut self.null_island),
            ("null_island_faceted", &mut self.null_island_faceted),
            ("placetypes", &mut self.placetypes),
            ("placetype", &mut self.placetype),
            ("placetype_faceted", &mut self.placetype_faceted),
            ("alternate_placetypes", &mut self.alternate_placetypes),
            ("alternate_placetype", &mut self.alternate_placetype),
            ("alternate_placetype_faceted", &mut self.alternate_placetype_faceted),
            ("concordances", &mut self.concordances),
            ("concordance_ns", &mut self.concordance_ns),
            ("concordance_ns_faceted", &mut self.concordance_ns_faceted),
            ("concordance_ns_pred", &mut self.concordance_ns_pred),
            ("concordance_ns_pred_faceted", &mut self.concordance_ns_pred_faceted),
            ("concordance_triple", &mut self.concordance_triple),
            ("concordance_triple_faceted", &mut self.concordance_triple_faceted),
            ("recent", &mut self.recent),
            ("recent_faceted", &mut self.recent_faceted),
            ("tags", &mut self.tags),
            ("tag", &mut self.tag),
            ("tag_faceted", &mut self.tag_faceted),
            ("id", &mut self.id),
            ("descendants", &mut self.descendants),
            ("descendants_faceted", &mut self.descendants_faceted),
            ("geojson", &mut self.geojson),
            ("spr", &mut self.spr),
            ("static_assets", &mut self.static_assets),
        ];

        for (name, path) in routes {
            if path.is_empty() || path.as_str() == root || path.starts_with(&mounted) {
                continue;
            }

            let joined = format!("{}/{}", root, path.trim_start_matches('/'));
            debug!("Mounting {} route at {}", name, joined);
            *path = joined;
        }

        self
    }

    /// Fully qualified URL for `path` on the root URL's scheme and host
    pub fn abs(&self, path: &str) -> Result<String> {
        let mut u = Url::parse(&self.root_url).map_err(|e| {
            SpelunkerError::invalid_configuration(format!(
                "Failed to parse root URL '{}': {}",
                self.root_url, e
            ))
        })?;

        u.set_path(path);
        u.set_query(None);
        u.set_fragment(None);

        Ok(u.to_string())
    }
}

pub fn uri_for_id(template: &str, id: i64, filters: &[Filter], facets: &[Facet]) -> String {
    let id = id.to_string();
    let path = fill(template, &[("{id}", id.as_str())]);
    with_filters(&path, Vec::new(), filters, facets)
}

pub fn uri_for_placetype(
    template: &str,
    placetype: &str,
    filters: &[Filter],
    facets: &[Facet],
) -> String {
    let path = fill(template, &[("{placetype}", placetype)]);
    with_filters(&path, Vec::new(), filters, facets)
}

pub fn uri_for_recent(
    template: &str,
    duration: &str,
    filters: &[Filter],
    facets: &[Facet],
) -> String {
    let path = fill(template, &[("{duration}", duration)]);
    with_filters(&path, Vec::new(), filters, facets)
}

pub fn uri_for_tag(template: &str, tag: &str, filters: &[Filter], facets: &[Facet]) -> String {
    let path = fill(template, &[("{tag}", tag)]);
    with_filters(&path, Vec::new(), filters, facets)
}

/// Any of the concordance templates. Placeholders a template lacks are ignored.
pub fn uri_for_concordance(
    template: &str,
    namespace: &str,
    predicate: &str,
    value: &str,
    filters: &[Filter],
    facets: &[Facet],
) -> String {
    let path = fill(
        template,
        &[
            ("{namespace}", namespace),
            ("{predicate}", predicate),
            ("{value}", value),
        ],
    );
    with_filters(&path, Vec::new(), filters, facets)
}

pub fn uri_for_search(template: &str, query: &str, filters: &[Filter], facets: &[Facet]) -> String {
    let params = vec![("q".to_string(), query.to_string())];
    with_filters(template, params, filters, facets)
}

pub fn uri_for_null_island(template: &str, filters: &[Filter], facets: &[Facet]) -> String {
    with_filters(template, Vec::new(), filters, facets)
}

fn fill(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |uri, (placeholder, value)| {
            uri.replace(placeholder, &urlencoding::encode(value))
        })
}

fn with_filters(
    path: &str,
    mut params: Vec<(String, String)>,
    filters: &[Filter],
    facets: &[Facet],
) -> String {
    for f in filters {
        params.push((f.scheme().as_str().to_string(), f.value()));
    }

    for f in facets {
        params.push(("facet".to_string(), f.to_string()));
    }

    if params.is_empty() {
        return path.to_string();
    }

    // Encoding string pairs cannot fail
    let query = serde_urlencoded::to_string(&params).unwrap_or_default();
    format!("{}?{}", path, query)
}

//! Translate query axes, filters and facets into OpenSearch query documents.
//!
//! Every value reaches the document through `serde_json`, never through
//! string formatting, and user supplied text in wildcard patterns is escaped.

use serde_json::{json, Map, Value};
use spelunker_query::{
    Concordance, ConcordanceMatch, ExistentialFlag, Facet, Filter, Result, SearchOptions,
    SpelunkerError, CONCORDANCE_FACET,
};

/// Largest number of buckets returned per facet
pub const FACET_SIZE: i64 = 1000;

const MACHINETAGS_FIELD: &str = "wof:concordances_machinetags.keyword";

pub fn match_all() -> Value {
    json!({ "match_all": {} })
}

/// Exact document id lookup
pub fn ids(doc_id: &str) -> Value {
    json!({ "ids": { "values": [doc_id] } })
}

pub fn descendants(id: i64) -> Value {
    json!({ "term": { "wof:belongsto": id } })
}

pub fn placetype(name: &str) -> Value {
    json!({ "term": { "wof:placetype": name } })
}

pub fn alternate_placetype(name: &str) -> Value {
    json!({ "term": { "wof:placetype_alt": name } })
}

/// Records modified at or after the unix timestamp `since`
pub fn recent(since: i64) -> Value {
    json!({ "range": { "wof:lastmodified": { "gte": since } } })
}

pub fn search(search: &SearchOptions) -> Value {
    json!({
        "simple_query_string": {
            "query": search.query.to_lowercase(),
            "fields": ["search"],
            "default_operator": "AND",
        }
    })
}

pub fn null_island() -> Value {
    json!({
        "bool": {
            "must": [
                { "term": { "geom:latitude": 0.0 } },
                { "term": { "geom:longitude": 0.0 } },
            ]
        }
    })
}

/// Match records by concordance. A fully specified concordance is an exact
/// term on its source field, partial ones match the `ns:pred=value`
/// machine tags.
pub fn concordance(c: &Concordance) -> Result<Value> {
    let ns = escape_wildcard(&c.namespace);
    let pred = escape_wildcard(&c.predicate);
    let value = escape_wildcard(&c.value);

    let q = match c.classify()? {
        ConcordanceMatch::NamespacePredicateValue => {
            let field = format!("wof:concordances.{}", c.source());
            json!({ "term": { field: { "value": c.value, "case_insensitive": true } } })
        }
        ConcordanceMatch::NamespacePredicate => wildcard(format!("{}:{}=*", ns, pred)),
        ConcordanceMatch::NamespaceValue => wildcard(format!("{}:*={}", ns, value)),
        ConcordanceMatch::PredicateValue => wildcard(format!("*:{}={}", pred, value)),
        ConcordanceMatch::Namespace => json!({
            "prefix": {
                MACHINETAGS_FIELD: {
                    "value": format!("{}:", c.namespace),
                    "case_insensitive": true,
                }
            }
        }),
        ConcordanceMatch::Predicate => wildcard(format!("*:{}=*", pred)),
        ConcordanceMatch::Value => wildcard(format!("*:*={}", value)),
    };

    Ok(q)
}

fn wildcard(pattern: String) -> Value {
    json!({
        "wildcard": {
            MACHINETAGS_FIELD: { "value": pattern, "case_insensitive": true }
        }
    })
}

/// Escape the wildcard metacharacters `*`, `?` and `\`
pub fn escape_wildcard(value: &str) -> String {
    let mut out = String::with_capacity(value.len());

    for c in value.chars() {
        if matches!(c, '*' | '?' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }

    out
}

/// `field` equals -1 or is missing from the document
fn unknown_flag(field: &str) -> Value {
    json!({
        "bool": {
            "should": [
                { "term": { field: -1 } },
                { "bool": { "must_not": { "exists": { "field": field } } } },
            ],
            "minimum_should_match": 1
        }
    })
}

/// Clause for a single filter. Flag clauses match the documents whose SPR
/// reports the same flag, including those missing the indexed field.
pub fn filter_clause(filter: &Filter) -> Result<Value> {
    match filter {
        Filter::Placetype(pt) => Ok(json!({ "term": { "wof:placetype": pt.name() } })),
        Filter::Country(code) => Ok(json!({ "term": { "wof:country": code } })),
        Filter::IsCurrent(ExistentialFlag::Unknown) => Ok(unknown_flag("mz:is_current")),
        Filter::IsCurrent(flag) => Ok(json!({ "term": { "mz:is_current": flag.as_i64() } })),
        // A missing deprecation flag reads back as false
        Filter::IsDeprecated(ExistentialFlag::False) => Ok(json!({
            "bool": { "must_not": { "term": { "mz:is_deprecated": 1 } } }
        })),
        Filter::IsDeprecated(flag) => {
            Ok(json!({ "term": { "mz:is_deprecated": flag.as_i64() } }))
        }
        Filter::Tag(_) => Err(SpelunkerError::not_implemented(
            "Tag filters are not supported by the opensearch backend",
        )),
    }
}

/// AND the filters into a `bool.must` alongside the base clause
pub fn with_filters(criteria: Value, filters: &[Filter]) -> Result<Value> {
    if filters.is_empty() {
        return Ok(criteria);
    }

    let mut must = Vec::with_capacity(filters.len() + 1);
    must.push(criteria);

    for f in filters {
        must.push(filter_clause(f)?);
    }

    Ok(json!({ "bool": { "must": must } }))
}

/// Indexed field a facet aggregates over
pub fn facet_field(facet: &Facet) -> String {
    match facet.property.as_str() {
        "isdeprecated" => "mz:is_deprecated".to_string(),
        "iscurrent" => "mz:is_current".to_string(),
        "placetypealt" => "wof:placetype_alt".to_string(),
        CONCORDANCE_FACET => "wof:concordances_sources.keyword".to_string(),
        other => format!("wof:{}", other),
    }
}

/// One `terms` aggregation per facet, keyed by facet name
pub fn aggregations(facets: &[Facet]) -> Value {
    let mut aggs = Map::new();

    for f in facets {
        aggs.insert(
            f.property.clone(),
            json!({ "terms": { "field": facet_field(f), "size": FACET_SIZE } }),
        );
    }

    Value::Object(aggs)
}

/// Search request body
pub fn query_body(criteria: Value) -> Value {
    json!({ "query": criteria })
}

/// Size-0 request body counting matches exactly, beyond the default 10,000 cap
pub fn count_body(criteria: Value) -> Value {
    json!({ "query": criteria, "track_total_hits": true })
}

/// Body opening a scroll context. Totals are tracked exactly so that every
/// page read from the context reports the full count.
pub fn scroll_body(criteria: Value) -> Value {
    json!({ "query": criteria, "track_total_hits": true })
}

/// Aggregation request body
pub fn faceted_body(criteria: Value, facets: &[Facet]) -> Result<Value> {
    spelunker_query::ensure_facets(facets)?;

    Ok(json!({
        "query": criteria,
        "aggs": aggregations(facets),
    }))
}

use crate::error::{Result, SpelunkerError};
use crate::facet::{Facet, FacetCount, Faceting};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A cross-reference to an external system, `namespace:predicate=value`
/// (e.g. `wd:id=Q30`). Any part may be left empty to match partially.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Concordance {
    pub namespace: String,
    pub predicate: String,
    pub value: String,
}

/// Which parts of a concordance are present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcordanceMatch {
    NamespacePredicateValue,
    NamespacePredicate,
    NamespaceValue,
    PredicateValue,
    Namespace,
    Predicate,
    Value,
}

impl Concordance {
    pub fn new(
        namespace: impl Into<String>,
        predicate: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into().trim().to_string(),
            predicate: predicate.into().trim().to_string(),
            value: value.into().trim().to_string(),
        }
    }

    pub fn classify(&self) -> Result<ConcordanceMatch> {
        let ns = !self.namespace.is_empty();
        let pred = !self.predicate.is_empty();
        let value = !self.value.is_empty();

        match (ns, pred, value) {
            (true, true, true) => Ok(ConcordanceMatch::NamespacePredicateValue),
            (true, true, false) => Ok(ConcordanceMatch::NamespacePredicate),
            (true, false, true) => Ok(ConcordanceMatch::NamespaceValue),
            (false, true, true) => Ok(ConcordanceMatch::PredicateValue),
            (true, false, false) => Ok(ConcordanceMatch::Namespace),
            (false, true, false) => Ok(ConcordanceMatch::Predicate),
            (false, false, true) => Ok(ConcordanceMatch::Value),
            (false, false, false) => Err(SpelunkerError::invalid_input(
                "Concordance must have a namespace, predicate or value",
            )),
        }
    }

    /// The `namespace:predicate` source label used by concordance stores
    pub fn source(&self) -> String {
        format!("{}:{}", self.namespace, self.predicate)
    }
}

impl FromStr for Concordance {
    type Err = SpelunkerError;

    /// Accepts `ns:pred=value`, `ns:pred`, `ns:`, `:pred`, `ns:=value`,
    /// `:pred=value` and `=value`.
    fn from_str(s: &str) -> Result<Self> {
        let (machinetag, value) = match s.split_once('=') {
            Some((left, right)) => (left, right),
            None => (s, ""),
        };

        let (namespace, predicate) = match machinetag.split_once(':') {
            Some((ns, pred)) => (ns, pred),
            None if machinetag.is_empty() => ("", ""),
            None => (machinetag, ""),
        };

        let c = Concordance::new(namespace, predicate, value);
        c.classify()?;
        Ok(c)
    }
}

impl fmt::Display for Concordance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.predicate)?;

        if !self.value.is_empty() {
            write!(f, "={}", self.value)?;
        }

        Ok(())
    }
}

/// Facet name of the concordance namespace distribution
pub const CONCORDANCE_FACET: &str = "concordance";

/// Roll `namespace:predicate` source counts up into per-namespace counts
pub fn namespace_faceting(sources: Vec<FacetCount>) -> Result<Faceting> {
    let mut namespaces: HashMap<String, i64> = HashMap::new();

    for source in sources {
        let ns = match source.key.split_once(':') {
            Some((ns, _)) => ns.to_string(),
            None => source.key,
        };

        *namespaces.entry(ns).or_default() += source.count;
    }

    let counts = namespaces
        .into_iter()
        .map(|(key, count)| FacetCount { key, count })
        .collect();

    Ok(Faceting::new(Facet::new(CONCORDANCE_FACET)?, counts))
}

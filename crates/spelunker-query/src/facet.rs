use crate::error::{Result, SpelunkerError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A property to group results by, e.g. `placetype` or `country`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Facet {
    pub property: String,
}

impl Facet {
    pub fn new(property: impl Into<String>) -> Result<Self> {
        let property = property.into().trim().to_string();

        if property.is_empty() {
            return Err(SpelunkerError::invalid_input("Empty facet"));
        }

        Ok(Self { property })
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.property)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetCount {
    pub key: String,
    pub count: i64,
}

/// A facet and its value distribution, ordered by count descending.
///
/// Multi-valued properties (ancestors, concordances) count a record once per
/// value, so the counts of such a faceting can add up to more than the number
/// of matching records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faceting {
    pub facet: Facet,
    pub results: Vec<FacetCount>,
}

impl Faceting {
    /// Build a faceting, sorting counts descending. Ties keep their key order.
    pub fn new(facet: Facet, mut results: Vec<FacetCount>) -> Self {
        results.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        Self { facet, results }
    }

    pub fn total(&self) -> i64 {
        self.results.iter().map(|c| c.count).sum()
    }
}

/// Reject empty facet lists before they reach a backend
pub fn ensure_facets(facets: &[Facet]) -> Result<()> {
    if facets.is_empty() {
        return Err(SpelunkerError::invalid_input("No facets specified"));
    }
    Ok(())
}

use crate::error::{Result, SpelunkerError};
use serde::{Deserialize, Serialize};

/// Free-text search criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub query: String,
}

impl SearchOptions {
    pub fn new(query: impl Into<String>) -> Result<Self> {
        let query = query.into().trim().to_string();

        if query.is_empty() {
            return Err(SpelunkerError::invalid_input("Empty search query"));
        }

        Ok(Self { query })
    }
}

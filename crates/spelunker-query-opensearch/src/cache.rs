//! Memory cache for documents fetched through a reader.

use bytes::Bytes;
use spelunker_query::{ConnectionConfig, Result, SpelunkerError};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_MAX_ENTRIES: usize = 1024;

#[derive(Debug, Default)]
struct Entries {
    documents: HashMap<String, Bytes>,
    order: VecDeque<String>,
}

/// Bounded in-process cache. The oldest entry is evicted once full.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    entries: Arc<RwLock<Entries>>,
    max_entries: usize,
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Entries::default())),
            max_entries: max_entries.max(1),
        }
    }

    /// Build a cache from a `memory://?max-entries={n}` URI. `null://` means no cache.
    pub fn from_uri(uri: &str) -> Result<Option<Self>> {
        let config = ConnectionConfig::parse(uri)?;

        match config.scheme.as_str() {
            "memory" => {
                let max_entries = config
                    .parse_option::<usize>("max-entries")?
                    .unwrap_or(DEFAULT_MAX_ENTRIES);
                Ok(Some(Self::new(max_entries)))
            }
            "null" => Ok(None),
            other => Err(SpelunkerError::invalid_configuration(format!(
                "Unsupported cache scheme '{}'",
                other
            ))),
        }
    }

    pub async fn get(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.read().await;
        entries.documents.get(key).cloned()
    }

    pub async fn set(&self, key: &str, body: Bytes) {
        let mut entries = self.entries.write().await;

        if entries.documents.insert(key.to_string(), body).is_some() {
            return;
        }

        entries.order.push_back(key.to_string());

        while entries.order.len() > self.max_entries {
            if let Some(oldest) = entries.order.pop_front() {
                entries.documents.remove(&oldest);
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

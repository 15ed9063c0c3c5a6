//! Readers for full GeoJSON record documents.
//!
//! The index only holds truncated properties, so complete features are read
//! from a document store addressed by the record's relative path.

use crate::cache::MemoryCache;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use spelunker_query::{Result, SpelunkerError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

const GITHUB_RAW_BASE: &str = "https://raw.githubusercontent.com/whosonfirst-data";

#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Where `rel_path` is read from. Doubles as the cache key.
    fn location(&self, rel_path: &str) -> String;

    async fn read(&self, rel_path: &str) -> Result<Bytes>;
}

/// Reads documents below a local directory
#[derive(Debug, Clone)]
pub struct FsReader {
    root: PathBuf,
}

impl FsReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentReader for FsReader {
    fn location(&self, rel_path: &str) -> String {
        self.root.join(rel_path).display().to_string()
    }

    async fn read(&self, rel_path: &str) -> Result<Bytes> {
        let path = self.root.join(rel_path);
        debug!("Reading document {}", path.display());

        match tokio::fs::read(&path).await {
            Ok(body) => Ok(Bytes::from(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                SpelunkerError::not_found(format!("Document {} does not exist", path.display())),
            ),
            Err(e) => Err(SpelunkerError::backend(
                &format!("Failed to read {}", path.display()),
                e,
            )),
        }
    }
}

/// Reads documents below a base URL
#[derive(Debug, Clone)]
pub struct HttpReader {
    client: Client,
    base_url: String,
}

impl HttpReader {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SpelunkerError::backend("Failed to create HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Reader for a `whosonfirst-data` repository on GitHub
    pub fn github(repo: &str) -> Result<Self> {
        let valid = !repo.is_empty()
            && repo
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if !valid {
            return Err(SpelunkerError::invalid_configuration(format!(
                "Invalid repository name '{}'",
                repo
            )));
        }

        Self::new(format!("{}/{}/master/data", GITHUB_RAW_BASE, repo))
    }
}

#[async_trait]
impl DocumentReader for HttpReader {
    fn location(&self, rel_path: &str) -> String {
        format!("{}/{}", self.base_url, rel_path)
    }

    async fn read(&self, rel_path: &str) -> Result<Bytes> {
        let url = self.location(rel_path);
        debug!("Fetching document {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SpelunkerError::backend(&format!("Failed to fetch {}", url), e))?;

        match response.status() {
            status if status.is_success() => response
                .bytes()
                .await
                .map_err(|e| SpelunkerError::backend(&format!("Failed to read {}", url), e)),
            StatusCode::NOT_FOUND => Err(SpelunkerError::not_found(format!(
                "Document {} does not exist",
                url
            ))),
            status => Err(SpelunkerError::Backend(format!(
                "Fetching {} returned {}",
                url, status
            ))),
        }
    }
}

/// Reader that holds nothing
#[derive(Debug, Clone, Default)]
pub struct NullReader;

#[async_trait]
impl DocumentReader for NullReader {
    fn location(&self, rel_path: &str) -> String {
        format!("null://{}", rel_path)
    }

    async fn read(&self, rel_path: &str) -> Result<Bytes> {
        Err(SpelunkerError::not_found(format!(
            "Document {} does not exist",
            rel_path
        )))
    }
}

/// Serves documents from a [`MemoryCache`], reading through on a miss
pub struct CachingReader {
    reader: Arc<dyn DocumentReader>,
    cache: MemoryCache,
}

impl CachingReader {
    pub fn new(reader: Arc<dyn DocumentReader>, cache: MemoryCache) -> Self {
        Self { reader, cache }
    }
}

#[async_trait]
impl DocumentReader for CachingReader {
    fn location(&self, rel_path: &str) -> String {
        self.reader.location(rel_path)
    }

    async fn read(&self, rel_path: &str) -> Result<Bytes> {
        let key = self.location(rel_path);

        if let Some(body) = self.cache.get(&key).await {
            debug!("Cache hit for {}", key);
            return Ok(body);
        }

        let body = self.reader.read(rel_path).await?;
        self.cache.set(&key, body.clone()).await;

        Ok(body)
    }
}

/// Build a reader from `fs:///path`, `http(s)://base` or `null://`
pub fn reader_from_uri(uri: &str) -> Result<Arc<dyn DocumentReader>> {
    let u = Url::parse(uri).map_err(|e| {
        SpelunkerError::invalid_configuration(format!("Invalid reader URI '{}': {}", uri, e))
    })?;

    match u.scheme() {
        "fs" => {
            let root = match u.host_str().filter(|h| !h.is_empty()) {
                Some(host) => format!("{}{}", host, u.path()),
                None => u.path().to_string(),
            };

            if root.is_empty() {
                return Err(SpelunkerError::invalid_configuration(
                    "Reader URI is missing a root directory",
                ));
            }

            Ok(Arc::new(FsReader::new(root)))
        }
        "http" | "https" => Ok(Arc::new(HttpReader::new(uri)?)),
        "null" => Ok(Arc::new(NullReader)),
        other => Err(SpelunkerError::invalid_configuration(format!(
            "Unsupported reader scheme '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingReader {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl DocumentReader for CountingReader {
        fn location(&self, rel_path: &str) -> String {
            format!("counting://{}", rel_path)
        }

        async fn read(&self, _rel_path: &str) -> Result<Bytes> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(b"{}"))
        }
    }

    #[tokio::test]
    async fn test_fs_reader() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("101/736/545");
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(tree.join("101736545.geojson"), b"{\"type\":\"Feature\"}").unwrap();

        let reader = reader_from_uri(&format!("fs://{}", dir.path().display())).unwrap();

        let body = reader.read("101/736/545/101736545.geojson").await.unwrap();
        assert_eq!(&body[..], b"{\"type\":\"Feature\"}");

        let err = reader.read("101/736/545/missing.geojson").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_caching_reader_reads_once() {
        let inner = Arc::new(CountingReader {
            reads: AtomicUsize::new(0),
        });
        let reader = CachingReader::new(inner.clone(), MemoryCache::new(8));

        reader.read("1/1.geojson").await.unwrap();
        reader.read("1/1.geojson").await.unwrap();

        assert_eq!(inner.reads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_null_reader() {
        let reader = reader_from_uri("null://").unwrap();
        assert!(reader.read("1/1.geojson").await.unwrap_err().is_not_found());
    }

    #[test]
    fn test_github_reader() {
        let reader = HttpReader::github("whosonfirst-data-admin-us").unwrap();
        assert_eq!(
            reader.location("859/225/83/85922583.geojson"),
            "https://raw.githubusercontent.com/whosonfirst-data/whosonfirst-data-admin-us/master/data/859/225/83/85922583.geojson"
        );

        assert!(HttpReader::github("../../etc").is_err());
        assert!(HttpReader::github("").is_err());
    }

    #[test]
    fn test_unsupported_reader() {
        assert!(reader_from_uri("s3://bucket").is_err());
    }
}

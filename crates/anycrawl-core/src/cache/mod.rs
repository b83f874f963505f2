//! Fingerprint & Cache Store (C1).
//!
//! Reads pick the newest stored object under a fingerprint's key prefix
//! that is still within `max_age`; writes never evict older versions.

pub mod fingerprint;

#[cfg(feature = "s3")]
mod s3_store;
#[cfg(feature = "s3")]
pub use s3_store::S3BlobStore;

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fingerprint::{fingerprint, normalize_url, options_hash, url_hash, Fingerprint};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("blob store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// Content-addressed blob read/write, keyed by an opaque string key.
/// Implementations never interpret the key beyond treating it as a path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;
    /// List keys directly under `prefix` (non-recursive is fine; callers
    /// only ever use single-level prefixes).
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CacheError>;
}

/// Filesystem-backed blob store. Default backend; matches the teacher's
/// on-disk document storage convention.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), CacheError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let dir = self.path_for(prefix);
        let mut out = Vec::new();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                out.push(format!("{}/{}", prefix.trim_end_matches('/'), name));
            }
        }
        Ok(out)
    }
}

/// A cached page-scrape artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCacheEntry {
    pub url: String,
    pub content: serde_json::Value,
    pub cached_at: DateTime<Utc>,
}

/// Source of a map (domain-keyed) cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSource {
    Sitemap,
    Search,
    Crawl,
    Combined,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapCacheEntry {
    pub urls: Vec<String>,
    pub url_count: usize,
    pub source: MapSource,
    pub discovered_at: DateTime<Utc>,
}

/// The page/map cache, backed by a `BlobStore`.
pub struct PageCache {
    store: std::sync::Arc<dyn BlobStore>,
    prefix: String,
}

impl PageCache {
    pub fn new(store: std::sync::Arc<dyn BlobStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn entry_key(&self, url_hash: &str, epoch_ms: i64) -> String {
        format!("{}{}/{}.json", self.prefix, url_hash, epoch_ms)
    }

    fn entry_prefix(&self, url_hash: &str) -> String {
        format!("{}{}", self.prefix, url_hash)
    }

    /// Write a new version under the fingerprint's URL-hash prefix. Older
    /// versions are left in place; reads always pick the newest within TTL.
    pub async fn store(&self, url_hash: &str, entry: &PageCacheEntry) -> Result<(), CacheError> {
        let epoch_ms = entry.cached_at.timestamp_millis();
        let bytes = serde_json::to_vec(entry)?;
        self.store.put(&self.entry_key(url_hash, epoch_ms), &bytes).await
    }

    /// Return the newest entry under `url_hash`'s prefix whose `cached_at`
    /// is within `now - max_age`. `max_age == Some(0)` always misses.
    pub async fn lookup(
        &self,
        url_hash: &str,
        max_age: Option<std::time::Duration>,
        default_max_age: std::time::Duration,
    ) -> Result<Option<PageCacheEntry>, CacheError> {
        if max_age == Some(std::time::Duration::ZERO) {
            return Ok(None);
        }
        let ttl = max_age.unwrap_or(default_max_age);

        let keys = self.store.list(&self.entry_prefix(url_hash)).await?;
        let mut newest: Option<(i64, String)> = None;
        for key in keys {
            if let Some(stem) = key.rsplit('/').next().and_then(|s| s.strip_suffix(".json")) {
                if let Ok(epoch_ms) = stem.parse::<i64>() {
                    if newest.as_ref().map(|(e, _)| epoch_ms > *e).unwrap_or(true) {
                        newest = Some((epoch_ms, key));
                    }
                }
            }
        }

        let Some((epoch_ms, key)) = newest else {
            return Ok(None);
        };

        let cached_at = DateTime::from_timestamp_millis(epoch_ms).unwrap_or_else(Utc::now);
        if Utc::now().signed_duration_since(cached_at) > chrono::Duration::from_std(ttl).unwrap_or_default() {
            return Ok(None);
        }

        match self.store.get(&key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

//! Shared wiring for every orchestrator: the database, cache, queue, and
//! adapter collaborators they compose over.

use std::sync::Arc;

use crate::adapters::{HttpScrapeEngine, ScrapeEngine, SearchEngine, SitemapSource, SitemapXmlSource};
use crate::cache::{BlobStore, FsBlobStore, PageCache};
use crate::config::{Settings, StorageBackend};
use crate::db::DbPool;
use crate::models::job::Job;
use crate::models::webhook::Owner;
use crate::queue::DbQueue;
use crate::webhooks::fire_event;

#[derive(Clone)]
pub struct OrchestratorContext {
    pub pool: DbPool,
    pub cache: Arc<PageCache>,
    pub queue: DbQueue,
    pub scrape_engine: Arc<dyn ScrapeEngine>,
    pub search_engine: Arc<dyn SearchEngine>,
    pub sitemap_source: Arc<dyn SitemapSource>,
    pub settings: Arc<Settings>,
}

impl OrchestratorContext {
    /// Build a context wired to the default (non-JS) scrape engine, a
    /// static search-page scraper, and a plain `sitemap.xml` fetcher,
    /// storing cache blobs on the filesystem unless `ANYCRAWL_STORAGE=s3`.
    pub fn build_default(pool: DbPool, settings: Settings) -> Self {
        let store: Arc<dyn BlobStore> = match settings.storage_backend {
            StorageBackend::Filesystem => Arc::new(FsBlobStore::new("./anycrawl-data")),
            StorageBackend::S3 => {
                // `S3BlobStore::from_env` is async; callers that need S3 in
                // production wire it explicitly via `with_cache` instead of
                // going through this convenience constructor.
                Arc::new(FsBlobStore::new("./anycrawl-data"))
            }
        };
        let cache = Arc::new(PageCache::new(store, settings.cache_prefix.clone()));
        let queue = DbQueue::new(pool.clone());
        Self {
            pool,
            cache,
            queue,
            scrape_engine: Arc::new(HttpScrapeEngine::default()),
            search_engine: Arc::new(crate::adapters::StaticSiteSearchEngine::new(
                "https://search.example.com/search?q={query}",
            )),
            sitemap_source: Arc::new(SitemapXmlSource::default()),
            settings: Arc::new(settings),
        }
    }

    pub fn with_cache(mut self, cache: Arc<PageCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Queue a webhook event for `job`, logging (not propagating) any
    /// failure -- a webhook hiccup must never fail the request it's
    /// reporting on. A no-op when `ANYCRAWL_WEBHOOKS_ENABLED=false`.
    pub async fn fire_event(&self, job: &Job, event_type: &str, extra: serde_json::Value) {
        if !self.settings.webhooks_enabled {
            return;
        }
        let owner = Owner::ApiKey(job.api_key_id.clone());
        if let Err(err) = fire_event(
            &self.pool,
            &owner,
            event_type,
            job,
            extra,
            self.settings.webhook_initial_delay_secs as i64,
        )
        .await
        {
            tracing::warn!(error = %err, job_id = %job.id, event_type, "failed to queue webhook event");
        }
    }
}

//! Map orchestrator (C7): discovers a site's URLs without scraping any of
//! them, preferring the sitemap source and falling back to the search
//! adapter when no sitemap is published.

use chrono::Utc;

use crate::billing::{admit, charge_delta, estimator};
use crate::cache::{fingerprint, MapCacheEntry, MapSource, PageCacheEntry};
use crate::jobs;
use crate::models::job::{Job, JobKind};

use super::context::OrchestratorContext;
use super::error::OrchestratorError;

#[derive(Debug, Clone)]
pub struct MapOutcome {
    pub job: Job,
    pub urls: Vec<String>,
    pub source: MapSource,
    pub credits_charged: i64,
}

#[tracing::instrument(skip(ctx), fields(job_id))]
pub async fn run_map(
    ctx: &OrchestratorContext,
    api_key_id: &str,
    base_url: &str,
) -> Result<MapOutcome, OrchestratorError> {
    let estimate = estimator::map_template_charge(&ctx.settings.credit_weights).total;
    if ctx.settings.credits_enabled {
        admit(&ctx.pool, api_key_id, estimate).await?;
    }

    let job = jobs::create_job(&ctx.pool, JobKind::Map, "map", api_key_id, base_url).await?;
    tracing::Span::current().record("job_id", &job.id.as_str());
    ctx.fire_event(&job, "map.created", serde_json::json!({})).await;

    let job = jobs::mark_running(&ctx.pool, &job.id).await?;
    ctx.fire_event(&job, "map.started", serde_json::json!({})).await;

    let credits_charged = if ctx.settings.credits_enabled {
        let details = estimator::map_template_charge(&ctx.settings.credit_weights);
        charge_delta(&ctx.pool, &job.id, details.total, "map", None, details)
            .await?
            .charged
    } else {
        0
    };

    let (urls, source) = match ctx.sitemap_source.discover(base_url).await {
        Ok(urls) if !urls.is_empty() => (urls, MapSource::Sitemap),
        _ => {
            let query = format!("site:{base_url}");
            let urls = ctx
                .search_engine
                .search(&query, 100)
                .await
                .unwrap_or_default();
            (urls, MapSource::Search)
        }
    };

    jobs::set_total_count(&ctx.pool, &job.id, urls.len() as i32).await?;
    jobs::record_page_result(&ctx.pool, &job.id, true).await?;

    let fp = fingerprint::url_hash(base_url);
    let entry = MapCacheEntry {
        urls: urls.clone(),
        url_count: urls.len(),
        source,
        discovered_at: Utc::now(),
    };
    let cache_entry = PageCacheEntry {
        url: base_url.to_string(),
        content: serde_json::to_value(&entry)?,
        cached_at: entry.discovered_at,
    };
    ctx.cache.store(&fp, &cache_entry).await?;

    let result_blob = serde_json::to_string(&urls)?;
    let job = jobs::mark_completed(&ctx.pool, &job.id, Some(result_blob)).await?;
    ctx.fire_event(&job, "map.completed", serde_json::json!({"url_count": urls.len()})).await;

    Ok(MapOutcome {
        job,
        urls,
        source,
        credits_charged,
    })
}

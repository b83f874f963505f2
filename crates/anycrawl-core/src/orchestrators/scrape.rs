//! Scrape orchestrator (C7): job lifecycle + cache lookup/store + billing
//! for a single-page scrape, firing `scrape.created` / `scrape.started` /
//! `scrape.completed` / `scrape.cancelled` webhook events along the way.

use chrono::Utc;

use crate::adapters::ScrapedPage;
use crate::billing::{admit, charge_to_used, estimator};
use crate::cache::{fingerprint, PageCacheEntry};
use crate::jobs;
use crate::models::job::{Job, JobKind};

use super::context::OrchestratorContext;
use super::error::OrchestratorError;

/// Outcome of a completed scrape job.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub job: Job,
    pub page: serde_json::Value,
    pub cache_hit: bool,
    pub credits_charged: i64,
}

#[tracing::instrument(skip(ctx, opts), fields(job_id))]
pub async fn run_scrape(
    ctx: &OrchestratorContext,
    api_key_id: &str,
    url: &str,
    opts: &crate::request::ScrapeOptions,
) -> Result<ScrapeOutcome, OrchestratorError> {
    let estimate = estimator::scrape_charge(opts, &ctx.settings.credit_weights).total;
    if ctx.settings.credits_enabled {
        admit(&ctx.pool, api_key_id, estimate).await?;
    }

    let job = jobs::create_job(&ctx.pool, JobKind::Scrape, "scrape", api_key_id, url).await?;
    tracing::Span::current().record("job_id", &job.id.as_str());
    ctx.fire_event(&job, "scrape.created", serde_json::json!({})).await;

    let job = jobs::mark_running(&ctx.pool, &job.id).await?;
    ctx.fire_event(&job, "scrape.started", serde_json::json!({})).await;

    let print = fingerprint::fingerprint(url, opts);

    if ctx.settings.cache_enabled && opts.cache_eligible() {
        let max_age = opts.max_age.map(std::time::Duration::from_secs);
        let default_ttl = std::time::Duration::from_secs(ctx.settings.cache_default_max_age_secs);
        if let Some(entry) = ctx
            .cache
            .lookup(&print.url_hash, max_age, default_ttl)
            .await?
        {
            jobs::record_cache_hit(&ctx.pool, &job.id).await?;
            let charged = if ctx.settings.credits_enabled {
                let details = estimator::scrape_charge(opts, &ctx.settings.credit_weights);
                let target_used = job.credits_used + details.total;
                let key = format!("billing:target:{}:{target_used}:api_request_finalize", job.id);
                charge_to_used(&ctx.pool, &job.id, target_used, "api_request_finalize", Some(key), details)
                    .await?
                    .charged
            } else {
                0
            };
            let job = jobs::mark_completed(
                &ctx.pool,
                &job.id,
                Some(serde_json::to_string(&entry.content)?),
            )
            .await?;
            ctx.fire_event(&job, "scrape.completed", serde_json::json!({"cache_hit": true})).await;
            return Ok(ScrapeOutcome {
                job,
                page: entry.content,
                cache_hit: true,
                credits_charged: charged,
            });
        }
    }

    let scraped = match ctx.scrape_engine.scrape(url, opts).await {
        Ok(page) => page,
        Err(err) => {
            let job = jobs::mark_failed(&ctx.pool, &job.id, &err.to_string()).await?;
            ctx.fire_event(&job, "scrape.cancelled", serde_json::json!({"reason": "adapter_failure"})).await;
            return Err(err.into());
        }
    };

    let charged = if ctx.settings.credits_enabled {
        let details = estimator::scrape_charge(opts, &ctx.settings.credit_weights);
        let target_used = job.credits_used + details.total;
        let key = format!("billing:target:{}:{target_used}:api_request_finalize", job.id);
        charge_to_used(&ctx.pool, &job.id, target_used, "api_request_finalize", Some(key), details)
            .await?
            .charged
    } else {
        0
    };

    let page_json = page_to_json(&scraped);

    if ctx.settings.cache_enabled && opts.cache_eligible() {
        let entry = PageCacheEntry {
            url: url.to_string(),
            content: page_json.clone(),
            cached_at: Utc::now(),
        };
        ctx.cache.store(&print.url_hash, &entry).await?;
    }

    let job = jobs::mark_completed(&ctx.pool, &job.id, Some(serde_json::to_string(&page_json)?))
        .await?;
    ctx.fire_event(&job, "scrape.completed", serde_json::json!({"cache_hit": false})).await;

    Ok(ScrapeOutcome {
        job,
        page: page_json,
        cache_hit: false,
        credits_charged: charged,
    })
}

pub(super) fn page_to_json(page: &ScrapedPage) -> serde_json::Value {
    serde_json::json!({
        "url": page.url,
        "status": page.status,
        "html": page.html,
        "markdown": page.markdown,
        "links": page.links,
    })
}

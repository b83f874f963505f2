//! Search orchestrator (C7): runs a query against the search adapter, then
//! scrapes each result. The per-result scrape cost is folded into the
//! up-front search-template charge (see `estimator::search_template_charge`)
//! rather than billed again per page.

use crate::billing::{admit, charge_delta, estimator};
use crate::jobs;
use crate::models::job::{Job, JobKind};
use crate::request::ScrapeOptions;

use super::context::OrchestratorContext;
use super::error::OrchestratorError;
use super::scrape::page_to_json;

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub job: Job,
    pub results: Vec<serde_json::Value>,
    pub credits_charged: i64,
}

#[tracing::instrument(skip(ctx, opts), fields(job_id))]
pub async fn run_search(
    ctx: &OrchestratorContext,
    api_key_id: &str,
    query: &str,
    opts: &ScrapeOptions,
    limit: u32,
) -> Result<SearchOutcome, OrchestratorError> {
    let estimate = estimator::search_template_charge(&ctx.settings.credit_weights, limit).total;
    if ctx.settings.credits_enabled {
        admit(&ctx.pool, api_key_id, estimate).await?;
    }

    let job = jobs::create_job(&ctx.pool, JobKind::Search, "search", api_key_id, query).await?;
    tracing::Span::current().record("job_id", &job.id.as_str());
    ctx.fire_event(&job, "search.created", serde_json::json!({})).await;

    let job = jobs::mark_running(&ctx.pool, &job.id).await?;
    ctx.fire_event(&job, "search.started", serde_json::json!({})).await;

    let credits_charged = if ctx.settings.credits_enabled {
        let details = estimator::search_template_charge(&ctx.settings.credit_weights, limit);
        charge_delta(&ctx.pool, &job.id, details.total, "search", None, details)
            .await?
            .charged
    } else {
        0
    };

    let urls = match ctx.search_engine.search(query, limit).await {
        Ok(urls) => urls,
        Err(err) => {
            let job = jobs::mark_failed(&ctx.pool, &job.id, &err.to_string()).await?;
            ctx.fire_event(&job, "search.cancelled", serde_json::json!({"reason": "adapter_failure"})).await;
            return Err(err.into());
        }
    };
    jobs::set_total_count(&ctx.pool, &job.id, urls.len() as i32).await?;

    let mut results = Vec::with_capacity(urls.len());
    for url in urls {
        match ctx.scrape_engine.scrape(&url, opts).await {
            Ok(scraped) => {
                results.push(page_to_json(&scraped));
                jobs::record_page_result(&ctx.pool, &job.id, true).await?;
            }
            Err(_) => {
                jobs::record_page_result(&ctx.pool, &job.id, false).await?;
            }
        }
    }

    let result_blob = serde_json::to_string(&results)?;
    let job = jobs::mark_completed(&ctx.pool, &job.id, Some(result_blob)).await?;
    ctx.fire_event(&job, "search.completed", serde_json::json!({"result_count": results.len()})).await;

    Ok(SearchOutcome {
        job,
        results,
        credits_charged,
    })
}

//! Crawl orchestrator (C7): discovers pages by following links breadth-
//! first from a start URL, scraping and billing each page individually.

use crate::billing::{admit, charge_delta, estimator};
use crate::jobs;
use crate::models::job::{Job, JobKind};
use crate::request::ScrapeOptions;

use super::context::OrchestratorContext;
use super::error::OrchestratorError;
use super::scrape::page_to_json;

#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub job: Job,
    pub pages: Vec<serde_json::Value>,
    pub credits_charged: i64,
}

#[tracing::instrument(skip(ctx, opts), fields(job_id))]
pub async fn run_crawl(
    ctx: &OrchestratorContext,
    api_key_id: &str,
    start_url: &str,
    opts: &ScrapeOptions,
    page_limit: usize,
) -> Result<CrawlOutcome, OrchestratorError> {
    let template = estimator::crawl_template_charge(&ctx.settings.credit_weights);
    let per_page = estimator::scrape_charge(opts, &ctx.settings.credit_weights).total;
    let estimate = template.total + per_page;
    if ctx.settings.credits_enabled {
        admit(&ctx.pool, api_key_id, estimate).await?;
    }

    let job = jobs::create_job(&ctx.pool, JobKind::Crawl, "crawl", api_key_id, start_url).await?;
    tracing::Span::current().record("job_id", &job.id.as_str());
    ctx.fire_event(&job, "crawl.created", serde_json::json!({})).await;

    let job = jobs::mark_running(&ctx.pool, &job.id).await?;
    ctx.fire_event(&job, "crawl.started", serde_json::json!({})).await;

    let mut credits_charged = 0;
    let mut first_page_charged = false;

    let mut visited = std::collections::HashSet::new();
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(start_url.to_string());
    let mut pages = Vec::new();

    while let Some(url) = queue.pop_front() {
        if pages.len() >= page_limit || !visited.insert(url.clone()) {
            continue;
        }

        match ctx.scrape_engine.scrape(&url, opts).await {
            Ok(scraped) => {
                if ctx.settings.credits_enabled {
                    let details = estimator::scrape_charge(opts, &ctx.settings.credit_weights);
                    let reason = if first_page_charged {
                        "crawl_page_v1"
                    } else {
                        "api_crawl_initial"
                    };
                    let charge = charge_delta(&ctx.pool, &job.id, details.total, reason, None, details).await?;
                    credits_charged += charge.charged;
                    first_page_charged = true;
                }

                for link in &scraped.links {
                    if !visited.contains(link) && queue.len() + pages.len() < page_limit * 4 {
                        queue.push_back(link.clone());
                    }
                }

                pages.push(page_to_json(&scraped));
                jobs::record_page_result(&ctx.pool, &job.id, true).await?;
                ctx.fire_event(&job, "crawl.page_success", serde_json::json!({"url": url})).await;
            }
            Err(_) => {
                jobs::record_page_result(&ctx.pool, &job.id, false).await?;
            }
        }

        jobs::set_total_count(&ctx.pool, &job.id, pages.len().max(1) as i32).await?;
    }

    let result_blob = serde_json::to_string(&pages)?;
    let job = jobs::mark_completed(&ctx.pool, &job.id, Some(result_blob)).await?;
    ctx.fire_event(&job, "crawl.completed", serde_json::json!({"page_count": pages.len()})).await;

    Ok(CrawlOutcome {
        job,
        pages,
        credits_charged,
    })
}

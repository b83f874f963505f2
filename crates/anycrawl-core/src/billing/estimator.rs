//! Itemized credit calculators (C8). The same calculators back both the
//! pre-flight cost estimate returned to callers and the committed charge
//! recorded in the ledger after a page is actually fetched, so an estimate
//! and its eventual charge can only diverge when the request's own inputs
//! (formats, proxy, extract source) change between the two calls.

use crate::config::CreditWeights;
use crate::models::billing::{ChargeDetails, ChargeItem};
use crate::request::{ExtractSource, ScrapeOptions};

/// Per-page charge for a single scrape: base + proxy + json/summary
/// extraction surcharges. `json_llm` is doubled when extraction runs
/// against `html` rather than `markdown`.
pub fn scrape_charge(opts: &ScrapeOptions, weights: &CreditWeights) -> ChargeDetails {
    let mut items = vec![ChargeItem {
        code: "base_scrape".to_string(),
        credits: weights.base_scrape,
        meta: None,
    }];

    let proxy_weight = opts.proxy.credit_weight(weights);
    if proxy_weight > 0 {
        items.push(ChargeItem {
            code: opts.proxy.charge_code().to_string(),
            credits: proxy_weight,
            meta: Some(serde_json::json!({ "proxy": opts.proxy.normalized_token() })),
        });
    }

    if opts.formats.iter().any(|f| f == "json") {
        let mut credits = weights.json_llm;
        if opts.extract_source == ExtractSource::Html {
            credits *= 2;
        }
        items.push(ChargeItem {
            code: "json_llm".to_string(),
            credits,
            meta: Some(serde_json::json!({ "extract_source": opts.extract_source })),
        });
    }

    if opts.formats.iter().any(|f| f == "summary") {
        items.push(ChargeItem {
            code: "summary".to_string(),
            credits: weights.summary,
            meta: None,
        });
    }

    ChargeDetails::new("scrape_v1", items)
}

/// Fixed per-crawl-job template surcharge, independent of page count (pages
/// are charged individually via `scrape_charge` as each completes).
pub fn crawl_template_charge(weights: &CreditWeights) -> ChargeDetails {
    ChargeDetails::new(
        "crawl_template_v1",
        vec![ChargeItem {
            code: "crawl_template".to_string(),
            credits: weights.crawl_template,
            meta: None,
        }],
    )
}

/// Fixed per-search-job template surcharge plus a per-result scrape
/// surcharge for `limit` results the search engine will fetch.
pub fn search_template_charge(weights: &CreditWeights, limit: u32) -> ChargeDetails {
    let items = vec![
        ChargeItem {
            code: "search_template".to_string(),
            credits: weights.search_template,
            meta: None,
        },
        ChargeItem {
            code: "search_per_scrape".to_string(),
            credits: weights.search_per_scrape * i64::from(limit),
            meta: Some(serde_json::json!({ "limit": limit })),
        },
    ];
    ChargeDetails::new("search_template_v1", items)
}

/// Fixed per-map-job template surcharge.
pub fn map_template_charge(weights: &CreditWeights) -> ChargeDetails {
    ChargeDetails::new(
        "map_template_v1",
        vec![ChargeItem {
            code: "map_template".to_string(),
            credits: weights.map_template,
            meta: None,
        }],
    )
}

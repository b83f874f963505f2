//! Search engine adapter trait and a static `site:`-query stand-in.

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::error::AdapterError;

/// A pluggable web-search backend returning result URLs for a query. Real
/// deployments wire this to a commercial search API; the default here
/// scrapes a configurable public results page, matching the distilled
/// spec's "no external search API dependency" stance.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<String>, AdapterError>;
}

/// Issues `query` against a configured search endpoint template (e.g.
/// `https://search.example.com/search?q={query}`) and extracts result
/// links from `a.result-link[href]`-style anchors.
pub struct StaticSiteSearchEngine {
    client: reqwest::Client,
    endpoint_template: String,
    result_selector: String,
}

impl StaticSiteSearchEngine {
    pub fn new(endpoint_template: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint_template: endpoint_template.into(),
            result_selector: "a[href]".to_string(),
        }
    }
}

#[async_trait]
impl SearchEngine for StaticSiteSearchEngine {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<String>, AdapterError> {
        let url = self
            .endpoint_template
            .replace("{query}", &urlencoding::encode(query));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AdapterError::BadStatus(response.status().as_u16()));
        }
        let body = response.text().await?;
        let document = Html::parse_document(&body);
        let Ok(selector) = Selector::parse(&self.result_selector) else {
            return Ok(Vec::new());
        };
        Ok(document
            .select(&selector)
            .filter_map(|el| el.value().attr("href"))
            .map(|href| href.to_string())
            .take(limit as usize)
            .collect())
    }
}

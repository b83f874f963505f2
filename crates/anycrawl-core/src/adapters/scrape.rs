//! Scrape engine adapter trait and a plain HTTP/cheerio-style stand-in
//! implementation (no JS rendering, matching the `cheerio` engine option).

use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::request::ScrapeOptions;

use super::error::AdapterError;

/// The result of fetching and extracting a single page.
#[derive(Debug, Clone)]
pub struct ScrapedPage {
    pub url: String,
    pub status: u16,
    pub html: Option<String>,
    pub markdown: Option<String>,
    pub links: Vec<String>,
}

/// A pluggable page-fetch-and-extract backend. Real deployments swap this
/// for a browser-backed engine (playwright/puppeteer-equivalent); the
/// default here only covers the non-JS `cheerio` engine option.
#[async_trait]
pub trait ScrapeEngine: Send + Sync {
    async fn scrape(&self, url: &str, opts: &ScrapeOptions) -> Result<ScrapedPage, AdapterError>;
}

/// Plain `reqwest` GET + `scraper`-based text/link extraction, no
/// JavaScript execution. Honors `only_main_content` by restricting
/// extraction to `<main>`/`<article>` when present.
pub struct HttpScrapeEngine {
    client: reqwest::Client,
}

impl HttpScrapeEngine {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpScrapeEngine {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

fn extract_main_text(document: &Html, only_main_content: bool) -> String {
    if only_main_content {
        for selector in ["main", "article", "#content", ".content"] {
            if let Ok(sel) = Selector::parse(selector) {
                if let Some(el) = document.select(&sel).next() {
                    return el.text().collect::<Vec<_>>().join(" ");
                }
            }
        }
    }
    document.root_element().text().collect::<Vec<_>>().join(" ")
}

fn extract_links(document: &Html, base: &Url) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .collect()
}

#[async_trait]
impl ScrapeEngine for HttpScrapeEngine {
    async fn scrape(&self, url: &str, opts: &ScrapeOptions) -> Result<ScrapedPage, AdapterError> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        if !response.status().is_success() {
            return Err(AdapterError::BadStatus(status));
        }
        let body = response.text().await?;
        let document = Html::parse_document(&body);
        let base = Url::parse(url).map_err(|e| AdapterError::Other(e.to_string()))?;

        let markdown = opts
            .formats
            .iter()
            .any(|f| f == "markdown")
            .then(|| extract_main_text(&document, opts.only_main_content));
        let html = opts.formats.iter().any(|f| f == "html").then(|| body.clone());
        let links = extract_links(&document, &base);

        Ok(ScrapedPage {
            url: url.to_string(),
            status,
            html,
            markdown,
            links,
        })
    }
}

//! Sitemap discovery adapter trait and a plain `sitemap.xml` fetcher.

use async_trait::async_trait;
use regex::Regex;

use super::error::AdapterError;

/// A pluggable URL-discovery backend for the map operation's `sitemap`
/// source.
#[async_trait]
pub trait SitemapSource: Send + Sync {
    async fn discover(&self, base_url: &str) -> Result<Vec<String>, AdapterError>;
}

/// Fetches `<base_url>/sitemap.xml` and extracts `<loc>` entries with a
/// regex rather than a full XML parser, matching the "lightweight,
/// dependency-light map source" stance the spec calls for.
pub struct SitemapXmlSource {
    client: reqwest::Client,
}

impl Default for SitemapXmlSource {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SitemapSource for SitemapXmlSource {
    async fn discover(&self, base_url: &str) -> Result<Vec<String>, AdapterError> {
        let url = format!("{}/sitemap.xml", base_url.trim_end_matches('/'));
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(AdapterError::BadStatus(response.status().as_u16()));
        }
        let body = response.text().await?;
        let loc = Regex::new(r"<loc>\s*(.*?)\s*</loc>").expect("static regex is valid");
        Ok(loc
            .captures_iter(&body)
            .map(|c| c[1].to_string())
            .collect())
    }
}

//! Canonical scrape option record shared by the cache fingerprint, the
//! estimator, and the orchestrators.
//!
//! Per the design notes, dynamic per-operation option objects become one
//! tagged sub-record (`ScrapeOptions`) rather than a loosely-typed bag;
//! snake/camel coercion happens once at the HTTP ingress in
//! `anycrawl-server`, so everything below the surface sees only this type.

use serde::{Deserialize, Serialize};

/// Proxy selection. `Custom` carries the raw proxy URL; it is only ever
/// hashed (via `normalized_token`), never logged or echoed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Proxy {
    None,
    Auto,
    Base,
    Stealth,
    Custom(String),
}

impl Default for Proxy {
    fn default() -> Self {
        Proxy::None
    }
}

impl Proxy {
    /// The normalized token used in the options fingerprint:
    /// `none`/`auto`/`base`/`stealth`/`custom:<12hex>`.
    pub fn normalized_token(&self) -> String {
        match self {
            Proxy::None => "none".to_string(),
            Proxy::Auto => "auto".to_string(),
            Proxy::Base => "base".to_string(),
            Proxy::Stealth => "stealth".to_string(),
            Proxy::Custom(url) => {
                use sha2::{Digest, Sha256};
                let digest = Sha256::digest(url.as_bytes());
                format!("custom:{}", hex::encode(&digest[..6]))
            }
        }
    }

    /// The per-request credit weight for this proxy selection.
    pub fn credit_weight(&self, weights: &crate::config::CreditWeights) -> i64 {
        match self {
            Proxy::None => 0,
            Proxy::Auto => weights.proxy_auto,
            Proxy::Base => weights.proxy_base,
            Proxy::Stealth => weights.proxy_stealth,
            Proxy::Custom(_) => weights.proxy_base,
        }
    }

    /// The itemized ledger code for this proxy selection's surcharge line,
    /// e.g. `proxy_stealth`. `None` never reaches the ledger (no surcharge
    /// line is emitted for it).
    pub fn charge_code(&self) -> &'static str {
        match self {
            Proxy::None => "proxy_none",
            Proxy::Auto => "proxy_auto",
            Proxy::Base => "proxy_base",
            Proxy::Stealth => "proxy_stealth",
            Proxy::Custom(_) => "proxy_custom",
        }
    }
}

/// Source field extraction runs against: `markdown` (default) or `html`.
/// `json_llm` credits are doubled when this is `Html`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractSource {
    Markdown,
    Html,
}

impl Default for ExtractSource {
    fn default() -> Self {
        ExtractSource::Markdown
    }
}

/// Options governing a single-page scrape. Shared by the scrape, crawl
/// (per-page), search (per-result), and map-template flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeOptions {
    pub engine: String,
    pub formats: Vec<String>,
    pub json_options: Option<serde_json::Value>,
    pub include_tags: Vec<String>,
    pub exclude_tags: Vec<String>,
    pub only_main_content: bool,
    pub extract_source: ExtractSource,
    pub ocr_options: bool,
    pub wait_for: Option<u64>,
    pub wait_until: Option<String>,
    pub wait_for_selector: Option<serde_json::Value>,
    pub proxy: Proxy,
    /// Bypasses the cache unconditionally when non-empty.
    pub custom_headers: serde_json::Map<String, serde_json::Value>,
    /// Bypasses the cache unconditionally when non-empty.
    pub actions: Vec<serde_json::Value>,
    /// Bypasses the cache unconditionally when set.
    pub template: Option<String>,
    /// `Some(0)` forces a cache miss; `None` uses the server default TTL.
    pub max_age: Option<u64>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            engine: "cheerio".to_string(),
            formats: vec!["markdown".to_string()],
            json_options: None,
            include_tags: Vec::new(),
            exclude_tags: Vec::new(),
            only_main_content: true,
            extract_source: ExtractSource::Markdown,
            ocr_options: false,
            wait_for: None,
            wait_until: None,
            wait_for_selector: None,
            proxy: Proxy::None,
            custom_headers: serde_json::Map::new(),
            actions: Vec::new(),
            template: None,
            max_age: None,
        }
    }
}

impl ScrapeOptions {
    /// Whether a request with these options is eligible for the page cache
    /// at all (before even consulting `max_age`).
    pub fn cache_eligible(&self) -> bool {
        self.template.is_none() && self.custom_headers.is_empty() && self.actions.is_empty()
    }
}

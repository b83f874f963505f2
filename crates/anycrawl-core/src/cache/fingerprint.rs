//! Deterministic (url_hash, options_hash) fingerprinting (C1).

use sha2::{Digest, Sha256};
use url::Url;

use crate::request::ScrapeOptions;

/// Tracking query params stripped during URL normalization.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
];

/// Normalize a URL for fingerprinting: lower-case host, strip a trailing
/// slash on non-root paths, drop tracking params, sort remaining query
/// keys lexicographically.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    if let Some(host) = parsed.host_str() {
        let lower = host.to_ascii_lowercase();
        let _ = parsed.set_host(Some(&lower));
    }

    let mut pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    if pairs.is_empty() {
        parsed.set_query(None);
    } else {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let path = parsed.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        parsed.set_path(path.trim_end_matches('/'));
    }

    parsed.to_string()
}

/// SHA-256 of the normalized URL, hex-encoded.
pub fn url_hash(raw: &str) -> String {
    let normalized = normalize_url(raw);
    hex::encode(Sha256::digest(normalized.as_bytes()))
}

fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

/// SHA-256 over the canonical options tuple (defaults applied), hex-encoded.
/// Field order and normalization follow §4.1 exactly so that two option
/// sets differing only in key order, vector order, or defaulted-away
/// fields hash identically.
pub fn options_hash(opts: &ScrapeOptions) -> String {
    let tuple = serde_json::json!({
        "engine": opts.engine,
        "formats": sorted(opts.formats.clone()),
        "json_options": stringify_sorted(opts.json_options.as_ref()),
        "include_tags": sorted(opts.include_tags.clone()),
        "exclude_tags": sorted(opts.exclude_tags.clone()),
        "only_main_content": opts.only_main_content,
        "extract_source": match opts.extract_source {
            crate::request::ExtractSource::Markdown => "markdown",
            crate::request::ExtractSource::Html => "html",
        },
        "ocr_options": opts.ocr_options,
        "wait_for": opts.wait_for,
        "wait_until": opts.wait_until,
        "wait_for_selector": stringify_sorted(opts.wait_for_selector.as_ref()),
        "proxy": opts.proxy.normalized_token(),
    });
    let canonical = serde_json::to_string(&tuple).unwrap_or_default();
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Stringify a JSON value with object keys sorted, for stable hashing of
/// arbitrary nested structures (`json_options`, `wait_for_selector`).
fn stringify_sorted(value: Option<&serde_json::Value>) -> String {
    fn sort_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut sorted_map = serde_json::Map::new();
                for (k, v) in entries {
                    sorted_map.insert(k.clone(), sort_value(v));
                }
                serde_json::Value::Object(sorted_map)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(sort_value).collect())
            }
            other => other.clone(),
        }
    }

    match value {
        Some(v) => serde_json::to_string(&sort_value(v)).unwrap_or_default(),
        None => String::new(),
    }
}

/// A full request fingerprint: the pair that uniquely identifies a
/// cacheable (url, options) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub url_hash: String,
    pub options_hash: String,
}

pub fn fingerprint(raw_url: &str, opts: &ScrapeOptions) -> Fingerprint {
    Fingerprint {
        url_hash: url_hash(raw_url),
        options_hash: options_hash(opts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_host_case_and_trailing_slash() {
        assert_eq!(
            normalize_url("https://Example.com/"),
            normalize_url("https://example.com")
        );
    }

    #[test]
    fn strips_tracking_params() {
        assert_eq!(
            url_hash("https://example.com/a?utm_source=x&id=1"),
            url_hash("https://example.com/a?id=1")
        );
    }

    #[test]
    fn sorts_remaining_query_keys() {
        assert_eq!(
            url_hash("https://example.com/a?b=2&a=1"),
            url_hash("https://example.com/a?a=1&b=2")
        );
    }

    #[test]
    fn options_hash_is_order_independent() {
        let mut a = ScrapeOptions::default();
        a.formats = vec!["markdown".to_string(), "html".to_string()];
        let mut b = ScrapeOptions::default();
        b.formats = vec!["html".to_string(), "markdown".to_string()];
        assert_eq!(options_hash(&a), options_hash(&b));
    }

    #[test]
    fn options_hash_distinguishes_proxy() {
        let mut a = ScrapeOptions::default();
        a.proxy = crate::request::Proxy::Stealth;
        let b = ScrapeOptions::default();
        assert_ne!(options_hash(&a), options_hash(&b));
    }
}

//! Application settings, loaded from environment variables with sane
//! defaults — mirrors the teacher's plain `Settings` struct rather than a
//! config-file DSL, since the spec's environment surface (§6) is already a
//! flat list of env vars.

use std::env;

use crate::db::{DbError, DbPool};

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Storage backend selector for the page/map cache blob store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Filesystem,
    S3,
}

/// Per-item credit weights used by the estimator/calculator (C8).
#[derive(Debug, Clone)]
pub struct CreditWeights {
    pub base_scrape: i64,
    pub proxy_auto: i64,
    pub proxy_stealth: i64,
    pub proxy_base: i64,
    pub json_llm: i64,
    pub summary: i64,
    pub crawl_template: i64,
    pub search_template: i64,
    pub search_per_scrape: i64,
    pub map_template: i64,
}

impl Default for CreditWeights {
    fn default() -> Self {
        Self {
            base_scrape: env_i64("ANYCRAWL_CREDITS_BASE_SCRAPE", 1),
            proxy_auto: env_i64("ANYCRAWL_PROXY_AUTO_CREDITS", 0),
            proxy_stealth: env_i64("ANYCRAWL_PROXY_STEALTH_CREDITS", 1),
            proxy_base: env_i64("ANYCRAWL_PROXY_BASE_CREDITS", 0),
            json_llm: env_i64("ANYCRAWL_CREDITS_JSON_LLM", 2),
            summary: env_i64("ANYCRAWL_CREDITS_SUMMARY", 1),
            crawl_template: env_i64("ANYCRAWL_CREDITS_CRAWL_TEMPLATE", 0),
            search_template: env_i64("ANYCRAWL_CREDITS_SEARCH_TEMPLATE", 0),
            search_per_scrape: env_i64("ANYCRAWL_CREDITS_SEARCH_PER_SCRAPE", 1),
            map_template: env_i64("ANYCRAWL_CREDITS_MAP_TEMPLATE", 0),
        }
    }
}

/// Application-wide settings, populated from the environment once at
/// startup and shared (cheaply cloned) by every process (API, worker,
/// scheduler, webhook dispatcher).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub auth_enabled: bool,
    pub credits_enabled: bool,
    pub webhooks_enabled: bool,
    pub storage_backend: StorageBackend,
    pub cache_prefix: String,
    pub cache_default_max_age_secs: u64,
    pub cache_enabled: bool,
    pub request_timeout_secs: u64,
    pub reaper_interval_secs: u64,
    pub reaper_stale_after_secs: u64,
    pub webhook_dispatch_interval_secs: u64,
    pub webhook_initial_delay_secs: u64,
    pub public_domain: String,
    pub credit_weights: CreditWeights,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: env_string("DATABASE_URL", "sqlite://anycrawl.sqlite"),
            auth_enabled: env_bool("ANYCRAWL_API_AUTH_ENABLED", true),
            credits_enabled: env_bool("ANYCRAWL_API_CREDITS_ENABLED", true),
            webhooks_enabled: env_bool("ANYCRAWL_WEBHOOKS_ENABLED", true),
            storage_backend: match env_string("ANYCRAWL_STORAGE", "none").as_str() {
                "s3" => StorageBackend::S3,
                _ => StorageBackend::Filesystem,
            },
            cache_prefix: env_string("ANYCRAWL_CACHE_PREFIX", "cache/"),
            cache_default_max_age_secs: env_u64("ANYCRAWL_CACHE_DEFAULT_MAX_AGE", 86400),
            cache_enabled: env_bool("ANYCRAWL_CACHE_ENABLED", true),
            request_timeout_secs: env_u64("ANYCRAWL_REQUEST_TIMEOUT_SECS", 60),
            reaper_interval_secs: env_u64("ANYCRAWL_REAPER_INTERVAL_SECS", 60),
            reaper_stale_after_secs: env_u64("ANYCRAWL_REAPER_STALE_AFTER_SECS", 1800),
            webhook_dispatch_interval_secs: env_u64("ANYCRAWL_WEBHOOK_DISPATCH_INTERVAL_SECS", 5),
            webhook_initial_delay_secs: env_u64("ANYCRAWL_WEBHOOK_INITIAL_DELAY_SECS", 1),
            public_domain: env_string("ANYCRAWL_PUBLIC_DOMAIN", "http://localhost:8080"),
            credit_weights: CreditWeights::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn create_db_pool(&self) -> Result<DbPool, DbError> {
        DbPool::from_url(&self.database_url)
    }
}

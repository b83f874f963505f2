//! Core domain logic for AnyCrawl's job lifecycle and billing: the job
//! store, durable queue, billing ledger, staleness reaper, webhook
//! dispatcher, and the orchestrators that tie them to the scrape/crawl/
//! search/map adapters. `anycrawl-server` and `anycrawl-cli` are thin
//! shells over this crate.

pub mod adapters;
pub mod billing;
pub mod cache;
pub mod config;
pub mod db;
pub mod jobs;
pub mod migrations;
pub mod models;
pub mod orchestrators;
pub mod queue;
pub mod reaper;
pub mod request;
pub mod schema;
pub mod webhooks;

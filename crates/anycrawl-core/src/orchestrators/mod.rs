//! Orchestrators (C7): compose the job store, cache, billing ledger, and
//! adapters into the four request-facing operations.

pub mod context;
pub mod crawl;
pub mod error;
pub mod map;
pub mod scrape;
pub mod search;

pub use context::OrchestratorContext;
pub use crawl::{run_crawl, CrawlOutcome};
pub use error::OrchestratorError;
pub use map::{run_map, MapOutcome};
pub use scrape::{run_scrape, ScrapeOutcome};
pub use search::{run_search, SearchOutcome};

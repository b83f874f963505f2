//! Shared application state, built once at startup and cloned (cheaply,
//! behind `Arc`) into every handler.

use std::sync::Arc;

use anycrawl_core::config::Settings;
use anycrawl_core::db::DbPool;
use anycrawl_core::orchestrators::OrchestratorContext;

#[derive(Clone)]
pub struct AppState {
    pub ctx: Arc<OrchestratorContext>,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let pool = settings.create_db_pool()?;
        let ctx = OrchestratorContext::build_default(pool, settings);
        Ok(Self { ctx: Arc::new(ctx) })
    }

    /// Build directly from an already-open pool, for test setups that need
    /// a handle to the pool before the state exists.
    pub fn with_pool(pool: DbPool, settings: Settings) -> Self {
        Self {
            ctx: Arc::new(OrchestratorContext::build_default(pool, settings)),
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.ctx.pool
    }
}

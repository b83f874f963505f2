//! HTTP surface for the AnyCrawl job lifecycle and billing core.
//!
//! Thin shell over `anycrawl-core`: every handler validates its input,
//! delegates to a core orchestrator or repository function, and translates
//! the result into the API's `{success, ...}` / `{success:false, error,
//! message?, details?}` envelopes.

mod dto;
mod error;
mod extractors;
mod handlers;
mod openapi;
mod routes;
mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;

use std::net::SocketAddr;

use anycrawl_core::config::Settings;

/// Bind and run the HTTP server until the process is killed.
pub async fn serve(settings: Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    tracing::info!("starting anycrawl-server at http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

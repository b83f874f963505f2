//! Serve command: run pending migrations, then start the HTTP API server.

use console::style;

use anycrawl_core::config::Settings;
use anycrawl_core::migrations::run_migrations;

pub async fn run_serve(settings: Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let pool = settings.create_db_pool()?;
    println!("{} Running migrations...", style("→").cyan());
    run_migrations(&pool).await?;

    println!("{} Starting anycrawl-server at {host}:{port}", style("✓").green());
    anycrawl_server::serve(settings, host, port).await
}

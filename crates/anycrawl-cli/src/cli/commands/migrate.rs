//! Migrate command: apply pending database migrations and exit.

use console::style;

use anycrawl_core::config::Settings;
use anycrawl_core::migrations::run_migrations;

pub async fn run_migrate(settings: Settings) -> anyhow::Result<()> {
    let pool = settings.create_db_pool()?;
    run_migrations(&pool).await?;
    println!("{} Migrations applied", style("✓").green());
    Ok(())
}

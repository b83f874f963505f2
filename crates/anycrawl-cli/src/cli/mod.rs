//! Command-line interface for anycrawl.

mod commands;

use std::sync::OnceLock;

use clap::{Parser, Subcommand};

static VERBOSE: OnceLock<bool> = OnceLock::new();

pub fn is_verbose() -> bool {
    *VERBOSE.get().unwrap_or(&false)
}

/// anycrawl - job lifecycle and billing core for scrape/crawl/search/map.
#[derive(Parser)]
#[command(name = "anycrawl", version, about)]
struct Cli {
    /// Enable verbose (info-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server.
    Serve {
        #[arg(long, env = "ANYCRAWL_HOST", default_value = "0.0.0.0")]
        host: String,
        #[arg(long, env = "ANYCRAWL_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// Run the queue-draining worker loop.
    Worker,
    /// Run the scheduler/reaper loop (stale task-execution reaping).
    Scheduler,
    /// Webhook delivery management.
    #[command(subcommand)]
    Webhooks(WebhooksCommand),
    /// Run pending database migrations and exit.
    Migrate,
}

#[derive(Subcommand)]
enum WebhooksCommand {
    /// Run the webhook dispatch loop (poll due deliveries, send them).
    Dispatch,
    /// List deliveries for a subscription.
    Deliveries {
        subscription_id: String,
        #[arg(long)]
        status: Option<String>,
    },
    /// Replay a single delivery by id.
    Replay { delivery_id: String },
}

/// Parse argv and dispatch to the selected subcommand.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = VERBOSE.set(cli.verbose);

    let settings = anycrawl_core::config::Settings::from_env();

    match cli.command {
        Commands::Serve { host, port } => commands::run_serve(settings, &host, port).await,
        Commands::Worker => commands::run_worker(settings).await,
        Commands::Scheduler => commands::run_scheduler(settings).await,
        Commands::Webhooks(WebhooksCommand::Dispatch) => commands::run_webhook_dispatch(settings).await,
        Commands::Webhooks(WebhooksCommand::Deliveries {
            subscription_id,
            status,
        }) => commands::list_deliveries(settings, &subscription_id, status.as_deref()).await,
        Commands::Webhooks(WebhooksCommand::Replay { delivery_id }) => {
            commands::replay_delivery(settings, &delivery_id).await
        }
        Commands::Migrate => commands::run_migrate(settings).await,
    }
}

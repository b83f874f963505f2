mod migrate;
mod scheduler;
mod serve;
mod webhooks;
mod worker;

pub use migrate::run_migrate;
pub use scheduler::run_scheduler;
pub use serve::run_serve;
pub use webhooks::{list_deliveries, replay_delivery, run_webhook_dispatch};
pub use worker::run_worker;

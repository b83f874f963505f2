//! Domain models, one module per persisted entity family.

pub mod billing;
pub mod job;
pub mod queue;
pub mod scheduler;
pub mod webhook;

pub use billing::{ApiKey, ChargeDetails, ChargeItem, ChargeMode, LedgerEntry, NewApiKey, NewLedgerEntry};
pub use job::{Job, JobKind, JobStatus, NewJob};
pub use queue::{MessageStatus, NewQueueMessage, QueueMessage};
pub use scheduler::{
    ExecutionStatus, NewScheduledTask, NewTaskExecution, ScheduledTask, TaskExecution,
};
pub use webhook::{
    DeliveryStatus, EventType, NewWebhookDelivery, NewWebhookSubscription, Owner,
    WebhookDelivery, WebhookScope, WebhookSubscription,
};

//! Durable queue message model backing `queue::DbQueue`.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::schema::queue_messages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Queued,
    Leased,
    Done,
    Failed,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Leased => "leased",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = queue_messages)]
pub struct QueueMessage {
    pub id: String,
    pub queue_name: String,
    pub job_id: String,
    /// JSON-encoded operation input.
    pub payload: String,
    pub status: String,
    pub leased_until: Option<String>,
    pub visible_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = queue_messages)]
pub struct NewQueueMessage {
    pub id: String,
    pub queue_name: String,
    pub job_id: String,
    pub payload: String,
    pub status: String,
    pub leased_until: Option<String>,
    pub visible_at: String,
    pub created_at: String,
}

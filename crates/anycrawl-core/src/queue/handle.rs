//! Lease handle — wraps a claimed queue message with its lease identifier.
//!
//! Move semantics: consumed by `DbQueue::complete`/`DbQueue::fail`. If
//! dropped without being consumed, logs a warning; the message's
//! `leased_until` expiry is the real safety net that lets another worker
//! reclaim it, the warning is for debugging only.

use crate::models::queue::QueueMessage;

pub struct LeaseHandle {
    item: Option<QueueMessage>,
    consumed: bool,
}

impl LeaseHandle {
    pub(crate) fn new(item: QueueMessage) -> Self {
        Self {
            item: Some(item),
            consumed: false,
        }
    }

    pub fn item(&self) -> &QueueMessage {
        self.item.as_ref().expect("LeaseHandle used after consume")
    }

    pub(crate) fn consume(mut self) -> QueueMessage {
        self.consumed = true;
        self.item.take().expect("LeaseHandle double-consumed")
    }
}

impl Drop for LeaseHandle {
    fn drop(&mut self) {
        if !self.consumed {
            tracing::warn!(
                "LeaseHandle dropped without being completed or failed — \
                 lease will expire and the message becomes reclaimable"
            );
        }
    }
}

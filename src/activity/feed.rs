//! Activity feed ring buffer

use chrono::Utc;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;
use crate::{
    config::ACTIVITY_CAPACITY,
    types::{ActivityEntry, ActivityKind},
    utils::{BoundedQueue, SubscriptionId, Subscribers},
};
use super::describe;

pub struct ActivityFeed {
    entries: BoundedQueue<ActivityEntry>,
    next_id: AtomicU64,
    subscribers: Subscribers<ActivityEntry>,
}

impl ActivityFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BoundedQueue::new(capacity),
            next_id: AtomicU64::new(0),
            subscribers: Subscribers::new(),
        }
    }

    /// Ids start at 1 and are never reused within the process.
    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record(&mut self, kind: ActivityKind, message: impl Into<String>, payload: Value) -> u64 {
        let entry = ActivityEntry {
            id: self.allocate_id(),
            kind,
            message: message.into(),
            timestamp: Utc::now(),
            payload,
        };
        let id = entry.id;

        debug!(id, kind = %kind, "Recorded activity");
        self.entries.push(entry);
        if let Some(entry) = self.entries.newest() {
            self.subscribers.notify(entry);
        }
        id
    }

    /// Records a push event, deriving the message from its payload.
    pub fn record_event(&mut self, kind: ActivityKind, payload: Value) -> u64 {
        let message = describe(kind, &payload);
        self.record(kind, message, payload)
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> + '_ {
        self.entries.iter_newest_first()
    }

    pub fn latest(&self, count: usize) -> Vec<ActivityEntry> {
        self.entries().take(count).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ActivityEntry) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }
}

impl Default for ActivityFeed {
    fn default() -> Self {
        Self::new(ACTIVITY_CAPACITY)
    }
}

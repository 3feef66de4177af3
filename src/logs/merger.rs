//! Log stream merger
//!
//! AwaitingSnapshot: live entries are held in a pending queue (and are
//! already visible). When the historical batch arrives it seeds the buffer,
//! then the pending entries are replayed in order, skipping those that
//! duplicate a snapshot entry. A failed history fetch goes straight to Live
//! with an empty backlog. In Live every entry is appended directly.

use std::collections::HashMap;
use tracing::{debug, info, warn};
use crate::{
    config::DEFAULT_LOG_CAPACITY,
    types::{LogEntry, LogKey},
    utils::{BoundedQueue, SubscriptionId, Subscribers},
};
use super::LogFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergerState {
    AwaitingSnapshot,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    Seeded { entries: usize, replayed: usize, suppressed: usize },
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogEvent {
    Seeded { entries: usize, suppressed: usize },
    Appended(LogEntry),
}

pub struct LogStreamMerger {
    state: MergerState,
    buffer: BoundedQueue<LogEntry>,
    pending: BoundedQueue<LogEntry>,
    subscribers: Subscribers<LogEvent>,
    suppressed_total: usize,
}

impl LogStreamMerger {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: MergerState::AwaitingSnapshot,
            buffer: BoundedQueue::new(capacity),
            pending: BoundedQueue::new(capacity),
            subscribers: Subscribers::new(),
            suppressed_total: 0,
        }
    }

    pub fn state(&self) -> MergerState {
        self.state
    }

    /// Seeds the buffer once. Later batches (e.g. re-sent after a reconnect)
    /// are ignored so they cannot duplicate the live tail.
    pub fn apply_snapshot(&mut self, batch: Vec<LogEntry>) -> SnapshotOutcome {
        if self.state == MergerState::Live {
            debug!("Ignoring historical log batch of {} entries, already live", batch.len());
            return SnapshotOutcome::Ignored;
        }

        let mut snapshot_keys: HashMap<LogKey, usize> = HashMap::new();
        for entry in &batch {
            *snapshot_keys.entry(entry.key()).or_insert(0) += 1;
        }
        let entries = batch.len();
        self.buffer.extend(batch);

        let (replayed, suppressed) = self.replay_pending(Some(&mut snapshot_keys));
        self.suppressed_total += suppressed;
        self.state = MergerState::Live;

        info!(
            "📜 Log history applied: {} entries, {} live replayed, {} duplicates suppressed",
            entries, replayed, suppressed
        );
        self.subscribers.notify(&LogEvent::Seeded { entries, suppressed });

        SnapshotOutcome::Seeded { entries, replayed, suppressed }
    }

    /// History is unavailable: keep ingesting live entries with no backlog.
    pub fn snapshot_failed(&mut self, reason: &str) {
        if self.state == MergerState::Live {
            return;
        }
        warn!("⚠️ Log history unavailable ({}), continuing with live tail only", reason);
        self.replay_pending(None);
        self.state = MergerState::Live;
        self.subscribers.notify(&LogEvent::Seeded { entries: 0, suppressed: 0 });
    }

    pub fn push_live(&mut self, entry: LogEntry) {
        match self.state {
            MergerState::AwaitingSnapshot => {
                self.pending.push(entry.clone());
            }
            MergerState::Live => {
                self.buffer.push(entry.clone());
            }
        }
        self.subscribers.notify(&LogEvent::Appended(entry));
    }

    fn replay_pending(&mut self, mut snapshot_keys: Option<&mut HashMap<LogKey, usize>>) -> (usize, usize) {
        let pending = std::mem::replace(&mut self.pending, BoundedQueue::new(self.buffer.capacity()));
        let mut replayed = 0;
        let mut suppressed = 0;

        for entry in pending.iter() {
            if let Some(keys) = snapshot_keys.as_deref_mut() {
                if let Some(count) = keys.get_mut(&entry.key()) {
                    if *count > 0 {
                        *count -= 1;
                        suppressed += 1;
                        continue;
                    }
                }
            }
            self.buffer.push(entry.clone());
            replayed += 1;
        }

        (replayed, suppressed)
    }

    /// Arrival order, oldest first. Before the snapshot lands this is the
    /// pending live entries.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.buffer.iter().chain(self.pending.iter())
    }

    pub fn filtered<'a>(&'a self, filter: &'a LogFilter) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries().filter(move |entry| filter.matches(entry))
    }

    /// Entries owned by one bot instance.
    pub fn for_scope<'a>(&'a self, scope_id: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries()
            .filter(move |entry| entry.scope_id.as_deref() == Some(scope_id))
    }

    pub fn len(&self) -> usize {
        self.buffer.len() + self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn suppressed_total(&self) -> usize {
        self.suppressed_total
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&LogEvent) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }
}

impl Default for LogStreamMerger {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

//! State reconciler for entity streams
//!
//! Every accepted update bumps the stream's revision by one, whatever its
//! source. Push updates are always accepted. A pull update is accepted only
//! if the stream's revision is still the one captured when the pull was
//! issued; otherwise something fresher landed in between and the pull result
//! is discarded.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;
use crate::{
    errors::{DashError, DashResult},
    types::{EntitySnapshot, Revision, StreamId, StreamValue, UpdateOrigin},
    utils::{SubscriptionId, Subscribers},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Accepted { revision: Revision },
    Stale { started_at: Revision, current: Revision },
}

impl ApplyOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ApplyOutcome::Accepted { .. })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub accepted: u64,
    pub stale: u64,
    pub malformed: u64,
}

#[derive(Debug, Default)]
pub struct StateReconciler {
    streams: HashMap<StreamId, EntitySnapshot<StreamValue>>,
    subscribers: Subscribers<EntitySnapshot<StreamValue>>,
    errors: Subscribers<DashError>,
    stats: ReconcileStats,
}

impl StateReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes and applies one update. A malformed payload leaves state
    /// untouched and is published on the error channel.
    pub fn apply(&mut self, stream: StreamId, payload: &Value, origin: UpdateOrigin) -> DashResult<ApplyOutcome> {
        match StreamValue::decode(stream, payload) {
            Ok(value) => Ok(self.apply_value(value, origin)),
            Err(e) => {
                self.stats.malformed += 1;
                self.errors.notify(&e);
                Err(e)
            }
        }
    }

    pub fn apply_value(&mut self, value: StreamValue, origin: UpdateOrigin) -> ApplyOutcome {
        let stream = value.stream();
        let current = self.revision(stream);

        if let UpdateOrigin::Pull { started_at } = origin {
            if started_at != current {
                self.stats.stale += 1;
                debug!(
                    stream = %stream,
                    started_at,
                    current,
                    "Discarding pull result overtaken by a newer update"
                );
                return ApplyOutcome::Stale { started_at, current };
            }
        }

        let revision = current + 1;
        self.streams.insert(
            stream,
            EntitySnapshot {
                value,
                revision,
                source: origin.source(),
                updated_at: Utc::now(),
            },
        );
        self.stats.accepted += 1;
        debug!(stream = %stream, revision, source = ?origin.source(), "Accepted stream update");

        if let Some(snapshot) = self.streams.get(&stream) {
            self.subscribers.notify(snapshot);
        }

        ApplyOutcome::Accepted { revision }
    }

    /// Zero until the first update is accepted.
    pub fn revision(&self, stream: StreamId) -> Revision {
        self.streams.get(&stream).map(|s| s.revision).unwrap_or(0)
    }

    /// Revisions of every stream, captured at pull issue time.
    pub fn revisions(&self) -> HashMap<StreamId, Revision> {
        StreamId::ALL.into_iter().map(|id| (id, self.revision(id))).collect()
    }

    pub fn snapshot(&self, stream: StreamId) -> Option<&EntitySnapshot<StreamValue>> {
        self.streams.get(&stream)
    }

    pub fn value(&self, stream: StreamId) -> Option<&StreamValue> {
        self.streams.get(&stream).map(|s| &s.value)
    }

    pub fn stats(&self) -> ReconcileStats {
        self.stats
    }

    /// Called after every accepted update, in registration order.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EntitySnapshot<StreamValue>) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn subscribe_stream<F>(&mut self, stream: StreamId, mut callback: F) -> SubscriptionId
    where
        F: FnMut(&EntitySnapshot<StreamValue>) + Send + 'static,
    {
        self.subscribers.subscribe(move |snapshot: &EntitySnapshot<StreamValue>| {
            if snapshot.value.stream() == stream {
                callback(snapshot);
            }
        })
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn subscribe_errors<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&DashError) + Send + 'static,
    {
        self.errors.subscribe(callback)
    }
}

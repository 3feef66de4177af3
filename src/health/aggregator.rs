//! Health aggregation from push, pull and auxiliary probe signals

use tracing::info;
use crate::{
    types::{HealthSignals, HealthStatus, ServiceHealth},
    utils::{SubscriptionId, Subscribers},
};

/// The health record is a pure function of the latest signals.
pub fn derive(signals: &HealthSignals) -> HealthStatus {
    HealthStatus {
        data_api: ServiceHealth::from_ok(signals.mandatory_pull_ok),
        push_channel: ServiceHealth::from_ok(signals.push_connected),
        auxiliary_service: ServiceHealth::from_ok(signals.auxiliary_reachable),
    }
}

#[derive(Debug, Default)]
pub struct HealthAggregator {
    signals: HealthSignals,
    subscribers: Subscribers<HealthStatus>,
}

impl HealthAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> HealthStatus {
        derive(&self.signals)
    }

    pub fn signals(&self) -> HealthSignals {
        self.signals
    }

    pub fn set_push(&mut self, connected: bool) -> bool {
        self.update(|s| s.push_connected = connected)
    }

    pub fn set_data_api(&mut self, mandatory_ok: bool) -> bool {
        self.update(|s| s.mandatory_pull_ok = mandatory_ok)
    }

    pub fn set_auxiliary(&mut self, reachable: bool) -> bool {
        self.update(|s| s.auxiliary_reachable = reachable)
    }

    /// Subscribers see the new record only when a signal actually changed.
    fn update<F>(&mut self, change: F) -> bool
    where
        F: FnOnce(&mut HealthSignals),
    {
        let mut next = self.signals;
        change(&mut next);
        if next == self.signals {
            return false;
        }

        self.signals = next;
        let status = derive(&next);
        info!(
            data_api = ?status.data_api,
            push_channel = ?status.push_channel,
            auxiliary = ?status.auxiliary_service,
            "🩺 Health changed"
        );
        self.subscribers.notify(&status);
        true
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&HealthStatus) + Send + 'static,
    {
        self.subscribers.subscribe(callback)
    }
}

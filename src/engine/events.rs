//! Events delivered to the engine loop

use tokio::sync::mpsc;
use crate::{poller::PollerEvent, types::TransportEvent};

#[derive(Debug)]
pub enum EngineEvent {
    Transport { session: u64, event: TransportEvent },
    Poll(PollerEvent),
    Refresh,
    Shutdown,
}

pub type EventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Cloneable handle for requesting work from outside the engine loop.
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    events: EventSender,
}

impl DashboardHandle {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }

    /// Manual refresh; returns false once the engine has gone away.
    pub fn refresh(&self) -> bool {
        self.events.send(EngineEvent::Refresh).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.events.send(EngineEvent::Shutdown).is_ok()
    }
}

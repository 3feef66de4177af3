//! Connection supervisor for the push channel

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::{
    engine::EventSender,
    errors::DashError,
    types::{ConnectionNotice, ConnectionState, TransportEvent},
    utils::{SubscriptionId, Subscribers},
};
use super::{DispatchTable, PushTransport, RoutedMessage};

/// What the engine must act on after the supervisor processed one event.
#[derive(Debug)]
pub enum SupervisorOutput {
    StateChanged(ConnectionState),
    Routed(RoutedMessage),
    Rejected(DashError),
}

pub struct ConnectionSupervisor {
    transport: Arc<dyn PushTransport>,
    dispatch: DispatchTable,
    state: ConnectionState,
    session: u64,
    task: Option<JoinHandle<()>>,
    notices: Subscribers<ConnectionNotice>,
    opens: u64,
    messages_routed: u64,
}

impl ConnectionSupervisor {
    pub fn new(transport: Arc<dyn PushTransport>, dispatch: DispatchTable) -> Self {
        Self {
            transport,
            dispatch,
            state: ConnectionState::Disconnected,
            session: 0,
            task: None,
            notices: Subscribers::new(),
            opens: 0,
            messages_routed: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn opens(&self) -> u64 {
        self.opens
    }

    pub fn messages_routed(&self) -> u64 {
        self.messages_routed
    }

    pub fn subscribe_notices<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ConnectionNotice) + Send + 'static,
    {
        self.notices.subscribe(callback)
    }

    /// Starts a new transport session. No-op while one is already running.
    pub fn connect(&mut self, events: EventSender) {
        if self.task.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!("Push channel already running (session {})", self.session);
            return;
        }

        self.session += 1;
        self.state = ConnectionState::Connecting;
        info!("🔌 Connecting push channel (session {})", self.session);
        self.task = Some(self.transport.start(self.session, events));
    }

    /// Safe at any time. Events still queued from the closed session are
    /// ignored once this returns.
    pub fn close(&mut self) -> Option<SupervisorOutput> {
        self.session += 1;
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.transition_down(Some("closed by client".to_string()))
    }

    /// Applies one transport event. Events from stale sessions return `None`.
    pub fn handle(&mut self, session: u64, event: TransportEvent) -> Option<SupervisorOutput> {
        if session != self.session {
            debug!(session, current = self.session, "Ignoring event from stale push session");
            return None;
        }

        match event {
            TransportEvent::Open => {
                if self.state == ConnectionState::Connected {
                    return None;
                }
                self.state = ConnectionState::Connected;
                self.opens += 1;
                info!("✅ Push channel connected");
                self.notices.notify(&ConnectionNotice::Connected);
                Some(SupervisorOutput::StateChanged(self.state))
            }
            TransportEvent::Close { reason } => self.transition_down(reason),
            TransportEvent::Error { message } => {
                warn!("⚠️ Push channel transport error: {}", message);
                match self.state {
                    ConnectionState::Errored => None,
                    ConnectionState::Connected
                    | ConnectionState::Connecting
                    | ConnectionState::Disconnected => {
                        let was_connected = self.state == ConnectionState::Connected;
                        self.state = ConnectionState::Errored;
                        if was_connected {
                            self.notices.notify(&ConnectionNotice::Disconnected {
                                reason: Some(message),
                            });
                        }
                        Some(SupervisorOutput::StateChanged(self.state))
                    }
                }
            }
            TransportEvent::Message(raw) => match self.dispatch.route(&raw) {
                Ok(routed) => {
                    self.messages_routed += 1;
                    Some(SupervisorOutput::Routed(routed))
                }
                Err(e) => Some(SupervisorOutput::Rejected(e)),
            },
        }
    }

    /// Close events are idempotent: only the first one changes state.
    fn transition_down(&mut self, reason: Option<String>) -> Option<SupervisorOutput> {
        match self.state {
            ConnectionState::Disconnected => None,
            previous => {
                self.state = ConnectionState::Disconnected;
                if previous == ConnectionState::Connected {
                    info!(
                        "🔌 Push channel disconnected: {}",
                        reason.as_deref().unwrap_or("no reason given")
                    );
                    self.notices.notify(&ConnectionNotice::Disconnected { reason });
                }
                Some(SupervisorOutput::StateChanged(self.state))
            }
        }
    }
}

impl Drop for ConnectionSupervisor {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

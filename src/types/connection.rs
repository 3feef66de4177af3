//! Push channel connection types

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Errored,
}

impl ConnectionState {
    pub fn is_up(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Transient user-facing notice emitted on real open/close transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionNotice {
    Connected,
    Disconnected { reason: Option<String> },
}

/// Lifecycle and message events delivered by a push transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Open,
    Close { reason: Option<String> },
    Error { message: String },
    Message(String),
}

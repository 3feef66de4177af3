//! Push transport abstraction

use tokio::task::JoinHandle;
use crate::engine::EventSender;

/// A push channel that reports lifecycle and messages as `EngineEvent::Transport`
/// tagged with `session`. Reconnection and backoff belong to the transport.
pub trait PushTransport: Send + Sync {
    fn start(&self, session: u64, events: EventSender) -> JoinHandle<()>;
}

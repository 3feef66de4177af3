//! WebSocket push transport with reconnection

use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;
use crate::{
    config::{Config, PING_INTERVAL_SECS},
    connection::PushTransport,
    engine::{EngineEvent, EventSender},
    errors::{DashError, DashResult},
    types::TransportEvent,
};
use super::retry::{Backoff, RetryConfig};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Owns reconnection: the supervisor only ever sees Open/Close/Error/Message.
#[derive(Debug, Clone)]
pub struct WsTransport {
    url: Url,
    retry: RetryConfig,
}

/// Why one connection ended.
enum SessionEnd {
    /// The engine dropped its receiver; stop for good.
    EngineGone,
    Closed(Option<String>),
    Failed(String),
}

impl WsTransport {
    pub fn new(url: &str, retry: RetryConfig) -> DashResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| DashError::Config(format!("Invalid push channel URL {}: {}", url, e)))?;
        Ok(Self { url, retry })
    }

    pub fn from_config(config: &Config) -> DashResult<Self> {
        Self::new(
            &config.ws_url,
            RetryConfig {
                max_attempts: u32::MAX,
                initial_delay_ms: config.reconnect_initial_ms,
                max_delay_ms: config.reconnect_max_ms,
                exponential_base: 2.0,
            },
        )
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn run(self, session: u64, events: EventSender) {
        let mut backoff = Backoff::new(self.retry.clone());
        let send = |event: TransportEvent| {
            events
                .send(EngineEvent::Transport { session, event })
                .is_ok()
        };

        loop {
            let end = self.connect_and_stream(&send, &mut backoff).await;

            let delivered = match end {
                SessionEnd::EngineGone => return,
                SessionEnd::Closed(reason) => send(TransportEvent::Close { reason }),
                SessionEnd::Failed(message) => {
                    send(TransportEvent::Error { message })
                        && send(TransportEvent::Close { reason: None })
                }
            };
            if !delivered {
                return;
            }

            let delay = backoff.next_delay();
            info!(
                "🔁 Reconnecting push channel in {:?} (attempt {})",
                delay,
                backoff.attempt()
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn connect_and_stream<F>(&self, send: &F, backoff: &mut Backoff) -> SessionEnd
    where
        F: Fn(TransportEvent) -> bool,
    {
        debug!("Connecting to push channel at {}", self.url);
        let connect = tokio::time::timeout(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            connect_async(self.url.as_str()),
        )
        .await;

        let ws_stream = match connect {
            Ok(Ok((stream, _))) => stream,
            Ok(Err(e)) => return SessionEnd::Failed(format!("connect failed: {}", e)),
            Err(_) => return SessionEnd::Failed("connect timed out".to_string()),
        };

        backoff.reset();
        if !send(TransportEvent::Open) {
            return SessionEnd::EngineGone;
        }

        let (mut write, mut read) = ws_stream.split();
        let mut ping_interval = interval(Duration::from_secs(PING_INTERVAL_SECS));
        ping_interval.tick().await;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if !send(TransportEvent::Message(text)) {
                                return SessionEnd::EngineGone;
                            }
                        }
                        Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                            Ok(text) => {
                                if !send(TransportEvent::Message(text)) {
                                    return SessionEnd::EngineGone;
                                }
                            }
                            Err(_) => debug!("Dropping non UTF-8 binary frame"),
                        },
                        Some(Ok(Message::Ping(data))) => {
                            if let Err(e) = write.send(Message::Pong(data)).await {
                                warn!("Failed to send pong: {}", e);
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            let reason = frame
                                .map(|f| f.reason.to_string())
                                .filter(|r| !r.is_empty());
                            return SessionEnd::Closed(reason);
                        }
                        Some(Err(e)) => return SessionEnd::Failed(e.to_string()),
                        None => return SessionEnd::Closed(Some("stream ended".to_string())),
                        _ => {}
                    }
                }
                _ = ping_interval.tick() => {
                    if let Err(e) = write.send(Message::Ping(Vec::new())).await {
                        return SessionEnd::Failed(format!("ping failed: {}", e));
                    }
                    debug!("Sent ping on push channel");
                }
            }
        }
    }
}

impl PushTransport for WsTransport {
    fn start(&self, session: u64, events: EventSender) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(session, events))
    }
}

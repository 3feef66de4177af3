//! Network transports: HTTP pull source, WebSocket push channel, backoff

pub mod retry;
pub mod http;
pub mod websocket;

pub use retry::*;
pub use http::*;
pub use websocket::*;

//! Error taxonomy for the sync engine

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },

    #[error("Fetch failed for {endpoint}: {message}")]
    PartialFetch {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Request to {endpoint} timed out after {timeout:?}")]
    Timeout {
        endpoint: String,
        timeout: Duration,
    },

    #[error("Malformed {context} payload: {reason}")]
    MalformedPayload {
        context: String,
        reason: String,
    },

    #[error("Unknown message kind: {kind}")]
    UnknownMessage {
        kind: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashError {
    pub fn transport(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        DashError::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn malformed(context: impl Into<String>, reason: impl ToString) -> Self {
        DashError::MalformedPayload {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Timeouts count as fetch failures for pull health.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, DashError::PartialFetch { .. } | DashError::Timeout { .. })
    }
}

pub type DashResult<T> = Result<T, DashError>;

//! Local recovery strategies for every failure path

use std::collections::HashMap;
use tracing::Level;
use super::DashError;

pub struct ErrorRecovery {
    pub error_counts: HashMap<String, u32>,
    pub recovery_strategies: HashMap<String, RecoveryStrategy>,
}

#[derive(Clone)]
pub enum RecoveryStrategy {
    AwaitReconnect,
    RetainPrevious { log_level: Level },
    Drop { log_level: Level },
}

#[derive(Debug, PartialEq)]
pub enum RecoveryAction {
    /// Transport drops recover through the transport's own reconnection.
    AwaitReconnect { occurrences: u32 },
    /// Keep the last accepted snapshot; degrade pull health.
    RetainPrevious { log_level: Level, occurrences: u32 },
    /// Discard the message without touching state.
    Drop { log_level: Level, occurrences: u32 },
}

impl ErrorRecovery {
    pub fn new() -> Self {
        let mut strategies = HashMap::new();

        strategies.insert("transport".to_string(), RecoveryStrategy::AwaitReconnect);

        strategies.insert(
            "fetch_failure".to_string(),
            RecoveryStrategy::RetainPrevious {
                log_level: Level::WARN,
            },
        );

        strategies.insert(
            "malformed_payload".to_string(),
            RecoveryStrategy::Drop {
                log_level: Level::WARN,
            },
        );

        strategies.insert(
            "unknown_message".to_string(),
            RecoveryStrategy::Drop {
                log_level: Level::DEBUG,
            },
        );

        Self {
            error_counts: HashMap::new(),
            recovery_strategies: strategies,
        }
    }

    pub fn handle_error(&mut self, error: &DashError) -> RecoveryAction {
        let error_type = self.classify_error(error);
        let count = self.error_counts.entry(error_type.to_string()).or_insert(0);
        *count += 1;
        let occurrences = *count;

        match self.recovery_strategies.get(error_type) {
            Some(RecoveryStrategy::AwaitReconnect) => RecoveryAction::AwaitReconnect { occurrences },
            Some(RecoveryStrategy::RetainPrevious { log_level }) => RecoveryAction::RetainPrevious {
                log_level: *log_level,
                occurrences,
            },
            Some(RecoveryStrategy::Drop { log_level }) => RecoveryAction::Drop {
                log_level: *log_level,
                occurrences,
            },
            // Nothing in the engine is allowed to be fatal.
            None => RecoveryAction::Drop {
                log_level: Level::ERROR,
                occurrences,
            },
        }
    }

    pub fn total_errors(&self) -> u32 {
        self.error_counts.values().sum()
    }

    fn classify_error(&self, error: &DashError) -> &'static str {
        match error {
            DashError::Transport { .. } => "transport",
            DashError::PartialFetch { .. } | DashError::Timeout { .. } => "fetch_failure",
            DashError::MalformedPayload { .. } => "malformed_payload",
            DashError::UnknownMessage { .. } => "unknown_message",
            DashError::Config(_) => "config",
        }
    }
}

impl Default for ErrorRecovery {
    fn default() -> Self {
        Self::new()
    }
}

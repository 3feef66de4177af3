//! Bot log entry types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered by severity so a minimum-level filter can compare directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Success,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    #[serde(default, alias = "botId")]
    pub scope_id: Option<String>,
    #[serde(default)]
    pub category: String,
    pub message: String,
    #[serde(default, alias = "data", skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Identity used to suppress snapshot/tail overlap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogKey {
    timestamp: DateTime<Utc>,
    category: String,
    message: String,
    scope_id: Option<String>,
}

impl LogEntry {
    pub fn key(&self) -> LogKey {
        LogKey {
            timestamp: self.timestamp,
            category: self.category.clone(),
            message: self.message.clone(),
            scope_id: self.scope_id.clone(),
        }
    }
}

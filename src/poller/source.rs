//! Pull endpoint set and the source abstraction behind it

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use crate::{
    errors::{DashError, DashResult},
    types::{LogEntry, Revision, StreamId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    Positions,
    Status,
    Metrics,
    Transactions,
    History,
    BotStatus,
}

impl Endpoint {
    pub const ALL: [Endpoint; 6] = [
        Endpoint::Positions,
        Endpoint::Status,
        Endpoint::Metrics,
        Endpoint::Transactions,
        Endpoint::History,
        Endpoint::BotStatus,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Positions => "positions",
            Endpoint::Status => "status",
            Endpoint::Metrics => "metrics",
            Endpoint::Transactions => "transactions",
            Endpoint::History => "history",
            Endpoint::BotStatus => "botStatus",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Positions => "/api/positions",
            Endpoint::Status => "/api/status",
            Endpoint::Metrics => "/api/metrics",
            Endpoint::Transactions => "/api/transactions",
            Endpoint::History => "/api/profit-history",
            Endpoint::BotStatus => "/api/bot/status",
        }
    }

    pub fn stream(&self) -> StreamId {
        match self {
            Endpoint::Positions => StreamId::Positions,
            Endpoint::Status => StreamId::AccountStatus,
            Endpoint::Metrics => StreamId::Metrics,
            Endpoint::Transactions => StreamId::Transactions,
            Endpoint::History => StreamId::ProfitHistory,
            Endpoint::BotStatus => StreamId::BotStatus,
        }
    }

    /// Only these decide the data API health.
    pub fn is_mandatory(&self) -> bool {
        matches!(
            self,
            Endpoint::Positions | Endpoint::Status | Endpoint::Metrics | Endpoint::Transactions
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self, endpoint: Endpoint) -> DashResult<Value>;

    /// Lightweight reachability check of the auxiliary control-plane service.
    async fn probe_auxiliary(&self) -> bool;

    async fn fetch_log_history(&self, limit: usize) -> DashResult<Vec<LogEntry>>;
}

/// Revisions captured per stream when a pull cycle is issued.
#[derive(Debug, Clone, PartialEq)]
pub struct PullTicket {
    pub cycle: u64,
    pub epoch: u64,
    pub started_at: HashMap<StreamId, Revision>,
}

impl PullTicket {
    pub fn started_at(&self, stream: StreamId) -> Revision {
        self.started_at.get(&stream).copied().unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct PullCycleReport {
    pub ticket: PullTicket,
    pub results: Vec<(Endpoint, DashResult<Value>)>,
    pub auxiliary_ok: bool,
}

#[derive(Debug)]
pub enum PollerEvent {
    Tick { epoch: u64 },
    CycleCompleted(PullCycleReport),
    LogHistory { epoch: u64, result: DashResult<Vec<LogEntry>> },
}

/// Accepts a bare array or an object wrapping it under `logs` or `data`.
pub fn decode_log_batch(payload: &Value) -> DashResult<Vec<LogEntry>> {
    let batch = match payload {
        Value::Array(_) => payload,
        Value::Object(map) => map
            .get("logs")
            .or_else(|| map.get("data"))
            .ok_or_else(|| DashError::malformed("initialLogs", "expected an array of log entries"))?,
        _ => return Err(DashError::malformed("initialLogs", "expected an array of log entries")),
    };

    serde_json::from_value(batch.clone()).map_err(|e| DashError::malformed("initialLogs", e))
}

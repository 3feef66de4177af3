//! Message-kind dispatch table for push channel messages

use serde_json::Value;
use std::collections::HashMap;
use crate::{
    errors::{DashError, DashResult},
    types::{ActivityKind, PushEnvelope, StreamId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Stream(StreamId),
    Activity(ActivityKind),
    LiveLog,
    LogSnapshot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoutedMessage {
    Stream { stream: StreamId, payload: Value },
    Activity { kind: ActivityKind, payload: Value },
    LiveLog(Value),
    LogSnapshot(Value),
}

#[derive(Debug, Clone)]
pub struct DispatchTable {
    routes: HashMap<String, Route>,
}

impl DispatchTable {
    pub fn empty() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn standard() -> Self {
        let mut table = Self::empty();

        for stream in StreamId::ALL {
            table.insert(stream.as_str(), Route::Stream(stream));
        }

        table.insert("trade", Route::Activity(ActivityKind::TradeExecuted));
        table.insert("profitTarget", Route::Activity(ActivityKind::ProfitTargetHit));
        table.insert("stopLoss", Route::Activity(ActivityKind::StopLossHit));
        table.insert("arbitrageFill", Route::Activity(ActivityKind::ArbitrageFill));
        table.insert("liquidityEnter", Route::Activity(ActivityKind::LiquidityEnter));
        table.insert("liquidityExit", Route::Activity(ActivityKind::LiquidityExit));
        table.insert("error", Route::Activity(ActivityKind::Error));
        table.insert("status", Route::Activity(ActivityKind::Status));

        table.insert("log", Route::LiveLog);
        table.insert("initialLogs", Route::LogSnapshot);

        table
    }

    pub fn insert(&mut self, kind: &str, route: Route) {
        self.routes.insert(kind.to_string(), route);
    }

    pub fn lookup(&self, kind: &str) -> Option<Route> {
        self.routes.get(kind).copied()
    }

    /// Parses one raw push message and resolves its route.
    pub fn route(&self, raw: &str) -> DashResult<RoutedMessage> {
        let envelope: PushEnvelope = serde_json::from_str(raw)
            .map_err(|e| DashError::malformed("push message", e))?;

        let route = self.lookup(&envelope.kind).ok_or_else(|| DashError::UnknownMessage {
            kind: envelope.kind.clone(),
        })?;

        Ok(match route {
            Route::Stream(stream) => RoutedMessage::Stream {
                stream,
                payload: envelope.data,
            },
            Route::Activity(kind) => RoutedMessage::Activity {
                kind,
                payload: envelope.data,
            },
            Route::LiveLog => RoutedMessage::LiveLog(envelope.data),
            Route::LogSnapshot => RoutedMessage::LogSnapshot(envelope.data),
        })
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::standard()
    }
}

//! Activity feed entry types

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivityKind {
    TradeExecuted,
    ProfitTargetHit,
    StopLossHit,
    ArbitrageFill,
    LiquidityEnter,
    LiquidityExit,
    Error,
    Status,
}

impl ActivityKind {
    pub fn label(&self) -> &'static str {
        match self {
            ActivityKind::TradeExecuted => "trade-executed",
            ActivityKind::ProfitTargetHit => "profit-target-hit",
            ActivityKind::StopLossHit => "stop-loss-hit",
            ActivityKind::ArbitrageFill => "arbitrage-fill",
            ActivityKind::LiquidityEnter => "liquidity-enter",
            ActivityKind::LiquidityExit => "liquidity-exit",
            ActivityKind::Error => "error",
            ActivityKind::Status => "status",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single notable event. Never mutated after the feed creates it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub id: u64,
    pub kind: ActivityKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

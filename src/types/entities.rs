//! Typed entity records carried by the reconciled streams

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::errors::{DashError, DashResult};
use super::StreamId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: String,
    #[serde(default, alias = "scopeId")]
    pub bot_id: Option<String>,
    pub pool: String,
    #[serde(default)]
    pub strategy: Option<String>,
    pub amount: Decimal,
    pub entry_price: Decimal,
    #[serde(default)]
    pub current_price: Option<Decimal>,
    #[serde(default)]
    pub unrealized_pnl: Decimal,
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub network: Option<String>,
    pub total_balance_usd: Decimal,
    #[serde(default)]
    pub available_balance_usd: Decimal,
    #[serde(default)]
    pub open_positions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_trades: u64,
    #[serde(default)]
    pub winning_trades: u64,
    pub total_profit_usd: Decimal,
    #[serde(default)]
    pub daily_profit_usd: Decimal,
    #[serde(default)]
    pub win_rate: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitPoint {
    pub timestamp: DateTime<Utc>,
    pub profit_usd: Decimal,
    #[serde(default)]
    pub cumulative_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatus {
    pub running: bool,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub active_bots: u32,
    #[serde(default)]
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: Decimal,
    #[serde(default)]
    pub asset: Option<String>,
    #[serde(default)]
    pub tx_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A decoded, validated payload for one entity stream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamValue {
    Positions(Vec<Position>),
    AccountStatus(AccountStatus),
    Metrics(Metrics),
    ProfitHistory(Vec<ProfitPoint>),
    BotStatus(BotStatus),
    Transactions(Vec<Transaction>),
}

impl StreamValue {
    /// Decodes `payload` as the record type of `stream`. A `{"data": ...}`
    /// wrapper is unwrapped when the bare payload does not match.
    pub fn decode(stream: StreamId, payload: &Value) -> DashResult<Self> {
        match Self::decode_exact(stream, payload) {
            Ok(value) => Ok(value),
            Err(e) => match payload.get("data") {
                Some(inner) => Self::decode_exact(stream, inner).map_err(|_| e),
                None => Err(e),
            },
        }
    }

    fn decode_exact(stream: StreamId, payload: &Value) -> DashResult<Self> {
        Ok(match stream {
            StreamId::Positions => StreamValue::Positions(parse(stream, payload)?),
            StreamId::AccountStatus => StreamValue::AccountStatus(parse(stream, payload)?),
            StreamId::Metrics => StreamValue::Metrics(parse(stream, payload)?),
            StreamId::ProfitHistory => StreamValue::ProfitHistory(parse(stream, payload)?),
            StreamId::BotStatus => StreamValue::BotStatus(parse(stream, payload)?),
            StreamId::Transactions => StreamValue::Transactions(parse(stream, payload)?),
        })
    }

    pub fn stream(&self) -> StreamId {
        match self {
            StreamValue::Positions(_) => StreamId::Positions,
            StreamValue::AccountStatus(_) => StreamId::AccountStatus,
            StreamValue::Metrics(_) => StreamId::Metrics,
            StreamValue::ProfitHistory(_) => StreamId::ProfitHistory,
            StreamValue::BotStatus(_) => StreamId::BotStatus,
            StreamValue::Transactions(_) => StreamId::Transactions,
        }
    }

    pub fn as_positions(&self) -> Option<&[Position]> {
        match self {
            StreamValue::Positions(positions) => Some(positions),
            _ => None,
        }
    }

    pub fn as_profit_history(&self) -> Option<&[ProfitPoint]> {
        match self {
            StreamValue::ProfitHistory(points) => Some(points),
            _ => None,
        }
    }
}

fn parse<T: DeserializeOwned>(stream: StreamId, payload: &Value) -> DashResult<T> {
    T::deserialize(payload).map_err(|e| DashError::malformed(stream.as_str(), e))
}

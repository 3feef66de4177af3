//! Entity stream identifiers and revisioned snapshots

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Per-stream logical revision. Zero means nothing accepted yet.
pub type Revision = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StreamId {
    Positions,
    AccountStatus,
    Metrics,
    ProfitHistory,
    BotStatus,
    Transactions,
}

impl StreamId {
    pub const ALL: [StreamId; 6] = [
        StreamId::Positions,
        StreamId::AccountStatus,
        StreamId::Metrics,
        StreamId::ProfitHistory,
        StreamId::BotStatus,
        StreamId::Transactions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamId::Positions => "positions",
            StreamId::AccountStatus => "accountStatus",
            StreamId::Metrics => "metrics",
            StreamId::ProfitHistory => "profitHistory",
            StreamId::BotStatus => "botStatus",
            StreamId::Transactions => "transactions",
        }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StreamId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StreamId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown stream '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    Push,
    Pull,
}

/// Where an update came from, with the revision a pull observed when it was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOrigin {
    Push,
    Pull { started_at: Revision },
}

impl UpdateOrigin {
    pub fn source(&self) -> Source {
        match self {
            UpdateOrigin::Push => Source::Push,
            UpdateOrigin::Pull { .. } => Source::Pull,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot<T> {
    pub value: T,
    pub revision: Revision,
    pub source: Source,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_ids_parse_from_their_wire_names() {
        for id in StreamId::ALL {
            assert_eq!(id.as_str().parse::<StreamId>(), Ok(id));
        }
        assert!("orders".parse::<StreamId>().is_err());
    }
}

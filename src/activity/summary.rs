//! Human-readable messages for activity events

use serde_json::Value;
use crate::types::ActivityKind;

/// Uses the payload's `message` when present, otherwise builds a summary
/// from whichever known fields the payload carries.
pub fn describe(kind: ActivityKind, payload: &Value) -> String {
    if let Some(message) = text(payload, "message") {
        return message;
    }

    let market = text(payload, "symbol").or_else(|| text(payload, "pool"));
    let parts = match kind {
        ActivityKind::TradeExecuted => vec![
            Some("Trade executed:".to_string()),
            text(payload, "side").map(|s| s.to_uppercase()),
            text(payload, "amount"),
            market,
            text(payload, "price").map(|p| format!("@ ${}", p)),
        ],
        ActivityKind::ProfitTargetHit => vec![
            Some("Profit target hit".to_string()),
            market.map(|m| format!("on {}", m)),
            text(payload, "profit").map(|p| format!("(+${})", p)),
        ],
        ActivityKind::StopLossHit => vec![
            Some("Stop loss hit".to_string()),
            market.map(|m| format!("on {}", m)),
            text(payload, "loss").map(|l| format!("(-${})", l.trim_start_matches('-'))),
        ],
        ActivityKind::ArbitrageFill => vec![
            Some("Arbitrage filled".to_string()),
            market.map(|m| format!("on {}", m)),
            text(payload, "profit").map(|p| format!("(${} profit)", p)),
        ],
        ActivityKind::LiquidityEnter => vec![
            Some("Entered liquidity".to_string()),
            market.map(|m| format!("in {}", m)),
            text(payload, "amount").map(|a| format!("({})", a)),
        ],
        ActivityKind::LiquidityExit => vec![
            Some("Exited liquidity".to_string()),
            market.map(|m| format!("from {}", m)),
            text(payload, "amount").map(|a| format!("({})", a)),
        ],
        ActivityKind::Error => vec![
            Some("Bot error:".to_string()),
            text(payload, "error").or_else(|| Some("unknown error".to_string())),
        ],
        ActivityKind::Status => vec![
            Some("Status:".to_string()),
            text(payload, "status").or_else(|| Some("updated".to_string())),
        ],
    };

    parts.into_iter().flatten().collect::<Vec<_>>().join(" ")
}

/// String or number field rendered as text.
fn text(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

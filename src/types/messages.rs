//! Push channel wire envelope

use serde::Deserialize;
use serde_json::Value;

/// Every application message on the push channel is `{"type": <kind>, "data": <payload>}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    #[serde(rename = "type", alias = "event")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

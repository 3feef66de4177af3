//! Health monitoring types

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    Ok,
    Down,
}

impl ServiceHealth {
    pub fn from_ok(ok: bool) -> Self {
        if ok { ServiceHealth::Ok } else { ServiceHealth::Down }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ServiceHealth::Ok)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub data_api: ServiceHealth,
    pub push_channel: ServiceHealth,
    pub auxiliary_service: ServiceHealth,
}

/// Latest raw signals the health record is derived from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthSignals {
    pub push_connected: bool,
    pub mandatory_pull_ok: bool,
    pub auxiliary_reachable: bool,
}

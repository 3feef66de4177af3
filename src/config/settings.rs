//! Dashboard sync configuration and environment variable handling

use std::env;
use std::time::Duration;

// Buffer constants
pub const ACTIVITY_CAPACITY: usize = 50;
pub const DEFAULT_LOG_CAPACITY: usize = 500;
pub const MIN_LOG_CAPACITY: usize = 10;
pub const MAX_LOG_CAPACITY: usize = 10_000;

// Pull cycle constants
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
pub const MIN_POLL_INTERVAL_MS: u64 = 500;
pub const MAX_POLL_INTERVAL_MS: u64 = 300_000; // 5 minutes
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
pub const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;

// Push channel constants
pub const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1_000;
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;
pub const PING_INTERVAL_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub ws_url: String,
    pub aux_health_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub log_capacity: usize,
    pub activity_capacity: usize,
    // Reconnection (owned by the transport, not the supervisor)
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
    // Filtered log view printed by the binary
    pub log_scope: Option<String>,
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, applying defaults and clamps.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let reconnect_initial_ms = lookup("DASH_RECONNECT_INITIAL_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RECONNECT_INITIAL_MS)
            .max(1);

        Self {
            api_base_url: lookup("DASH_API_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            ws_url: lookup("DASH_WS_URL")
                .unwrap_or_else(|| "ws://localhost:3000/ws".to_string()),
            aux_health_url: lookup("DASH_AUX_HEALTH_URL")
                .unwrap_or_else(|| "http://localhost:8080/health".to_string()),
            poll_interval_ms: lookup("DASH_POLL_INTERVAL_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS)
                .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS),
            request_timeout_ms: lookup("DASH_REQUEST_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS)
                .clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS),
            log_capacity: lookup("DASH_LOG_CAPACITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_LOG_CAPACITY)
                .clamp(MIN_LOG_CAPACITY, MAX_LOG_CAPACITY),
            activity_capacity: ACTIVITY_CAPACITY,
            reconnect_initial_ms,
            reconnect_max_ms: lookup("DASH_RECONNECT_MAX_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RECONNECT_MAX_MS)
                .max(reconnect_initial_ms),
            log_scope: lookup("DASH_LOG_SCOPE").filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::default();
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(config.log_capacity, DEFAULT_LOG_CAPACITY);
        assert_eq!(config.activity_capacity, ACTIVITY_CAPACITY);
        assert!(config.log_scope.is_none());
    }

    #[test]
    fn numeric_values_are_clamped() {
        let config = config_with(&[
            ("DASH_POLL_INTERVAL_MS", "1"),
            ("DASH_REQUEST_TIMEOUT_MS", "999999"),
            ("DASH_LOG_CAPACITY", "3"),
        ]);
        assert_eq!(config.poll_interval_ms, MIN_POLL_INTERVAL_MS);
        assert_eq!(config.request_timeout_ms, MAX_REQUEST_TIMEOUT_MS);
        assert_eq!(config.log_capacity, MIN_LOG_CAPACITY);
    }

    #[test]
    fn unparsable_values_fall_back_to_defaults() {
        let config = config_with(&[("DASH_POLL_INTERVAL_MS", "soon"), ("DASH_LOG_SCOPE", "  ")]);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.log_scope.is_none());
    }

    #[test]
    fn reconnect_max_never_below_initial() {
        let config = config_with(&[
            ("DASH_RECONNECT_INITIAL_MS", "5000"),
            ("DASH_RECONNECT_MAX_MS", "100"),
        ]);
        assert_eq!(config.reconnect_max_ms, 5000);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = config_with(&[("DASH_API_BASE_URL", "https://bot.example.com/")]);
        assert_eq!(config.api_base_url, "https://bot.example.com");
    }
}

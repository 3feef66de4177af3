//! HTTP snapshot source for pull cycles

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use crate::{
    config::Config,
    errors::{DashError, DashResult},
    poller::{decode_log_batch, Endpoint, SnapshotSource},
    types::LogEntry,
};

const LOGS_PATH: &str = "/api/logs";

pub struct HttpSnapshotSource {
    client: Client,
    base_url: String,
    aux_health_url: String,
    timeout: Duration,
}

impl HttpSnapshotSource {
    pub fn new(base_url: &str, aux_health_url: &str, timeout: Duration) -> DashResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DashError::transport("Failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            aux_health_url: aux_health_url.to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> DashResult<Self> {
        Self::new(&config.api_base_url, &config.aux_health_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every failure before a JSON body is in hand counts as a fetch failure.
    async fn get_json(&self, label: &str, url: &str) -> DashResult<Value> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                DashError::Timeout {
                    endpoint: label.to_string(),
                    timeout: self.timeout,
                }
            } else {
                DashError::PartialFetch {
                    endpoint: label.to_string(),
                    status: None,
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("⚠️ {} returned status {}: {}", label, status, body);
            return Err(DashError::PartialFetch {
                endpoint: label.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {}", status),
            });
        }

        let body = response.text().await.map_err(|e| DashError::PartialFetch {
            endpoint: label.to_string(),
            status: Some(status.as_u16()),
            message: format!("failed to read body: {}", e),
        })?;

        serde_json::from_str(&body).map_err(|e| DashError::PartialFetch {
            endpoint: label.to_string(),
            status: Some(status.as_u16()),
            message: format!("body is not JSON: {}", e),
        })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self, endpoint: Endpoint) -> DashResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!(endpoint = %endpoint, "GET {}", url);
        self.get_json(endpoint.name(), &url).await
    }

    async fn probe_auxiliary(&self) -> bool {
        match self.client.get(&self.aux_health_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Auxiliary service probe failed: {}", e);
                false
            }
        }
    }

    async fn fetch_log_history(&self, limit: usize) -> DashResult<Vec<LogEntry>> {
        let url = format!("{}{}?limit={}", self.base_url, LOGS_PATH, limit);
        let payload = self.get_json("logs", &url).await?;
        decode_log_batch(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn source(server: &Server, timeout: Duration) -> HttpSnapshotSource {
        HttpSnapshotSource::new(
            &format!("{}/", server.url()),
            &format!("{}/health", server.url()),
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_endpoint_json() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/positions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":"p1","symbol":"WETH/USDC"}]"#)
            .create_async()
            .await;

        let value = tokio_test::assert_ok!(
            source(&server, Duration::from_secs(2))
                .fetch(Endpoint::Positions)
                .await
        );

        mock.assert_async().await;
        assert_eq!(value[0]["id"], "p1");
    }

    #[tokio::test]
    async fn non_success_status_is_a_partial_fetch() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/metrics")
            .with_status(503)
            .with_body("maintenance")
            .create_async()
            .await;

        let err = tokio_test::assert_err!(
            source(&server, Duration::from_secs(2))
                .fetch(Endpoint::Metrics)
                .await
        );

        assert!(matches!(err, DashError::PartialFetch { status: Some(503), .. }));
        assert!(err.is_fetch_failure());
    }

    #[tokio::test]
    async fn non_json_body_is_a_partial_fetch() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/api/status")
            .with_status(200)
            .with_body("<html>proxy error</html>")
            .create_async()
            .await;

        let err = source(&server, Duration::from_secs(2))
            .fetch(Endpoint::Status)
            .await
            .unwrap_err();

        assert!(matches!(err, DashError::PartialFetch { status: Some(200), .. }));
    }

    #[tokio::test]
    async fn auxiliary_probe_follows_status() {
        let mut server = Server::new_async().await;
        server.mock("GET", "/health").with_status(200).create_async().await;
        assert!(source(&server, Duration::from_secs(2)).probe_auxiliary().await);

        let mut failing = Server::new_async().await;
        failing.mock("GET", "/health").with_status(500).create_async().await;
        assert!(!source(&failing, Duration::from_secs(2)).probe_auxiliary().await);
    }

    #[tokio::test]
    async fn log_history_requests_the_limit() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/logs")
            .match_query(mockito::Matcher::UrlEncoded("limit".into(), "500".into()))
            .with_status(200)
            .with_body(
                r#"{"logs":[{"timestamp":"2026-10-17T08:00:00Z","level":"info","category":"engine","message":"boot"}]}"#,
            )
            .create_async()
            .await;

        let entries = source(&server, Duration::from_secs(2))
            .fetch_log_history(500)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "boot");
    }
}

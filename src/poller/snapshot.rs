//! Snapshot poller: timed and on-demand pull cycles

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::{
    engine::{EngineEvent, EventSender},
    errors::DashError,
    network::retry::{retry_with_backoff, RetryConfig},
    types::{Revision, StreamId},
};
use super::{Endpoint, PollerEvent, PullCycleReport, PullTicket, SnapshotSource};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EndpointHealth {
    /// False on network failure, timeout, non-2xx or unparsable body.
    pub reachable: bool,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub mandatory_ok: bool,
    pub failed_endpoints: usize,
}

pub struct SnapshotPoller {
    source: Arc<dyn SnapshotSource>,
    events: EventSender,
    request_timeout: Duration,
    epoch: u64,
    next_cycle: u64,
    timer: Option<JoinHandle<()>>,
    in_flight: Vec<JoinHandle<()>>,
    endpoint_health: HashMap<Endpoint, EndpointHealth>,
}

impl SnapshotPoller {
    pub fn new(source: Arc<dyn SnapshotSource>, events: EventSender, request_timeout: Duration) -> Self {
        Self {
            source,
            events,
            request_timeout,
            epoch: 0,
            next_cycle: 0,
            timer: None,
            in_flight: Vec::new(),
            endpoint_health: HashMap::new(),
        }
    }

    /// Ticks immediately, then every `interval` until `stop()`.
    pub fn start(&mut self, interval: Duration) {
        self.stop();

        let epoch = self.epoch;
        let events = self.events.clone();
        info!("🔄 Snapshot poller started (every {:?})", interval);

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(EngineEvent::Poll(PollerEvent::Tick { epoch })).is_err() {
                    break;
                }
            }
        }));
    }

    /// Safe at any time. Completions of requests already in flight carry the
    /// old epoch and are ignored once this returns.
    pub fn stop(&mut self) {
        self.epoch += 1;

        if let Some(timer) = self.timer.take() {
            timer.abort();
            info!("⏹️  Snapshot poller stopped");
        }
        for task in self.in_flight.drain(..) {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    /// Issues one pull cycle with the revisions observed right now.
    pub fn launch_cycle(&mut self, started_at: HashMap<StreamId, Revision>) -> PullTicket {
        self.next_cycle += 1;
        let ticket = PullTicket {
            cycle: self.next_cycle,
            epoch: self.epoch,
            started_at,
        };

        self.in_flight.retain(|task| !task.is_finished());

        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        let timeout = self.request_timeout;
        let cycle_ticket = ticket.clone();

        debug!(cycle = ticket.cycle, epoch = ticket.epoch, "Launching pull cycle");
        self.in_flight.push(tokio::spawn(async move {
            let report = run_pull_cycle(source.as_ref(), cycle_ticket, timeout).await;
            let _ = events.send(EngineEvent::Poll(PollerEvent::CycleCompleted(report)));
        }));

        ticket
    }

    /// One-shot historical log fetch for the log merger.
    pub fn fetch_log_history(&mut self, limit: usize) {
        let source = Arc::clone(&self.source);
        let events = self.events.clone();
        let epoch = self.epoch;

        self.in_flight.push(tokio::spawn(async move {
            let result = retry_with_backoff(
                || source.fetch_log_history(limit),
                &RetryConfig {
                    max_attempts: 3,
                    initial_delay_ms: 500,
                    ..Default::default()
                },
                "historical log fetch",
            )
            .await;
            let _ = events.send(EngineEvent::Poll(PollerEvent::LogHistory { epoch, result }));
        }));
    }

    /// Updates per-endpoint health from a finished cycle.
    pub fn record_cycle(&mut self, report: &PullCycleReport) -> CycleSummary {
        let now = Utc::now();
        let mut mandatory_ok = true;
        let mut failed_endpoints = 0;

        for (endpoint, result) in &report.results {
            let health = self.endpoint_health.entry(*endpoint).or_default();
            match result {
                Ok(_) => {
                    health.reachable = true;
                    health.last_error = None;
                    health.last_success = Some(now);
                }
                Err(e) => {
                    health.reachable = false;
                    health.last_error = Some(e.to_string());
                    failed_endpoints += 1;
                    if endpoint.is_mandatory() {
                        mandatory_ok = false;
                    }
                }
            }
        }

        // A mandatory endpoint missing from the report counts as failed.
        if Endpoint::ALL
            .iter()
            .filter(|e| e.is_mandatory())
            .any(|e| !report.results.iter().any(|(seen, _)| seen == e))
        {
            mandatory_ok = false;
        }

        if failed_endpoints > 0 {
            warn!(
                cycle = report.ticket.cycle,
                "Pull cycle finished with {} failed endpoint(s)", failed_endpoints
            );
        }

        CycleSummary {
            mandatory_ok,
            failed_endpoints,
        }
    }

    /// Records a decode failure on a reachable endpoint.
    pub fn record_malformed(&mut self, endpoint: Endpoint, error: &DashError) {
        let health = self.endpoint_health.entry(endpoint).or_default();
        health.last_error = Some(error.to_string());
    }

    pub fn endpoint_health(&self) -> &HashMap<Endpoint, EndpointHealth> {
        &self.endpoint_health
    }
}

impl Drop for SnapshotPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Fetches every endpoint in parallel plus the auxiliary probe. Each request
/// is bounded by `timeout`; a timeout is reported like any other failure.
pub async fn run_pull_cycle(
    source: &dyn SnapshotSource,
    ticket: PullTicket,
    timeout: Duration,
) -> PullCycleReport {
    let fetches = Endpoint::ALL.into_iter().map(|endpoint| async move {
        let result = match tokio::time::timeout(timeout, source.fetch(endpoint)).await {
            Ok(result) => result,
            Err(_) => Err(DashError::Timeout {
                endpoint: endpoint.name().to_string(),
                timeout,
            }),
        };
        (endpoint, result)
    });
    let probe = async {
        tokio::time::timeout(timeout, source.probe_auxiliary())
            .await
            .unwrap_or(false)
    };

    let (results, auxiliary_ok) = tokio::join!(join_all(fetches), probe);

    PullCycleReport {
        ticket,
        results,
        auxiliary_ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use crate::errors::DashResult;
    use crate::types::LogEntry;

    struct StubSource {
        failing: Vec<Endpoint>,
        slow: Vec<Endpoint>,
    }

    #[async_trait]
    impl SnapshotSource for StubSource {
        async fn fetch(&self, endpoint: Endpoint) -> DashResult<Value> {
            if self.slow.contains(&endpoint) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing.contains(&endpoint) {
                return Err(DashError::PartialFetch {
                    endpoint: endpoint.name().to_string(),
                    status: Some(500),
                    message: "boom".to_string(),
                });
            }
            Ok(json!({"endpoint": endpoint.name()}))
        }

        async fn probe_auxiliary(&self) -> bool {
            true
        }

        async fn fetch_log_history(&self, _limit: usize) -> DashResult<Vec<LogEntry>> {
            Ok(Vec::new())
        }
    }

    fn ticket() -> PullTicket {
        PullTicket {
            cycle: 1,
            epoch: 1,
            started_at: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn slow_endpoint_times_out_without_blocking_others() {
        let source = StubSource { failing: vec![], slow: vec![Endpoint::History] };
        let report = run_pull_cycle(&source, ticket(), Duration::from_millis(20)).await;

        assert_eq!(report.results.len(), Endpoint::ALL.len());
        for (endpoint, result) in &report.results {
            if *endpoint == Endpoint::History {
                assert!(matches!(result, Err(DashError::Timeout { .. })));
            } else {
                assert!(result.is_ok(), "{} should succeed", endpoint);
            }
        }
        assert!(report.auxiliary_ok);
    }

    #[tokio::test]
    async fn optional_failures_keep_mandatory_health() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let source = Arc::new(StubSource { failing: vec![Endpoint::History, Endpoint::BotStatus], slow: vec![] });
        let mut poller = SnapshotPoller::new(source.clone(), tx, Duration::from_secs(1));

        let report = run_pull_cycle(source.as_ref(), ticket(), Duration::from_secs(1)).await;
        let summary = poller.record_cycle(&report);

        assert!(summary.mandatory_ok);
        assert_eq!(summary.failed_endpoints, 2);
        assert!(!poller.endpoint_health()[&Endpoint::History].reachable);
        assert!(poller.endpoint_health()[&Endpoint::Positions].reachable);
    }

    #[tokio::test]
    async fn mandatory_failure_degrades_cycle() {
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let source = Arc::new(StubSource { failing: vec![Endpoint::Transactions], slow: vec![] });
        let mut poller = SnapshotPoller::new(source.clone(), tx, Duration::from_secs(1));

        let report = run_pull_cycle(source.as_ref(), ticket(), Duration::from_secs(1)).await;
        assert!(!poller.record_cycle(&report).mandatory_ok);
    }

    #[tokio::test]
    async fn stop_invalidates_the_running_epoch() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let source = Arc::new(StubSource { failing: vec![], slow: vec![] });
        let mut poller = SnapshotPoller::new(source, tx, Duration::from_secs(1));

        poller.start(Duration::from_secs(3600));
        let running_epoch = poller.epoch();
        match rx.recv().await {
            Some(EngineEvent::Poll(PollerEvent::Tick { epoch })) => assert_eq!(epoch, running_epoch),
            other => panic!("expected an immediate tick, got {:?}", other),
        }

        poller.stop();
        assert!(!poller.is_running());
        assert!(!poller.is_current(running_epoch));
    }
}

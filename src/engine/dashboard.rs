//! Dashboard: single owner of all reconciled state
//!
//! The push transport, the poll timer and manual refreshes all feed one
//! event queue. Every mutation of the reconciler, activity feed and log
//! merger happens inside `handle_event`, one event at a time.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Level};
use crate::{
    activity::ActivityFeed,
    config::Config,
    connection::{ConnectionSupervisor, DispatchTable, PushTransport, RoutedMessage, SupervisorOutput},
    errors::{DashError, ErrorRecovery, RecoveryAction},
    health::HealthAggregator,
    logs::{LogEvent, LogFilter, LogStreamMerger, MergerState},
    poller::{decode_log_batch, Endpoint, EndpointHealth, PollerEvent, PullCycleReport, PullTicket, SnapshotPoller, SnapshotSource},
    reconciler::{ApplyOutcome, StateReconciler},
    types::{
        ActivityEntry, ConnectionNotice, ConnectionState, EntitySnapshot, HealthStatus, LogEntry,
        Revision, StreamId, StreamValue, UpdateOrigin,
    },
    utils::SubscriptionId,
};
use super::{DashboardHandle, EngineEvent, EventReceiver, EventSender, SessionStats};

pub struct Dashboard {
    config: Config,
    supervisor: ConnectionSupervisor,
    poller: SnapshotPoller,
    reconciler: StateReconciler,
    activity: ActivityFeed,
    logs: LogStreamMerger,
    health: HealthAggregator,
    recovery: ErrorRecovery,
    stats: SessionStats,
    events_tx: EventSender,
    events_rx: EventReceiver,
    running: bool,
}

impl Dashboard {
    pub fn new(config: Config, transport: Arc<dyn PushTransport>, source: Arc<dyn SnapshotSource>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            supervisor: ConnectionSupervisor::new(transport, DispatchTable::standard()),
            poller: SnapshotPoller::new(source, events_tx.clone(), config.request_timeout()),
            reconciler: StateReconciler::new(),
            activity: ActivityFeed::new(config.activity_capacity),
            logs: LogStreamMerger::new(config.log_capacity),
            health: HealthAggregator::new(),
            recovery: ErrorRecovery::new(),
            stats: SessionStats::default(),
            events_tx,
            events_rx,
            running: false,
            config,
        }
    }

    pub fn handle(&self) -> DashboardHandle {
        DashboardHandle::new(self.events_tx.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Opens the push channel, starts polling and requests the log backlog.
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;

        info!("🚀 Starting dashboard sync");
        self.supervisor.connect(self.events_tx.clone());
        self.poller.start(self.config.poll_interval());
        self.poller.fetch_log_history(self.config.log_capacity);
    }

    /// Nothing reaches the reconciler from work issued before this call.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        self.poller.stop();
        if let Some(output) = self.supervisor.close() {
            self.apply_supervisor_output(output);
        }
        info!("⏹️  Dashboard sync stopped");
    }

    /// Runs until a shutdown request arrives.
    pub async fn run(&mut self) {
        self.start();

        while let Some(event) = self.events_rx.recv().await {
            if matches!(event, EngineEvent::Shutdown) {
                info!("📛 Shutdown requested");
                break;
            }
            self.handle_event(event);
        }

        self.stop();
    }

    /// Applies whatever is already queued, without waiting.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Transport { session, event } => {
                if let Some(output) = self.supervisor.handle(session, event) {
                    self.apply_supervisor_output(output);
                }
            }
            EngineEvent::Poll(PollerEvent::Tick { epoch }) => {
                if self.poller.is_current(epoch) {
                    self.begin_pull_cycle();
                }
            }
            EngineEvent::Poll(PollerEvent::CycleCompleted(report)) => {
                if self.poller.is_current(report.ticket.epoch) {
                    self.apply_pull_report(report);
                } else {
                    self.stats.pull_cycles_ignored += 1;
                    debug!(cycle = report.ticket.cycle, "Ignoring pull cycle completed after stop");
                }
            }
            EngineEvent::Poll(PollerEvent::LogHistory { epoch, result }) => {
                if !self.poller.is_current(epoch) {
                    return;
                }
                match result {
                    Ok(entries) => {
                        self.logs.apply_snapshot(entries);
                    }
                    Err(e) => {
                        self.logs.snapshot_failed(&e.to_string());
                        self.report(e);
                    }
                }
            }
            EngineEvent::Refresh => self.refresh(),
            EngineEvent::Shutdown => self.stop(),
        }
    }

    /// Out-of-band pull cycle. Ignored while stopped.
    pub fn refresh(&mut self) {
        if !self.running {
            debug!("Ignoring refresh while stopped");
            return;
        }
        info!("🔃 Manual refresh");
        self.begin_pull_cycle();
    }

    /// Captures the current revisions and issues a pull cycle against them.
    pub fn begin_pull_cycle(&mut self) -> PullTicket {
        self.stats.pull_cycles_started += 1;
        self.poller.launch_cycle(self.reconciler.revisions())
    }

    pub fn apply_pull_report(&mut self, report: PullCycleReport) {
        let summary = self.poller.record_cycle(&report);
        let PullCycleReport { ticket, results, auxiliary_ok } = report;

        for (endpoint, result) in results {
            match result {
                Ok(payload) => self.apply_pulled(endpoint, &payload, ticket.started_at(endpoint.stream())),
                Err(e) => self.report(e),
            }
        }

        self.health.set_data_api(summary.mandatory_ok);
        self.health.set_auxiliary(auxiliary_ok);
        self.stats.pull_cycles_applied += 1;

        debug!(
            cycle = ticket.cycle,
            mandatory_ok = summary.mandatory_ok,
            failed = summary.failed_endpoints,
            "Pull cycle applied"
        );
    }

    fn apply_pulled(&mut self, endpoint: Endpoint, payload: &Value, started_at: Revision) {
        match self.reconciler.apply(endpoint.stream(), payload, UpdateOrigin::Pull { started_at }) {
            Ok(ApplyOutcome::Accepted { .. }) => self.stats.updates_accepted += 1,
            Ok(ApplyOutcome::Stale { .. }) => self.stats.stale_pulls_discarded += 1,
            Err(e) => {
                self.stats.malformed_payloads += 1;
                self.poller.record_malformed(endpoint, &e);
                self.report(e);
            }
        }
    }

    fn apply_supervisor_output(&mut self, output: SupervisorOutput) {
        match output {
            SupervisorOutput::StateChanged(state) => {
                self.health.set_push(state.is_up());
            }
            SupervisorOutput::Routed(message) => {
                self.stats.push_messages += 1;
                self.route(message);
            }
            SupervisorOutput::Rejected(e) => {
                self.stats.push_messages += 1;
                self.stats.dropped_messages += 1;
                self.report(e);
            }
        }
    }

    fn route(&mut self, message: RoutedMessage) {
        match message {
            RoutedMessage::Stream { stream, payload } => {
                match self.reconciler.apply(stream, &payload, UpdateOrigin::Push) {
                    Ok(_) => self.stats.updates_accepted += 1,
                    Err(e) => {
                        self.stats.malformed_payloads += 1;
                        self.stats.dropped_messages += 1;
                        self.report(e);
                    }
                }
            }
            RoutedMessage::Activity { kind, payload } => {
                self.activity.record_event(kind, payload);
                self.stats.activity_recorded += 1;
            }
            RoutedMessage::LiveLog(payload) => match serde_json::from_value::<LogEntry>(payload) {
                Ok(entry) => {
                    self.stats.log_entries_received += 1;
                    self.logs.push_live(entry);
                }
                Err(e) => {
                    self.stats.dropped_messages += 1;
                    self.report(DashError::malformed("log", e));
                }
            },
            RoutedMessage::LogSnapshot(payload) => match decode_log_batch(&payload) {
                Ok(entries) => {
                    self.stats.log_entries_received += entries.len() as u64;
                    self.logs.apply_snapshot(entries);
                }
                // A bad frame is not a failed history request; keep waiting.
                Err(e) => {
                    self.stats.dropped_messages += 1;
                    self.report(e);
                }
            },
        }
    }

    /// Every failure ends here; none of them leave the engine.
    fn report(&mut self, error: DashError) {
        match self.recovery.handle_error(&error) {
            RecoveryAction::AwaitReconnect { occurrences } => {
                warn!(occurrences, "Push channel error, waiting for reconnect: {}", error);
            }
            RecoveryAction::RetainPrevious { log_level, occurrences } => {
                log_at(log_level, occurrences, "keeping previous snapshot", &error);
            }
            RecoveryAction::Drop { log_level, occurrences } => {
                log_at(log_level, occurrences, "dropped", &error);
            }
        }
    }

    // Read views

    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    pub fn value(&self, stream: StreamId) -> Option<&StreamValue> {
        self.reconciler.value(stream)
    }

    pub fn snapshot(&self, stream: StreamId) -> Option<&EntitySnapshot<StreamValue>> {
        self.reconciler.snapshot(stream)
    }

    pub fn revision(&self, stream: StreamId) -> Revision {
        self.reconciler.revision(stream)
    }

    /// Newest first.
    pub fn activity(&self) -> impl Iterator<Item = &ActivityEntry> + '_ {
        self.activity.entries()
    }

    /// Arrival order.
    pub fn logs(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.logs.entries()
    }

    pub fn filtered_logs<'a>(&'a self, filter: &'a LogFilter) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.logs.filtered(filter)
    }

    pub fn logs_for_scope<'a>(&'a self, scope_id: &'a str) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.logs.for_scope(scope_id)
    }

    pub fn log_state(&self) -> MergerState {
        self.logs.state()
    }

    pub fn health(&self) -> HealthStatus {
        self.health.status()
    }

    pub fn endpoint_health(&self) -> &HashMap<Endpoint, EndpointHealth> {
        self.poller.endpoint_health()
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn error_counts(&self) -> &HashMap<String, u32> {
        &self.recovery.error_counts
    }

    // Subscriptions

    pub fn on_stream_update<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&EntitySnapshot<StreamValue>) + Send + 'static,
    {
        self.reconciler.subscribe(callback)
    }

    pub fn on_stream<F>(&mut self, stream: StreamId, callback: F) -> SubscriptionId
    where
        F: FnMut(&EntitySnapshot<StreamValue>) + Send + 'static,
    {
        self.reconciler.subscribe_stream(stream, callback)
    }

    pub fn off_stream(&mut self, id: SubscriptionId) -> bool {
        self.reconciler.unsubscribe(id)
    }

    /// Malformed stream payloads rejected by the reconciler.
    pub fn on_error<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&DashError) + Send + 'static,
    {
        self.reconciler.subscribe_errors(callback)
    }

    pub fn on_activity<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ActivityEntry) + Send + 'static,
    {
        self.activity.subscribe(callback)
    }

    pub fn on_log<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&LogEvent) + Send + 'static,
    {
        self.logs.subscribe(callback)
    }

    pub fn on_health<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&HealthStatus) + Send + 'static,
    {
        self.health.subscribe(callback)
    }

    pub fn on_connection_notice<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ConnectionNotice) + Send + 'static,
    {
        self.supervisor.subscribe_notices(callback)
    }
}

fn log_at(level: Level, occurrences: u32, action: &str, error: &DashError) {
    match level {
        Level::ERROR => error!(occurrences, "{} ({})", error, action),
        Level::WARN => warn!(occurrences, "{} ({})", error, action),
        Level::INFO => info!(occurrences, "{} ({})", error, action),
        _ => debug!(occurrences, "{} ({})", error, action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::task::JoinHandle;
    use crate::errors::DashResult;
    use crate::types::{ServiceHealth, Source, TransportEvent};

    struct IdleTransport;

    impl PushTransport for IdleTransport {
        fn start(&self, _session: u64, _events: EventSender) -> JoinHandle<()> {
            tokio::spawn(std::future::pending::<()>())
        }
    }

    struct PendingSource;

    #[async_trait]
    impl SnapshotSource for PendingSource {
        async fn fetch(&self, _endpoint: Endpoint) -> DashResult<Value> {
            std::future::pending().await
        }

        async fn probe_auxiliary(&self) -> bool {
            std::future::pending().await
        }

        async fn fetch_log_history(&self, _limit: usize) -> DashResult<Vec<LogEntry>> {
            std::future::pending().await
        }
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(Config::default(), Arc::new(IdleTransport), Arc::new(PendingSource))
    }

    fn push(dashboard: &mut Dashboard, raw: serde_json::Value) {
        let session = dashboard.supervisor.session();
        dashboard.handle_event(EngineEvent::Transport {
            session,
            event: TransportEvent::Message(raw.to_string()),
        });
    }

    fn open(dashboard: &mut Dashboard) {
        let session = dashboard.supervisor.session();
        dashboard.handle_event(EngineEvent::Transport { session, event: TransportEvent::Open });
    }

    fn log_line(seq: u32) -> Value {
        json!({
            "timestamp": format!("2026-10-17T08:00:{:02}Z", seq),
            "level": "info",
            "category": "engine",
            "message": format!("event {}", seq),
        })
    }

    fn metrics(total_trades: u64) -> Value {
        json!({"totalTrades": total_trades, "totalProfitUsd": "12.5"})
    }

    #[tokio::test]
    async fn push_updates_flow_into_the_reconciler() {
        let mut dashboard = dashboard();
        dashboard.start();
        open(&mut dashboard);

        push(&mut dashboard, json!({"type": "metrics", "data": metrics(4)}));

        let snapshot = dashboard.snapshot(StreamId::Metrics).unwrap();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(snapshot.source, Source::Push);
        assert_eq!(dashboard.stats().updates_accepted, 1);
        assert_eq!(dashboard.health().push_channel, ServiceHealth::Ok);
    }

    #[tokio::test]
    async fn unknown_and_malformed_messages_are_dropped() {
        let mut dashboard = dashboard();
        dashboard.start();
        open(&mut dashboard);

        push(&mut dashboard, json!({"type": "mystery", "data": {}}));
        push(&mut dashboard, json!({"type": "metrics", "data": {"totalTrades": "many"}}));

        assert!(dashboard.value(StreamId::Metrics).is_none());
        assert_eq!(dashboard.stats().dropped_messages, 2);
        assert_eq!(dashboard.error_counts().get("unknown_message"), Some(&1));
        assert_eq!(dashboard.error_counts().get("malformed_payload"), Some(&1));
    }

    #[tokio::test]
    async fn malformed_pull_payload_keeps_endpoint_reachable() {
        let mut dashboard = dashboard();
        dashboard.start();
        let ticket = dashboard.begin_pull_cycle();

        let results: Vec<(Endpoint, DashResult<Value>)> = vec![
            (Endpoint::Positions, Ok(json!([]))),
            (Endpoint::Metrics, Ok(json!({"unexpected": true}))),
        ];

        dashboard.handle_event(EngineEvent::Poll(PollerEvent::CycleCompleted(PullCycleReport {
            ticket,
            results,
            auxiliary_ok: true,
        })));

        let metrics_health = &dashboard.endpoint_health()[&Endpoint::Metrics];
        assert!(metrics_health.reachable);
        assert!(metrics_health.last_error.is_some());
        assert!(dashboard.value(StreamId::Metrics).is_none());
        assert_eq!(dashboard.stats().malformed_payloads, 1);
    }

    #[tokio::test]
    async fn completions_after_stop_are_ignored() {
        let mut dashboard = dashboard();
        dashboard.start();
        let ticket = dashboard.begin_pull_cycle();
        dashboard.stop();

        dashboard.handle_event(EngineEvent::Poll(PollerEvent::CycleCompleted(PullCycleReport {
            ticket,
            results: vec![(Endpoint::Metrics, Ok(metrics(9)))],
            auxiliary_ok: true,
        })));

        assert!(dashboard.value(StreamId::Metrics).is_none());
        assert_eq!(dashboard.stats().pull_cycles_ignored, 1);
        assert_eq!(dashboard.connection_state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn push_initial_logs_seed_once_and_pull_history_is_ignored() {
        let mut dashboard = dashboard();
        dashboard.start();
        let entry = json!({"timestamp": "2026-10-17T08:00:00Z", "level": "info", "category": "engine", "message": "boot"});
        open(&mut dashboard);

        push(&mut dashboard, json!({"type": "initialLogs", "data": [entry.clone()]}));
        assert_eq!(dashboard.log_state(), MergerState::Live);

        let epoch = dashboard.poller.epoch();
        let late: Vec<LogEntry> = vec![serde_json::from_value(entry).unwrap()];
        dashboard.handle_event(EngineEvent::Poll(PollerEvent::LogHistory { epoch, result: Ok(late) }));

        assert_eq!(dashboard.logs().count(), 1);
    }

    #[tokio::test]
    async fn malformed_initial_logs_leave_room_for_pull_history() {
        let mut dashboard = dashboard();
        dashboard.start();
        open(&mut dashboard);

        push(&mut dashboard, json!({"type": "initialLogs", "data": {"unexpected": 1}}));
        assert_eq!(dashboard.log_state(), MergerState::AwaitingSnapshot);
        assert_eq!(dashboard.stats().dropped_messages, 1);

        let epoch = dashboard.poller.epoch();
        let history: Vec<LogEntry> = vec![serde_json::from_value(log_line(1)).unwrap()];
        dashboard.handle_event(EngineEvent::Poll(PollerEvent::LogHistory { epoch, result: Ok(history) }));

        assert_eq!(dashboard.log_state(), MergerState::Live);
        assert_eq!(dashboard.logs().count(), 1);
    }

    #[tokio::test]
    async fn failed_history_fetch_goes_live_keeping_pending_entries() {
        let mut dashboard = dashboard();
        dashboard.start();
        open(&mut dashboard);

        push(&mut dashboard, json!({"type": "log", "data": log_line(7)}));
        assert_eq!(dashboard.log_state(), MergerState::AwaitingSnapshot);

        let epoch = dashboard.poller.epoch();
        dashboard.handle_event(EngineEvent::Poll(PollerEvent::LogHistory {
            epoch,
            result: Err(DashError::PartialFetch {
                endpoint: "logs".to_string(),
                status: Some(503),
                message: "HTTP 503".to_string(),
            }),
        }));
        push(&mut dashboard, json!({"type": "log", "data": log_line(8)}));

        assert_eq!(dashboard.log_state(), MergerState::Live);
        let messages: Vec<String> = dashboard.logs().map(|e| e.message.clone()).collect();
        assert_eq!(messages, vec!["event 7", "event 8"]);
        assert_eq!(dashboard.error_counts().get("fetch_failure"), Some(&1));
    }

    #[tokio::test]
    async fn unsubscribed_stream_listeners_stop_hearing_updates() {
        let mut dashboard = dashboard();
        dashboard.start();
        open(&mut dashboard);

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = dashboard.on_stream(StreamId::Metrics, move |snapshot| sink.lock().unwrap().push(snapshot.revision));

        push(&mut dashboard, json!({"type": "metrics", "data": metrics(1)}));
        assert!(dashboard.off_stream(id));
        push(&mut dashboard, json!({"type": "metrics", "data": metrics(2)}));

        assert_eq!(*seen.lock().unwrap(), vec![1]);
        assert_eq!(dashboard.revision(StreamId::Metrics), 2);
        assert!(!dashboard.off_stream(id));
    }

    #[tokio::test]
    async fn refresh_is_ignored_while_stopped() {
        let mut dashboard = dashboard();
        dashboard.handle_event(EngineEvent::Refresh);
        assert_eq!(dashboard.stats().pull_cycles_started, 0);

        dashboard.start();
        dashboard.handle_event(EngineEvent::Refresh);
        assert_eq!(dashboard.stats().pull_cycles_started, 1);
    }
}

#![allow(dead_code)]

use aero_dash_sync::connection::PushTransport;
use aero_dash_sync::engine::{EngineEvent, EventSender};
use aero_dash_sync::errors::{DashError, DashResult};
use aero_dash_sync::poller::{Endpoint, SnapshotSource};
use aero_dash_sync::{Config, Dashboard, LogEntry, TransportEvent};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Hands the engine's sender to the test so it can play the server.
#[derive(Default)]
pub struct ScriptedTransport {
    channel: Mutex<Option<(u64, EventSender)>>,
}

impl ScriptedTransport {
    pub fn emit(&self, event: TransportEvent) {
        let guard = self.channel.lock().unwrap();
        let (session, events) = guard.as_ref().expect("transport not started");
        events
            .send(EngineEvent::Transport { session: *session, event })
            .unwrap();
    }

    pub fn push(&self, kind: &str, data: Value) {
        self.emit(TransportEvent::Message(json!({"type": kind, "data": data}).to_string()));
    }
}

impl PushTransport for ScriptedTransport {
    fn start(&self, session: u64, events: EventSender) -> JoinHandle<()> {
        *self.channel.lock().unwrap() = Some((session, events));
        tokio::spawn(async {})
    }
}

/// Canned responses per endpoint; anything missing fails with HTTP 500.
#[derive(Default)]
pub struct CannedSource {
    pub responses: Mutex<HashMap<Endpoint, Value>>,
    pub auxiliary_ok: bool,
}

impl CannedSource {
    pub fn with(responses: Vec<(Endpoint, Value)>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            auxiliary_ok: true,
        }
    }
}

#[async_trait]
impl SnapshotSource for CannedSource {
    async fn fetch(&self, endpoint: Endpoint) -> DashResult<Value> {
        let response = self.responses.lock().unwrap().get(&endpoint).cloned();
        response.ok_or_else(|| DashError::PartialFetch {
            endpoint: endpoint.name().to_string(),
            status: Some(500),
            message: "HTTP 500".to_string(),
        })
    }

    async fn probe_auxiliary(&self) -> bool {
        self.auxiliary_ok
    }

    async fn fetch_log_history(&self, _limit: usize) -> DashResult<Vec<LogEntry>> {
        std::future::pending().await
    }
}

pub fn position(id: &str) -> Value {
    json!({"id": id, "pool": "WETH/USDC", "amount": "1.5", "entryPrice": "2450.10"})
}

pub fn positions(count: usize) -> Value {
    Value::Array((1..=count).map(|i| position(&format!("p{}", i))).collect())
}

pub fn log_entry(seq: u32, scope: &str) -> Value {
    json!({
        "timestamp": format!("2026-10-17T08:{:02}:{:02}Z", seq / 60, seq % 60),
        "level": "info",
        "botId": scope,
        "category": "engine",
        "message": format!("event {}", seq),
    })
}

pub fn mandatory_ok_responses() -> Vec<(Endpoint, Value)> {
    vec![
        (Endpoint::Positions, positions(1)),
        (Endpoint::Status, json!({"totalBalanceUsd": "1000"})),
        (Endpoint::Metrics, json!({"totalTrades": 3, "totalProfitUsd": "12.5"})),
        (Endpoint::Transactions, json!([])),
    ]
}

pub fn dashboard(source: Arc<CannedSource>) -> (Dashboard, Arc<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::default());
    let dashboard = Dashboard::new(Config::default(), transport.clone(), source);
    (dashboard, transport)
}

//! Aerodrome Dashboard Sync - live state reconciliation for the bot dashboard
//!
//! Merges a WebSocket push channel and periodic HTTP pull cycles into one
//! revision-ordered view of positions, account status, metrics and profit
//! history, alongside a bounded activity feed, a merged log stream and a
//! derived three-way health record.

pub mod config;
pub mod types;
pub mod errors;
pub mod utils;
pub mod network;
pub mod connection;
pub mod poller;
pub mod reconciler;
pub mod activity;
pub mod logs;
pub mod health;
pub mod engine;

// Re-export commonly used items
pub use config::{Config, CONFIG};
pub use errors::{DashError, DashResult};
pub use types::*;
pub use engine::{Dashboard, DashboardHandle};

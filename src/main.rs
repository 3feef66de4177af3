//! Aerodrome Dashboard Sync - Main Entry Point
//!
//! Connects to the bot backend and keeps a reconciled live view, printing
//! health changes, activity and logs as they arrive.

use aero_dash_sync::*;
use anyhow::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use aero_dash_sync::logs::{LogEvent, LogFilter};
use aero_dash_sync::network::{HttpSnapshotSource, WsTransport};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize logging
    let _logging_guard = utils::setup_logging()?;

    // Load configuration
    let config = CONFIG.clone();

    info!("🛩️  Aerodrome Dashboard Sync v0.5.0");
    info!("📋 Configuration:");
    info!("   Data API: {}", config.api_base_url);
    info!("   Push Channel: {}", config.ws_url);
    info!("   Auxiliary Health: {}", config.aux_health_url);
    info!("   Poll Interval: {}ms", config.poll_interval_ms);
    info!("   Request Timeout: {}ms", config.request_timeout_ms);
    info!("   Log Capacity: {}", config.log_capacity);
    if let Some(scope) = &config.log_scope {
        info!("   Log Scope: {}", scope);
    }

    let source = Arc::new(HttpSnapshotSource::from_config(&config)?);
    let transport = Arc::new(WsTransport::from_config(&config)?);
    let log_filter = config.log_scope.clone().map(LogFilter::scope);

    let mut dashboard = Dashboard::new(config, transport, source);

    dashboard.on_health(utils::print_health);
    dashboard.on_activity(utils::print_activity_entry);
    dashboard.on_connection_notice(utils::print_connection_notice);
    dashboard.on_stream_update(|snapshot| {
        info!(
            "📈 {} updated (revision {}, via {:?})",
            snapshot.value.stream(),
            snapshot.revision,
            snapshot.source
        );
    });
    dashboard.on_log(move |event| match event {
        LogEvent::Appended(entry) => {
            if log_filter.as_ref().is_none_or(|filter| filter.matches(entry)) {
                utils::print_log_entry(entry);
            }
        }
        LogEvent::Seeded { entries, suppressed } => {
            info!("📜 Log backlog ready: {} entries ({} overlaps removed)", entries, suppressed);
        }
    });

    // Setup shutdown handler
    let handle = dashboard.handle();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("\n📛 Received shutdown signal (Ctrl+C)...");
        handle.shutdown();
    });

    let start_time = Instant::now();
    info!("\n🚀 Starting live sync...\n");
    dashboard.run().await;

    utils::print_session_stats(
        start_time,
        dashboard.stats(),
        dashboard.error_counts(),
        &dashboard.health(),
    );
    info!("👋 Dashboard sync shut down cleanly");

    Ok(())
}

//! Display and printing utilities

use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};
use crate::{
    engine::SessionStats,
    types::{ActivityEntry, ActivityKind, ConnectionNotice, HealthStatus, LogEntry, LogLevel, ServiceHealth},
};

pub fn print_session_stats(
    start_time: Instant,
    stats: &SessionStats,
    error_counts: &HashMap<String, u32>,
    health: &HealthStatus,
) {
    let runtime = start_time.elapsed().as_secs() / 60;

    info!("\n📊 Session Statistics ({} minutes)", runtime);
    info!("   📡 PUSH CHANNEL:");
    info!("     Messages received: {}", stats.push_messages);
    info!("     Dropped (unknown/malformed): {}", stats.dropped_messages);

    info!("   🔄 PULL CYCLES:");
    info!("     Started: {}", stats.pull_cycles_started);
    info!("     Applied: {}", stats.pull_cycles_applied);
    info!("     Ignored after stop: {}", stats.pull_cycles_ignored);
    info!("     Stale results discarded: {}", stats.stale_pulls_discarded);

    info!("   🧮 RECONCILER:");
    info!("     Updates accepted: {}", stats.updates_accepted);
    info!("     Malformed payloads: {}", stats.malformed_payloads);
    info!("     Acceptance rate: {:.1}%", acceptance_rate(stats));

    info!("   📜 FEEDS:");
    info!("     Activity entries: {}", stats.activity_recorded);
    info!("     Log entries: {}", stats.log_entries_received);

    info!("   ⚙️  SYSTEM:");
    info!("     Health: {}", health_line(health));

    if !error_counts.is_empty() {
        info!("     Error summary:");
        for (error_type, count) in error_counts.iter() {
            info!("       {}: {}", error_type, count);
        }
    }

    info!("");
}

fn acceptance_rate(stats: &SessionStats) -> f64 {
    let attempted = stats.updates_accepted + stats.stale_pulls_discarded + stats.malformed_payloads;
    if attempted > 0 {
        (stats.updates_accepted as f64 / attempted as f64) * 100.0
    } else {
        0.0
    }
}

fn badge(health: ServiceHealth) -> &'static str {
    match health {
        ServiceHealth::Ok => "🟢 ok",
        ServiceHealth::Down => "🔴 down",
    }
}

pub fn health_line(health: &HealthStatus) -> String {
    format!(
        "data API {} | push {} | auxiliary {}",
        badge(health.data_api),
        badge(health.push_channel),
        badge(health.auxiliary_service)
    )
}

pub fn print_health(health: &HealthStatus) {
    if health.data_api.is_ok() && health.push_channel.is_ok() {
        info!("🩺 {}", health_line(health));
    } else {
        warn!("🩺 {}", health_line(health));
    }
}

pub fn print_activity_entry(entry: &ActivityEntry) {
    let icon = match entry.kind {
        ActivityKind::TradeExecuted => "💱",
        ActivityKind::ProfitTargetHit => "🎯",
        ActivityKind::StopLossHit => "🛑",
        ActivityKind::ArbitrageFill => "⚡",
        ActivityKind::LiquidityEnter => "📥",
        ActivityKind::LiquidityExit => "📤",
        ActivityKind::Error => "❌",
        ActivityKind::Status => "ℹ️ ",
    };
    match entry.kind {
        ActivityKind::Error => error!("{} #{} {}", icon, entry.id, entry.message),
        _ => info!("{} #{} {}", icon, entry.id, entry.message),
    }
}

pub fn print_log_entry(entry: &LogEntry) {
    let scope = entry.scope_id.as_deref().unwrap_or("-");
    match entry.level {
        LogLevel::Error => error!("[{}] {} {}: {}", scope, entry.timestamp.format("%H:%M:%S"), entry.category, entry.message),
        LogLevel::Warning => warn!("[{}] {} {}: {}", scope, entry.timestamp.format("%H:%M:%S"), entry.category, entry.message),
        _ => info!("[{}] {} {}: {}", scope, entry.timestamp.format("%H:%M:%S"), entry.category, entry.message),
    }
}

pub fn print_connection_notice(notice: &ConnectionNotice) {
    match notice {
        ConnectionNotice::Connected => info!("✅ Live updates connected"),
        ConnectionNotice::Disconnected { reason } => warn!(
            "🔌 Live updates disconnected ({}), reconnecting...",
            reason.as_deref().unwrap_or("no reason given")
        ),
    }
}

//! Logging setup: console plus hourly rolling file

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_DIR: &str = "output/logs";
pub const LOG_FILE_PREFIX: &str = "aero-dash-sync.log";

/// Keeps the non-blocking file writer flushing until dropped.
pub struct LoggingGuard {
    pub _guard: tracing_appender::non_blocking::WorkerGuard,
}

pub fn setup_logging() -> Result<Arc<LoggingGuard>> {
    std::fs::create_dir_all(LOG_DIR)?;

    let file_appender = tracing_appender::rolling::hourly(LOG_DIR, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_ansi(true)
        .with_level(true);
    let file = fmt::layer()
        .with_writer(file_writer)
        .with_target(true)
        .with_ansi(false)
        .compact();
    let filter = EnvFilter::from_default_env().add_directive("info".parse()?);

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .with(filter)
        .init();

    Ok(Arc::new(LoggingGuard { _guard: guard }))
}

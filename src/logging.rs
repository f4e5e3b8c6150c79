//! Tracing setup for the driver binary.
//!
//! Logs go to a daily-rolled file when a directory is given (the console is
//! busy with the REPL), otherwise to stderr.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::consts::DEFAULT_LOG_FILTER;

/// Keeps the file writer flushing; drop it last.
pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber. `filter` wins over `RUST_LOG`.
pub fn init(filter: Option<&str>, log_dir: Option<&Path>) -> Result<LoggingGuard> {
    let env_filter = match filter {
        Some(filter) => EnvFilter::try_new(filter)
            .with_context(|| format!("invalid log filter {filter:?}"))?,
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };

    let guard = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log dir {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "waypoint.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
                .try_init()
                .context("tracing already initialized")?;
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .try_init()
                .context("tracing already initialized")?;
            None
        }
    };

    tracing::debug!(to_file = log_dir.is_some(), "tracing initialized");
    Ok(LoggingGuard { _guard: guard })
}

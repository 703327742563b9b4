//! Tracing subscriber setup. While the terminal UI owns the screen, events
//! go to a log file through a non-blocking writer; otherwise to stderr.

use std::fs::OpenOptions;

use anyhow::{anyhow, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// `LogConfig::file`, appended to
    File,
}

/// `RUST_LOG` when set, else the configured level
pub fn env_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level {level:?}")),
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init_logging(config: &LogConfig, target: LogTarget) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(&config.level)?;

    match target {
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow!(e))?;
            Ok(None)
        }
        LogTarget::File => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.file)
                .with_context(|| format!("Failed to open log file {}", config.file.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!(e))?;
            Ok(Some(guard))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_filters_parse() {
        // RUST_LOG may be set by the test environment; only check the fallback path
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(env_filter("desiertos=debug,warn").is_ok());
            assert!(env_filter("desiertos=loudest").is_err());
        }
    }
}

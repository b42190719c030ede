//! Structured logging setup
//!
//! The terminal belongs to the UI while dbnav runs, so log output only ever
//! goes to a file. Without a configured file, no subscriber is installed and
//! `tracing` macros are no-ops.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the computed filter directive
pub const LOG_FILTER_ENV: &str = "DBNAV_LOG";

#[derive(
    Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub file: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to open log file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to configure logger: {0}")]
    Configure(String),
}

static GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber. Calling it again is a no-op.
pub fn init(config: &LogConfig) -> Result<(), InitError> {
    if GUARD.get().is_some() {
        return Ok(());
    }
    let Some(path) = &config.file else {
        return Ok(());
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| InitError::Io {
            path: path.clone(),
            source,
        })?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(config.level))
        .with_level(true)
        .with_target(config.level >= LogLevel::Debug)
        .with_thread_ids(config.level >= LogLevel::Trace)
        .with_ansi(false)
        .with_writer(writer)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| InitError::Configure(err.to_string()))?;

    let _ = GUARD.set(guard);
    Ok(())
}

fn build_env_filter(level: LogLevel) -> EnvFilter {
    if let Ok(filter) = std::env::var(LOG_FILTER_ENV) {
        return EnvFilter::new(filter);
    }
    EnvFilter::new(default_directive(level.to_filter()))
}

/// Our crate at the requested level; noisy dependencies capped at info
fn default_directive(level: LevelFilter) -> String {
    match level {
        LevelFilter::TRACE => "info,dbnav=trace,tokio_postgres=info,rustls=info".to_string(),
        LevelFilter::DEBUG => "info,dbnav=debug".to_string(),
        other => other.to_string().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Trace > LogLevel::Debug);
        assert!(LogLevel::Error < LogLevel::Warn);
    }

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(LevelFilter::WARN), "warn");
        assert_eq!(default_directive(LevelFilter::DEBUG), "info,dbnav=debug");
        assert!(default_directive(LevelFilter::TRACE).contains("dbnav=trace"));
    }

    #[test]
    fn test_init_without_file_is_noop() {
        assert!(init(&LogConfig::default()).is_ok());
    }
}

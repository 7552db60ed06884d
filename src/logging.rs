//! Structured logging configuration and utilities
//!
//! This module provides logging infrastructure with:
//! - Environment-based log level configuration
//! - Structured JSON logging for production
//! - Human-readable console logging for development
//! - Optional daily-rolling log files

use anyhow::Result;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::error::LibraryError;

/// Logging configuration for different environments
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level or filter directive (e.g. "info", "promptrepo=debug")
    pub level: String,
    pub format: LogFormat,
    /// Log file directory (None for stderr only)
    pub file_dir: Option<PathBuf>,
    pub colored: bool,
    /// Include source file and line
    pub with_location: bool,
    /// Emit span open/close events
    pub with_spans: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "error".to_string(),
            format: LogFormat::Pretty,
            file_dir: None,
            colored: is_terminal::IsTerminal::is_terminal(&std::io::stderr()),
            with_location: false,
            with_spans: false,
        }
    }
}

impl LogConfig {
    /// Create logging configuration from `PROMPTREPO_LOG_*` variables,
    /// falling back to `default_level` when no level is set.
    pub fn from_env_or(default_level: &str) -> Self {
        let level = env::var("PROMPTREPO_LOG_LEVEL")
            .or_else(|_| env::var("LOG_LEVEL"))
            .unwrap_or_else(|_| default_level.to_string());

        let format = match env::var("PROMPTREPO_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let file_dir = env::var("PROMPTREPO_LOG_DIR").ok().map(PathBuf::from);

        let colored = env::var("PROMPTREPO_LOG_COLOR")
            .map(|v| is_truthy(&v))
            .unwrap_or_else(|_| is_terminal::IsTerminal::is_terminal(&std::io::stderr()));

        let with_location = env::var("PROMPTREPO_LOG_LOCATION")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        let with_spans = env::var("PROMPTREPO_LOG_SPANS")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        Self {
            level,
            format,
            file_dir,
            colored,
            with_location,
            with_spans,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_or("error")
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// Initialize the global tracing subscriber.
///
/// When logging to files the returned guard must be held until exit, or
/// buffered lines are lost.
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_new("error"))
        .unwrap_or_else(|_| EnvFilter::new("error"));

    let span_events = if config.with_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let (writer, guard, ansi) = match &config.file_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("promptrepo")
                .filename_suffix("log")
                .build(dir)
                .map_err(|e| anyhow::anyhow!("Failed to open log directory {:?}: {}", dir, e))?;
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard), false)
        }
        None => (BoxMakeWriter::new(std::io::stderr), None, config.colored),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_ansi(ansi)
        .with_span_events(span_events)
        .with_file(config.with_location)
        .with_line_number(config.with_location);

    match config.format {
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize JSON logging: {}", e))?,
        LogFormat::Pretty => subscriber
            .pretty()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize pretty logging: {}", e))?,
        LogFormat::Compact => subscriber
            .compact()
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize compact logging: {}", e))?,
    }

    info!(
        level = %config.level,
        format = ?config.format,
        file_dir = ?config.file_dir,
        "Logging initialized"
    );

    Ok(guard)
}

/// Log a CLI command with timing and outcome
pub fn log_command_execution<T, E: Display>(
    command_name: &str,
    duration_ms: u64,
    result: &Result<T, E>,
) {
    let span = tracing::info_span!(
        "command_execution",
        command = command_name,
        duration_ms = duration_ms
    );
    let _enter = span.enter();

    match result {
        Ok(_) => info!(
            command = command_name,
            duration_ms = duration_ms,
            "Command completed successfully"
        ),
        Err(e) => warn!(
            command = command_name,
            duration_ms = duration_ms,
            error = %e,
            "Command failed"
        ),
    }
}

/// Log a library mutation for the audit trail.
///
/// Rejected requests (validation, not found, cycle) log at `info`; storage
/// failures at `error`.
pub fn log_library_operation(
    operation: &str,
    entity_id: Option<&str>,
    failure: Option<&LibraryError>,
    duration_ms: u64,
) {
    let span = tracing::info_span!(
        "library_operation",
        operation = operation,
        entity_id = entity_id,
        duration_ms = duration_ms
    );
    let _enter = span.enter();

    match failure {
        None => debug!(
            operation = operation,
            entity_id = entity_id,
            duration_ms = duration_ms,
            "Library operation completed"
        ),
        Some(e @ LibraryError::Storage(_)) => error!(
            operation = operation,
            entity_id = entity_id,
            error = %e,
            "Library operation failed"
        ),
        Some(e) => info!(
            operation = operation,
            entity_id = entity_id,
            kind = e.kind(),
            error = %e,
            "Library operation rejected"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;

    static INIT: Once = Once::new();

    fn init_test_logging() {
        INIT.call_once(|| {
            let config = LogConfig {
                level: "debug".to_string(),
                format: LogFormat::Compact,
                file_dir: None,
                colored: false,
                with_location: false,
                with_spans: false,
            };
            let _ = init_logging(config);
        });
    }

    #[test]
    fn test_log_config_from_env() {
        env::set_var("PROMPTREPO_LOG_LEVEL", "debug");
        env::set_var("PROMPTREPO_LOG_FORMAT", "json");
        env::set_var("PROMPTREPO_LOG_COLOR", "false");

        let config = LogConfig::from_env();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.colored);

        env::remove_var("PROMPTREPO_LOG_LEVEL");
        env::remove_var("PROMPTREPO_LOG_FORMAT");
        env::remove_var("PROMPTREPO_LOG_COLOR");
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("1"));
        assert!(is_truthy("TRUE"));
        assert!(!is_truthy("yes"));
    }

    #[test]
    fn test_command_execution_logging() {
        init_test_logging();

        let ok: Result<(), String> = Ok(());
        log_command_execution("ls", 12, &ok);

        let failed: Result<(), String> = Err("boom".to_string());
        log_command_execution("rm", 3, &failed);
    }

    #[test]
    fn test_library_operation_logging() {
        init_test_logging();

        log_library_operation("folder.create", Some("f1"), None, 1);
        log_library_operation(
            "folder.move",
            Some("f1"),
            Some(&LibraryError::Cycle {
                folder_id: "f1".to_string(),
                target_id: "f2".to_string(),
            }),
            1,
        );
    }
}

//! Logging configuration using tracing

use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::Result;

/// Initialize the logging subsystem
///
/// Logs are written to `~/.local/share/cutelog/logs/`.
/// Log level is controlled by the `CUTELOG_LOG` environment variable.
/// When `console_level` is set, events at or above it are mirrored to stderr
/// (stdout carries the NDJSON event stream and is never written to).
///
/// # Examples
/// ```bash
/// CUTELOG_LOG=debug cutelog
/// CUTELOG_LOG=cutelog_wire=trace cutelog
/// ```
pub fn init(console_level: Option<tracing::Level>) -> Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "cutelog.log");

    // Default to info, allow override via CUTELOG_LOG
    let env_filter =
        EnvFilter::try_from_env("CUTELOG_LOG").unwrap_or_else(|_| EnvFilter::new("cutelog=info,warn"));

    let console_layer = console_level.map(|level| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(LevelFilter::from_level(level))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(fmt::time::ChronoLocal::new(
                    "%Y-%m-%d %H:%M:%S%.3f".to_string(),
                )),
        )
        .with(console_layer)
        .init();

    tracing::info!("═══════════════════════════════════════════════════════");
    tracing::info!("cutelog starting");
    tracing::info!("Log directory: {}", log_dir.display());
    tracing::info!("═══════════════════════════════════════════════════════");

    Ok(())
}

/// Map a Python-style numeric logging level onto a tracing level.
///
/// Anything above WARNING collapses to ERROR, tracing has no CRITICAL.
pub fn level_from_numeric(level: u32) -> tracing::Level {
    match level {
        0..=5 => tracing::Level::TRACE,
        6..=10 => tracing::Level::DEBUG,
        11..=20 => tracing::Level::INFO,
        21..=30 => tracing::Level::WARN,
        _ => tracing::Level::ERROR,
    }
}

/// Get the log directory path
fn get_log_directory() -> Result<PathBuf> {
    let base = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    Ok(base.join("cutelog").join("logs"))
}

/// Get the log file path for the current day
pub fn get_current_log_file() -> Result<PathBuf> {
    let dir = get_log_directory()?;
    Ok(dir.join("cutelog.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_numeric() {
        assert_eq!(level_from_numeric(10), tracing::Level::DEBUG);
        assert_eq!(level_from_numeric(20), tracing::Level::INFO);
        assert_eq!(level_from_numeric(30), tracing::Level::WARN);
        assert_eq!(level_from_numeric(40), tracing::Level::ERROR);
        assert_eq!(level_from_numeric(50), tracing::Level::ERROR);
        assert_eq!(level_from_numeric(0), tracing::Level::TRACE);
    }

    #[test]
    fn test_log_file_under_cutelog_dir() {
        let path = get_current_log_file().unwrap();
        assert!(path.ends_with("cutelog/logs/cutelog.log"));
    }
}

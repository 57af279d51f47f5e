//! cutelog Library
//!
//! A live viewer for log records sent by Python's `logging.handlers.SocketHandler`
//! (and compatible clients), run as a headless NDJSON front-end.

pub mod headless;

pub use headless::runner::run_headless;

use std::path::PathBuf;

use cutelog_app::config::{default_config_dir, init_config_dir, load_settings};
use cutelog_app::{SerializationFormat, Settings};
use cutelog_core::logging;
use cutelog_core::prelude::*;

/// Command-line overrides for the current run. Never written to `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub listen_host: Option<String>,
    pub listen_port: Option<u16>,
    pub benchmark: bool,
    pub benchmark_interval: Option<f64>,
    pub default_serialization_format: Option<SerializationFormat>,
    pub single_tab_mode: bool,
    pub console_logging_level: Option<u32>,
}

impl Overrides {
    pub fn apply(&self, settings: &mut Settings) {
        let server = &mut settings.server;
        if let Some(host) = &self.listen_host {
            server.listen_host = host.clone();
        }
        if let Some(port) = self.listen_port {
            server.listen_port = port;
        }
        if self.benchmark {
            server.benchmark = true;
        }
        if let Some(interval) = self.benchmark_interval {
            server.benchmark_interval = interval;
        }
        if let Some(format) = self.default_serialization_format {
            server.default_serialization_format = format;
        }
        if self.single_tab_mode {
            server.single_tab_mode = true;
        }
        if let Some(level) = self.console_logging_level {
            settings.logging.console_logging_level = level;
        }
    }
}

/// Main application entry point
///
/// Loads settings from `config_dir` (or the platform config directory),
/// applies `overrides`, initializes logging, and runs the headless front-end.
pub async fn run(
    overrides: Overrides,
    config_dir: Option<PathBuf>,
    record_files: Vec<PathBuf>,
) -> Result<()> {
    let config_dir = config_dir.or_else(default_config_dir);

    let init_result = config_dir.as_deref().map(init_config_dir);
    let mut settings = config_dir
        .as_deref()
        .map(load_settings)
        .unwrap_or_default();
    overrides.apply(&mut settings);

    logging::init(Some(logging::level_from_numeric(
        settings.logging.console_logging_level,
    )))?;

    if let Some(Err(e)) = init_result {
        warn!("Config directory unavailable, presets won't persist: {}", e);
    }
    if config_dir.is_none() {
        warn!("No config directory on this platform, settings are in-memory only");
    }

    let result = run_headless(settings, config_dir, record_files).await;
    if let Err(ref e) = result {
        error!("Application error: {:?}", e);
    }
    result
}

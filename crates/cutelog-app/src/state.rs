//! Application state (Model in TEA pattern)

use std::net::SocketAddr;
use std::path::PathBuf;

use cutelog_core::prelude::*;
use cutelog_core::{default_columns, stock_levels};

use crate::config::{PresetStore, Settings};
use crate::engine_event::{EngineEvent, RecordView};
use crate::tab::{TabId, TabTemplate};
use crate::tab_manager::TabManager;

/// Lifecycle of the listening server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerStatus {
    #[default]
    Stopped,
    /// Bind in progress
    Starting,
    Running { addr: SocketAddr },
    /// Waiting for the previous generation to finish
    Stopping,
}

/// Overall application phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppPhase {
    #[default]
    Running,
    Quitting,
    /// Quit requested again while shutting down
    ForceQuit,
}

/// Ingestion-rate sampling for the benchmark tab
#[derive(Debug, Clone, Default)]
pub struct BenchmarkMonitor {
    pub tab: Option<TabId>,
    /// One sample per tick
    pub readouts: Vec<u64>,
}

impl BenchmarkMonitor {
    /// Samples per second
    pub const TICKS_PER_SECOND: u64 = 2;

    /// Record one sample, returning the status line if anything arrived.
    pub fn sample(&mut self, count: u64) -> Option<String> {
        self.readouts.push(count);
        if count == 0 {
            return None;
        }
        Some(format!(
            "{} rows/s, average: {} rows/s",
            count * Self::TICKS_PER_SECOND,
            self.average().unwrap_or_default()
        ))
    }

    /// Average rate over all samples, in rows per second
    pub fn average(&self) -> Option<u64> {
        if self.readouts.is_empty() {
            return None;
        }
        let sum: u64 = self.readouts.iter().sum();
        Some(sum / self.readouts.len() as u64 * Self::TICKS_PER_SECOND)
    }

    pub fn reset(&mut self, tab: Option<TabId>) {
        self.tab = tab;
        self.readouts.clear();
    }
}

/// Complete application state (the Model in TEA)
#[derive(Debug)]
pub struct AppState {
    pub phase: AppPhase,

    /// Effective settings (config file plus command-line overrides)
    pub settings: Settings,

    /// Where `config.toml` lives; None keeps everything in memory
    pub config_dir: Option<PathBuf>,

    pub presets: PresetStore,

    pub tabs: TabManager,

    pub server: ServerStatus,

    /// Start the server once the current generation has stopped
    pub pending_start: bool,

    pub benchmark: BenchmarkMonitor,

    /// Events produced by the last update, drained by the Engine
    events: Vec<EngineEvent>,
}

impl AppState {
    pub fn new(settings: Settings, config_dir: Option<PathBuf>) -> Self {
        let presets = match &config_dir {
            Some(dir) => PresetStore::load(dir),
            None => PresetStore::in_memory(),
        };
        Self {
            phase: AppPhase::Running,
            settings,
            config_dir,
            presets,
            tabs: TabManager::new(),
            server: ServerStatus::Stopped,
            pending_start: false,
            benchmark: BenchmarkMonitor::default(),
            events: Vec::new(),
        }
    }

    pub fn should_quit(&self) -> bool {
        self.phase != AppPhase::Running
    }

    // ─────────────────────────────────────────────────────────
    // Event outbox
    // ─────────────────────────────────────────────────────────

    pub fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.emit(EngineEvent::status(message));
    }

    pub fn report_error(&mut self, title: impl Into<String>, message: impl Into<String>) {
        let (title, message) = (title.into(), message.into());
        error!("{}: {}", title, message);
        self.emit(EngineEvent::error(title, message));
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ─────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────

    /// Starting point for new tabs: configured capacity and default presets
    pub fn tab_template(&self) -> TabTemplate {
        let levels_preset = &self.settings.presets.default_levels_preset;
        let levels = self.presets.level_preset(levels_preset).unwrap_or_else(|| {
            warn!("Levels preset \"{}\" not found, using stock levels", levels_preset);
            stock_levels()
        });
        let header_preset = &self.settings.presets.default_header_preset;
        let columns = self.presets.header_preset(header_preset).unwrap_or_else(|| {
            warn!("Header preset \"{}\" not found, using stock columns", header_preset);
            default_columns()
        });
        TabTemplate {
            max_capacity: self.settings.records.default_max_capacity,
            levels_preset: levels_preset.clone(),
            levels,
            header_preset: header_preset.clone(),
            columns,
            extra_mode: self.settings.records.extra_mode,
        }
    }

    /// Publish the record at `index` of a tab as visible
    pub fn emit_record(&mut self, tab_id: TabId, index: usize) {
        let Some(record) = self.record_view(tab_id, index) else {
            return;
        };
        if let Some(tab) = self.tabs.get(tab_id) {
            let tab = tab.name.clone();
            self.emit(EngineEvent::Record { tab, record });
        }
    }

    /// Render a stored record of `tab_id` for an event
    pub fn record_view(&self, tab_id: TabId, index: usize) -> Option<RecordView> {
        let tab = self.tabs.get(tab_id)?;
        let record = tab.store.get(index)?;
        Some(RecordView::render(
            tab,
            index,
            record,
            &self.settings.records.time_format,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PresetSettings;

    #[test]
    fn test_benchmark_monitor_readouts() {
        let mut monitor = BenchmarkMonitor::default();
        assert_eq!(
            monitor.sample(100).as_deref(),
            Some("200 rows/s, average: 200 rows/s")
        );
        assert_eq!(monitor.sample(0), None);
        assert_eq!(
            monitor.sample(50).as_deref(),
            Some("100 rows/s, average: 100 rows/s")
        );
        monitor.reset(None);
        assert!(monitor.readouts.is_empty());
    }

    #[test]
    fn test_tab_template_from_settings() {
        let mut settings = Settings::default();
        settings.records.default_max_capacity = 10;
        settings.records.extra_mode = true;
        let state = AppState::new(settings, None);

        let template = state.tab_template();
        assert_eq!(template.max_capacity, 10);
        assert!(template.extra_mode);
        assert_eq!(template.levels, stock_levels());
    }

    #[test]
    fn test_missing_default_preset_falls_back_to_stock() {
        let mut settings = Settings::default();
        settings.presets = PresetSettings {
            default_levels_preset: "Gone".into(),
            default_header_preset: "Gone".into(),
        };
        let state = AppState::new(settings, None);
        let template = state.tab_template();
        assert_eq!(template.levels, stock_levels());
        assert_eq!(template.columns, default_columns());
    }

    #[test]
    fn test_event_outbox() {
        let mut state = AppState::new(Settings::default(), None);
        state.set_status("hello");
        state.report_error("Oops", "bad");
        let events = state.take_events();
        assert_eq!(events.len(), 2);
        assert!(state.take_events().is_empty());
        assert!(!state.should_quit());
    }
}

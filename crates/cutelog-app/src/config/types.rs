//! Configuration types for cutelog
//!
//! Defines:
//! - `Settings` - Global application settings (`config.toml`)
//! - `PresetFile` - Named level and header presets (`presets.toml`)

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use cutelog_core::{Column, Level, DEFAULT_TIME_FORMAT, STOCK_PRESET};
use cutelog_wire::{SerializationFormat, ServerConfig, DEFAULT_MAX_FRAME_LEN, DEFAULT_PORT};

/// Application settings (`config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub records: RecordSettings,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub presets: PresetSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Listener and connection behavior
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_listen_host")]
    pub listen_host: String,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Format a connection starts in until a control frame switches it
    #[serde(default)]
    pub default_serialization_format: SerializationFormat,

    /// Route every new connection into the first tab
    #[serde(default)]
    pub single_tab_mode: bool,

    /// In single-tab mode, clear the tab when a new connection arrives
    #[serde(default)]
    pub new_conn_clears_tab: bool,

    /// Start a synthetic record source with the server
    #[serde(default)]
    pub benchmark: bool,

    /// Seconds between synthetic records
    #[serde(default = "default_benchmark_interval")]
    pub benchmark_interval: f64,

    /// How long a stopping server waits for each connection
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,

    /// Frames declaring a larger payload are dropped unread
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_host: default_listen_host(),
            listen_port: default_listen_port(),
            default_serialization_format: SerializationFormat::default(),
            single_tab_mode: false,
            new_conn_clears_tab: false,
            benchmark: false,
            benchmark_interval: default_benchmark_interval(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            max_frame_len: default_max_frame_len(),
        }
    }
}

impl ServerSettings {
    /// Server parameters for the next generation
    pub fn to_server_config(&self) -> ServerConfig {
        let interval = if self.benchmark_interval.is_finite() && self.benchmark_interval > 0.0 {
            Duration::from_secs_f64(self.benchmark_interval)
        } else {
            Duration::ZERO
        };
        ServerConfig {
            host: self.listen_host.clone(),
            port: self.listen_port,
            default_format: self.default_serialization_format,
            benchmark: self.benchmark,
            benchmark_interval: interval,
            shutdown_timeout: Duration::from_millis(self.shutdown_timeout_ms),
            max_frame_len: self.max_frame_len,
        }
    }
}

fn default_listen_host() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    DEFAULT_PORT
}

fn default_benchmark_interval() -> f64 {
    0.0005
}

fn default_shutdown_timeout_ms() -> u64 {
    1500
}

fn default_max_frame_len() -> usize {
    DEFAULT_MAX_FRAME_LEN
}

/// Record storage and rendering
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RecordSettings {
    /// Capacity of new tabs (0 = unbounded)
    #[serde(default)]
    pub default_max_capacity: usize,

    /// Append fields without a visible column to the message text
    #[serde(default)]
    pub extra_mode: bool,

    /// chrono format string for the `asctime` column
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

impl Default for RecordSettings {
    fn default() -> Self {
        Self {
            default_max_capacity: 0,
            extra_mode: false,
            time_format: default_time_format(),
        }
    }
}

fn default_time_format() -> String {
    DEFAULT_TIME_FORMAT.to_string()
}

/// Defaults for new searches
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchSettings {
    #[serde(default)]
    pub regex: bool,

    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default)]
    pub wildcard: bool,
}

/// Presets applied to new tabs
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PresetSettings {
    #[serde(default = "default_preset")]
    pub default_levels_preset: String,

    #[serde(default = "default_preset")]
    pub default_header_preset: String,
}

impl Default for PresetSettings {
    fn default() -> Self {
        Self {
            default_levels_preset: default_preset(),
            default_header_preset: default_preset(),
        }
    }
}

fn default_preset() -> String {
    STOCK_PRESET.to_string()
}

/// Internal diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Python-style numeric level for stderr output (10 debug .. 50 critical)
    #[serde(default = "default_console_logging_level")]
    pub console_logging_level: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            console_logging_level: default_console_logging_level(),
        }
    }
}

fn default_console_logging_level() -> u32 {
    30
}

/// Named presets (`presets.toml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PresetFile {
    #[serde(default)]
    pub levels: BTreeMap<String, Vec<Level>>,

    #[serde(default)]
    pub headers: BTreeMap<String, Vec<Column>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.server.listen_host, "0.0.0.0");
        assert_eq!(settings.server.listen_port, 19996);
        assert_eq!(
            settings.server.default_serialization_format,
            SerializationFormat::Pickle
        );
        assert_eq!(settings.server.shutdown_timeout_ms, 1500);
        assert_eq!(settings.records.default_max_capacity, 0);
        assert_eq!(settings.presets.default_levels_preset, "Stock");
        assert_eq!(settings.logging.console_logging_level, 30);
    }

    #[test]
    fn test_settings_deserialize_partial() {
        let toml = r#"
[server]
listen_port = 9020
default_serialization_format = "json"
"#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.server.listen_port, 9020);
        assert_eq!(
            settings.server.default_serialization_format,
            SerializationFormat::Json
        );
        assert_eq!(settings.server.listen_host, "0.0.0.0");
        assert!(!settings.records.extra_mode);
    }

    #[test]
    fn test_to_server_config() {
        let settings = ServerSettings {
            listen_host: "127.0.0.1".into(),
            listen_port: 0,
            benchmark: true,
            benchmark_interval: 0.25,
            ..Default::default()
        };
        let config = settings.to_server_config();
        assert_eq!(config.address(), "127.0.0.1:0");
        assert!(config.benchmark);
        assert_eq!(config.benchmark_interval, Duration::from_millis(250));
        assert_eq!(config.shutdown_timeout, Duration::from_millis(1500));
        assert_eq!(config.max_frame_len, DEFAULT_MAX_FRAME_LEN);
    }

    #[test]
    fn test_negative_interval_is_clamped() {
        let settings = ServerSettings {
            benchmark_interval: -1.0,
            ..Default::default()
        };
        assert_eq!(settings.to_server_config().benchmark_interval, Duration::ZERO);
    }

    #[test]
    fn test_preset_file_round_trip() {
        let mut file = PresetFile::default();
        file.levels
            .insert("Mine".into(), vec![Level::new("debug"), Level::new("trace")]);
        file.headers
            .insert("Narrow".into(), vec![Column::new("message", "Message", true, 200)]);

        let text = toml::to_string_pretty(&file).unwrap();
        let back: PresetFile = toml::from_str(&text).unwrap();
        assert_eq!(back, file);
    }
}

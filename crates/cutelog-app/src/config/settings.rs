//! Settings parser for `config.toml`

use std::path::{Path, PathBuf};

use super::types::Settings;
use cutelog_core::prelude::*;

pub(crate) const CONFIG_FILENAME: &str = "config.toml";
const APP_DIR: &str = "cutelog";

/// Platform config directory for cutelog (e.g. `~/.config/cutelog`)
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings Loading
// ─────────────────────────────────────────────────────────────────────────────

/// Load settings from `<config_dir>/config.toml`
///
/// Returns default settings if the file doesn't exist or can't be parsed.
pub fn load_settings(config_dir: &Path) -> Settings {
    let config_path = config_dir.join(CONFIG_FILENAME);

    if !config_path.exists() {
        debug!("No config file at {:?}, using defaults", config_path);
        return Settings::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {:?}", config_path);
                settings
            }
            Err(e) => {
                warn!("Failed to parse {:?}: {}", config_path, e);
                Settings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read {:?}: {}", config_path, e);
            Settings::default()
        }
    }
}

/// Create the config directory and a commented default `config.toml`.
///
/// An existing file is left untouched.
pub fn init_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let config_path = config_dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        std::fs::write(&config_path, generate_default_config())
            .map_err(|e| Error::config(format!("Failed to write config.toml: {}", e)))?;
        info!("Created default config at {:?}", config_path);
    }

    Ok(())
}

/// Save settings to `<config_dir>/config.toml`
///
/// Uses atomic write (temp file + rename).
pub fn save_settings(config_dir: &Path, settings: &Settings) -> Result<()> {
    let content = toml::to_string_pretty(settings)
        .map_err(|e| Error::config(format!("Failed to serialize settings: {}", e)))?;
    let full_content = format!("{}{}", generate_config_header(), content);

    write_atomic(config_dir, CONFIG_FILENAME, &full_content)?;
    info!("Saved settings to {:?}", config_dir.join(CONFIG_FILENAME));
    Ok(())
}

/// Write `content` to `dir/filename` through a temp file in the same directory.
pub(crate) fn write_atomic(dir: &Path, filename: &str, content: &str) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::config(format!("Failed to create config dir: {}", e)))?;
    }

    let target = dir.join(filename);
    let temp_path = dir.join(format!(".{}.tmp", filename));

    std::fs::write(&temp_path, content)
        .map_err(|e| Error::config(format!("Failed to write temp file: {}", e)))?;
    std::fs::rename(&temp_path, &target)
        .map_err(|e| Error::config(format!("Failed to rename temp file: {}", e)))?;
    Ok(())
}

fn generate_config_header() -> String {
    r#"# cutelog configuration
# Saved by cutelog; comments added by hand will not survive the next save.

"#
    .to_string()
}

fn generate_default_config() -> String {
    r#"# cutelog configuration

[server]
listen_host = "0.0.0.0"
listen_port = 19996
default_serialization_format = "pickle"   # pickle, json, msgpack or cbor
single_tab_mode = false         # Route every connection into the first tab
new_conn_clears_tab = false     # Clear that tab when a new connection arrives
benchmark = false
benchmark_interval = 0.0005     # Seconds between synthetic records
shutdown_timeout_ms = 1500
max_frame_len = 67108864        # Larger frames are dropped unread

[records]
default_max_capacity = 0        # 0 = unbounded
extra_mode = false
time_format = "%Y-%m-%d %H:%M:%S%.3f"

[search]
regex = false
case_sensitive = false
wildcard = false

[presets]
default_levels_preset = "Stock"
default_header_preset = "Stock"

[logging]
console_logging_level = 30      # 10 debug, 20 info, 30 warning, 40 error
"#
    .to_string()
}

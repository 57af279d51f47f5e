//! Configuration file parsing for cutelog
//!
//! Supports:
//! - `<config_dir>/config.toml` - Global settings
//! - `<config_dir>/presets.toml` - Named level and header presets

pub mod presets;
pub mod settings;
pub mod types;

pub use presets::PresetStore;
pub use settings::{default_config_dir, init_config_dir, load_settings, save_settings};
pub use types::*;

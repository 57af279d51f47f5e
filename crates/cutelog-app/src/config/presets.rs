//! Named level and header presets (`presets.toml`)
//!
//! The built-in "Stock" preset always resolves, even when nothing is stored
//! under that name. Presets are snapshots: deleting or overwriting one never
//! touches tabs that loaded it earlier.

use std::path::{Path, PathBuf};

use super::settings::write_atomic;
use super::types::PresetFile;
use cutelog_core::prelude::*;
use cutelog_core::{default_columns, stock_levels, Column, Level, STOCK_PRESET};

const PRESETS_FILENAME: &str = "presets.toml";

/// Preset storage backed by an optional directory.
///
/// Without a directory, presets live for the process only.
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    dir: Option<PathBuf>,
    file: PresetFile,
}

impl PresetStore {
    /// Presets that are never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load `presets.toml` from `dir`, starting empty if it is missing or invalid.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(PRESETS_FILENAME);
        let file = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                warn!("Failed to parse {:?}: {}", path, e);
                PresetFile::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PresetFile::default(),
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                PresetFile::default()
            }
        };
        Self {
            dir: Some(dir.to_path_buf()),
            file,
        }
    }

    // ─────────────────────────────────────────────────────────
    // Level presets
    // ─────────────────────────────────────────────────────────

    pub fn level_preset(&self, name: &str) -> Option<Vec<Level>> {
        match self.file.levels.get(name) {
            Some(levels) => Some(levels.clone()),
            None if name == STOCK_PRESET => Some(stock_levels()),
            None => None,
        }
    }

    pub fn level_preset_names(&self) -> Vec<String> {
        with_stock(self.file.levels.keys())
    }

    pub fn save_level_preset(&mut self, name: &str, levels: &[Level]) -> Result<()> {
        self.file.levels.insert(name.to_string(), levels.to_vec());
        self.persist()
    }

    /// Returns false if no preset was stored under `name`.
    pub fn delete_level_preset(&mut self, name: &str) -> Result<bool> {
        let removed = self.file.levels.remove(name).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    // ─────────────────────────────────────────────────────────
    // Header presets
    // ─────────────────────────────────────────────────────────

    pub fn header_preset(&self, name: &str) -> Option<Vec<Column>> {
        match self.file.headers.get(name) {
            Some(columns) => Some(columns.clone()),
            None if name == STOCK_PRESET => Some(default_columns()),
            None => None,
        }
    }

    pub fn header_preset_names(&self) -> Vec<String> {
        with_stock(self.file.headers.keys())
    }

    pub fn save_header_preset(&mut self, name: &str, columns: &[Column]) -> Result<()> {
        self.file.headers.insert(name.to_string(), columns.to_vec());
        self.persist()
    }

    pub fn delete_header_preset(&mut self, name: &str) -> Result<bool> {
        let removed = self.file.headers.remove(name).is_some();
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    fn persist(&self) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        let content = toml::to_string_pretty(&self.file)
            .map_err(|e| Error::config(format!("Failed to serialize presets: {}", e)))?;
        write_atomic(dir, PRESETS_FILENAME, &content)?;
        debug!("Saved presets to {:?}", dir.join(PRESETS_FILENAME));
        Ok(())
    }
}

fn with_stock<'a>(names: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut all: Vec<String> = names.cloned().collect();
    if !all.iter().any(|n| n == STOCK_PRESET) {
        all.insert(0, STOCK_PRESET.to_string());
    }
    all
}

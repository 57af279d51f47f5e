//! Log levels, their presentation, and the per-tab level registry

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Name of the preset every tab starts from
pub const STOCK_PRESET: &str = "Stock";

/// An RGB color triple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// `#rrggbb` form
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// Colors and text styles for one theme variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub fg: Rgb,
    pub bg: Rgb,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl Presentation {
    pub const fn plain(fg: Rgb, bg: Rgb) -> Self {
        Self {
            fg,
            bg,
            bold: false,
            italic: false,
            underline: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// A named severity label with its enabled flag and presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub light: Presentation,
    pub dark: Presentation,
}

fn default_true() -> bool {
    true
}

impl Level {
    /// A level with the stock presentation for `name`, or the neutral one.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into().to_uppercase();
        let (light, dark) = stock_presentation(&name).unwrap_or((
            Presentation::plain(Rgb::BLACK, Rgb::WHITE),
            Presentation::plain(Rgb::WHITE, Rgb::BLACK),
        ));
        Self {
            name,
            enabled: true,
            light,
            dark,
        }
    }
}

/// Presentation of the built-in levels, as (light, dark)
fn stock_presentation(name: &str) -> Option<(Presentation, Presentation)> {
    let pair = match name {
        "DEBUG" => (
            Presentation::plain(Rgb(145, 145, 145), Rgb::WHITE),
            Presentation::plain(Rgb(169, 169, 169), Rgb::BLACK),
        ),
        "INFO" => (
            Presentation::plain(Rgb::BLACK, Rgb(200, 255, 200)),
            Presentation::plain(Rgb(169, 255, 169), Rgb::BLACK),
        ),
        "WARNING" => (
            Presentation::plain(Rgb::BLACK, Rgb(255, 255, 180)),
            Presentation::plain(Rgb(255, 255, 129), Rgb::BLACK),
        ),
        "ERROR" => (
            Presentation::plain(Rgb::BLACK, Rgb(255, 190, 190)),
            Presentation::plain(Rgb(255, 169, 169), Rgb::BLACK),
        ),
        "CRITICAL" => (
            Presentation::plain(Rgb(255, 0, 0), Rgb::BLACK).bold(),
            Presentation::plain(Rgb(255, 0, 0), Rgb::BLACK).bold(),
        ),
        _ => return None,
    };
    Some(pair)
}

/// Levels every registry starts with, in display order
pub fn stock_levels() -> Vec<Level> {
    ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
        .into_iter()
        .map(Level::new)
        .collect()
}

/// Name → Level mapping owned by a tab.
///
/// Levels are kept in first-seen order for display. Every level name a record
/// carries is resolved through [`LevelRegistry::resolve`], so the registry always
/// holds one entry per distinct name seen.
#[derive(Debug, Clone)]
pub struct LevelRegistry {
    levels: Vec<Level>,
    index: HashMap<String, usize>,
    preset_name: String,
}

impl Default for LevelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelRegistry {
    /// Registry holding the stock levels
    pub fn new() -> Self {
        Self::from_levels(STOCK_PRESET, stock_levels())
    }

    /// Registry holding exactly `levels`
    pub fn from_levels(preset_name: impl Into<String>, levels: Vec<Level>) -> Self {
        let mut registry = Self {
            levels: Vec::with_capacity(levels.len()),
            index: HashMap::new(),
            preset_name: preset_name.into(),
        };
        for level in levels {
            registry.insert(level);
        }
        registry
    }

    /// Names are stored upper-cased so presets written by hand merge with
    /// levels resolved from records.
    fn insert(&mut self, mut level: Level) {
        level.name = level.name.to_uppercase();
        match self.index.get(&level.name) {
            Some(&i) => self.levels[i] = level,
            None => {
                self.index.insert(level.name.clone(), self.levels.len());
                self.levels.push(level);
            }
        }
    }

    /// Index of a level, matching names case-insensitively
    fn position(&self, name: &str) -> Option<usize> {
        self.index
            .get(name)
            .or_else(|| self.index.get(&name.to_uppercase()))
            .copied()
    }

    /// Return the level named `name`, creating an enabled one on first sight.
    pub fn resolve(&mut self, name: &str) -> &Level {
        let i = match self.position(name) {
            Some(i) => i,
            None => {
                self.insert(Level::new(name));
                self.levels.len() - 1
            }
        };
        &self.levels[i]
    }

    pub fn get(&self, name: &str) -> Option<&Level> {
        self.position(name).map(|i| &self.levels[i])
    }

    /// Set the enabled flag of one level. Returns false if the level is unknown.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.position(name) {
            Some(i) => {
                self.levels[i].enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn enable_all(&mut self) {
        self.levels.iter_mut().for_each(|l| l.enabled = true);
    }

    pub fn disable_all(&mut self) {
        self.levels.iter_mut().for_each(|l| l.enabled = false);
    }

    /// Level filter predicate.
    ///
    /// A record without a level always passes; a named level passes only if it
    /// is known and enabled.
    pub fn contains(&self, level_name: Option<&str>) -> bool {
        match level_name {
            None => true,
            Some(name) => self.get(name).is_some_and(|l| l.enabled),
        }
    }

    /// Apply a named preset.
    ///
    /// Levels in the preset replace same-named entries. Levels already seen but
    /// absent from the preset are kept so records carrying them stay resolvable.
    pub fn apply_preset(&mut self, preset_name: impl Into<String>, levels: Vec<Level>) {
        self.preset_name = preset_name.into();
        for level in levels {
            self.insert(level);
        }
    }

    /// Snapshot of the levels in display order
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    pub fn preset_name(&self) -> &str {
        &self.preset_name
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_stock_levels() {
        let registry = LevelRegistry::new();
        let names: Vec<&str> = registry.levels().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]);
        assert_eq!(registry.preset_name(), STOCK_PRESET);
    }

    #[test]
    fn test_resolve_creates_unknown_level_once() {
        let mut registry = LevelRegistry::new();
        let level = registry.resolve("TRACE").clone();
        assert!(level.enabled);
        assert_eq!(level.light.bg, Rgb::WHITE);
        assert_eq!(level.dark.bg, Rgb::BLACK);

        registry.resolve("TRACE");
        registry.resolve("trace");
        assert_eq!(registry.len(), 6);
        assert_eq!(registry.get("Trace").unwrap().name, "TRACE");
    }

    #[test]
    fn test_contains_passes_records_without_level() {
        let mut registry = LevelRegistry::new();
        registry.disable_all();
        assert!(registry.contains(None));
        assert!(!registry.contains(Some("INFO")));
    }

    #[test]
    fn test_contains_unknown_level_fails() {
        let registry = LevelRegistry::new();
        assert!(!registry.contains(Some("NOPE")));
    }

    #[test]
    fn test_set_enabled() {
        let mut registry = LevelRegistry::new();
        assert!(registry.set_enabled("DEBUG", false));
        assert!(!registry.contains(Some("DEBUG")));
        assert!(registry.contains(Some("INFO")));
        assert!(!registry.set_enabled("MISSING", false));

        registry.enable_all();
        assert!(registry.contains(Some("DEBUG")));
    }

    #[test]
    fn test_apply_preset_keeps_seen_levels() {
        let mut registry = LevelRegistry::new();
        registry.resolve("AUDIT");

        let mut quiet_debug = Level::new("DEBUG");
        quiet_debug.enabled = false;
        registry.apply_preset("Quiet", vec![quiet_debug]);

        assert_eq!(registry.preset_name(), "Quiet");
        assert!(!registry.contains(Some("DEBUG")));
        assert!(registry.contains(Some("AUDIT")));
        assert!(registry.contains(Some("ERROR")));
    }

    #[test]
    fn test_lowercase_preset_level_is_not_duplicated() {
        let mut audit = Level::new("AUDIT");
        audit.name = "audit".to_string();
        audit.enabled = false;
        let mut registry = LevelRegistry::from_levels("Custom", vec![audit]);

        assert_eq!(registry.resolve("audit").name, "AUDIT");
        assert_eq!(registry.resolve("AUDIT").name, "AUDIT");
        assert_eq!(registry.levels().len(), 1);
        assert!(!registry.contains(Some("Audit")));
    }

    #[test]
    fn test_critical_is_bold() {
        let level = Level::new("CRITICAL");
        assert!(level.light.bold);
        assert_eq!(level.light.fg, Rgb(255, 0, 0));
        assert_eq!(Rgb(255, 0, 0).to_hex(), "#ff0000");
    }
}

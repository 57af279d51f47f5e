//! Level and header presets

use crate::config::{load_settings, save_settings, Settings};
use crate::state::AppState;

use super::tabs::selected_or_report;
use super::UpdateResult;

pub fn handle_load_levels(state: &mut AppState, name: &str) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let Some(levels) = state.presets.level_preset(name) else {
        state.report_error("Preset error", format!("No levels preset named \"{}\"", name));
        return UpdateResult::none();
    };
    if let Some(tab) = state.tabs.get_mut(id) {
        tab.apply_level_preset(name, levels);
    }
    state.set_status(format!("Loaded levels preset \"{}\"", name));
    UpdateResult::none()
}

pub fn handle_save_levels(state: &mut AppState, name: &str) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let Some(levels) = state.tabs.get(id).map(|t| t.levels.levels().to_vec()) else {
        return UpdateResult::none();
    };
    match state.presets.save_level_preset(name, &levels) {
        Ok(()) => state.set_status(format!("Saved levels preset \"{}\"", name)),
        Err(e) => state.report_error("Couldn't save preset", e.to_string()),
    }
    UpdateResult::none()
}

pub fn handle_delete_levels(state: &mut AppState, name: &str) -> UpdateResult {
    match state.presets.delete_level_preset(name) {
        Ok(true) => state.set_status(format!("Deleted levels preset \"{}\"", name)),
        Ok(false) => {
            state.report_error("Preset error", format!("No levels preset named \"{}\"", name))
        }
        Err(e) => state.report_error("Couldn't delete preset", e.to_string()),
    }
    UpdateResult::none()
}

pub fn handle_default_levels(state: &mut AppState, name: String) -> UpdateResult {
    if state.presets.level_preset(&name).is_none() {
        state.report_error("Preset error", format!("No levels preset named \"{}\"", name));
        return UpdateResult::none();
    }
    state.settings.presets.default_levels_preset = name.clone();
    persist_default(state, |settings| {
        settings.presets.default_levels_preset = name.clone()
    });
    state.set_status(format!("New tabs will use levels preset \"{}\"", name));
    UpdateResult::none()
}

pub fn handle_load_header(state: &mut AppState, name: &str) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let Some(columns) = state.presets.header_preset(name) else {
        state.report_error("Preset error", format!("No header preset named \"{}\"", name));
        return UpdateResult::none();
    };
    if let Some(tab) = state.tabs.get_mut(id) {
        tab.header.apply_preset(name, columns);
    }
    state.set_status(format!("Loaded header preset \"{}\"", name));
    UpdateResult::none()
}

pub fn handle_save_header(state: &mut AppState, name: &str) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let Some(columns) = state.tabs.get(id).map(|t| t.header.columns().to_vec()) else {
        return UpdateResult::none();
    };
    match state.presets.save_header_preset(name, &columns) {
        Ok(()) => state.set_status(format!("Saved header preset \"{}\"", name)),
        Err(e) => state.report_error("Couldn't save preset", e.to_string()),
    }
    UpdateResult::none()
}

pub fn handle_delete_header(state: &mut AppState, name: &str) -> UpdateResult {
    match state.presets.delete_header_preset(name) {
        Ok(true) => state.set_status(format!("Deleted header preset \"{}\"", name)),
        Ok(false) => {
            state.report_error("Preset error", format!("No header preset named \"{}\"", name))
        }
        Err(e) => state.report_error("Couldn't delete preset", e.to_string()),
    }
    UpdateResult::none()
}

pub fn handle_default_header(state: &mut AppState, name: String) -> UpdateResult {
    if state.presets.header_preset(&name).is_none() {
        state.report_error("Preset error", format!("No header preset named \"{}\"", name));
        return UpdateResult::none();
    }
    state.settings.presets.default_header_preset = name.clone();
    persist_default(state, |settings| {
        settings.presets.default_header_preset = name.clone()
    });
    state.set_status(format!("New tabs will use header preset \"{}\"", name));
    UpdateResult::none()
}

/// Apply `change` to the stored config file.
///
/// The file is re-read so command-line overrides in the effective settings
/// are never written back.
fn persist_default(state: &mut AppState, change: impl FnOnce(&mut Settings)) {
    let Some(dir) = state.config_dir.clone() else {
        return;
    };
    let mut stored = load_settings(&dir);
    change(&mut stored);
    if let Err(e) = save_settings(&dir, &stored) {
        state.report_error("Couldn't save settings", e.to_string());
    }
}

//! Tab management, record history and filters of the selected tab

use std::path::PathBuf;

use cutelog_core::prelude::*;
use cutelog_core::{LogRecord, SearchFilter, SearchMode};

use crate::engine_event::EngineEvent;
use crate::records_io::tab_name_for;
use crate::state::AppState;
use crate::tab::TabId;

use super::server::stop_monitor;
use super::{UpdateAction, UpdateResult};

/// The selected tab, or an error event if there is none
pub(super) fn selected_or_report(state: &mut AppState) -> Option<TabId> {
    let selected = state.tabs.selected_id();
    if selected.is_none() {
        state.report_error("No tab", "No tab is open");
    }
    selected
}

// ─────────────────────────────────────────────────────────
// Tab Management
// ─────────────────────────────────────────────────────────

pub fn handle_select(state: &mut AppState, name: &str) -> UpdateResult {
    match state.tabs.find_by_name(name) {
        Some(id) => {
            state.tabs.select(id);
            state.set_status(format!("Selected \"{}\" tab", name));
        }
        None => state.report_error("Select error", Error::tab_not_found(name).to_string()),
    }
    UpdateResult::none()
}

pub fn handle_rename(state: &mut AppState, new_name: String) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let old = state
        .tabs
        .get(id)
        .map(|t| t.name.clone())
        .unwrap_or_default();
    match state.tabs.rename(id, &new_name) {
        Ok(()) => state.emit(EngineEvent::TabRenamed { old, new: new_name }),
        Err(e) => state.report_error("Rename error", e.to_string()),
    }
    UpdateResult::none()
}

pub fn handle_close(state: &mut AppState) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    debug!("Tab close requested: {}", id);
    if let Some(tab) = state.tabs.close_tab(id) {
        state.emit(EngineEvent::TabClosed { tab });
    }
    if state.benchmark.tab == Some(id) {
        return UpdateResult::action(stop_monitor(state));
    }
    UpdateResult::none()
}

pub fn handle_merge(
    state: &mut AppState,
    dst: &str,
    srcs: &[String],
    keep_alive: bool,
) -> UpdateResult {
    debug!(
        "Merging tabs: dst=\"{}\", srcs={:?}, keep={}",
        dst, srcs, keep_alive
    );
    let Some(dst_id) = state.tabs.find_by_name(dst) else {
        state.report_error("Merge error", Error::tab_not_found(dst).to_string());
        return UpdateResult::none();
    };
    let mut src_ids = Vec::with_capacity(srcs.len());
    for name in srcs {
        match state.tabs.find_by_name(name) {
            Some(id) => src_ids.push(id),
            None => {
                state.report_error("Merge error", Error::tab_not_found(name).to_string());
                return UpdateResult::none();
            }
        }
    }

    let benchmark_merged = state
        .benchmark
        .tab
        .is_some_and(|id| id != dst_id && src_ids.contains(&id));

    let closed = match state.tabs.merge(dst_id, &src_ids, keep_alive) {
        Ok(closed) => closed,
        Err(e) => {
            state.report_error("Merge error", e.to_string());
            return UpdateResult::none();
        }
    };
    let count = closed.len();
    for tab in closed {
        state.emit(EngineEvent::TabClosed { tab });
    }
    state.set_status(format!("Merged {} tabs into \"{}\"", count, dst));

    if benchmark_merged {
        if keep_alive {
            state.benchmark.tab = Some(dst_id);
        } else {
            return UpdateResult::action(stop_monitor(state));
        }
    }
    UpdateResult::none()
}

// ─────────────────────────────────────────────────────────
// Records
// ─────────────────────────────────────────────────────────

pub fn handle_trim(state: &mut AppState, n: usize) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    if let Some(tab) = state.tabs.get_mut(id) {
        let removed = tab.trim(n);
        let status = format!("Trimmed {} records from \"{}\"", removed, tab.name);
        state.set_status(status);
    }
    UpdateResult::none()
}

pub fn handle_set_capacity(state: &mut AppState, n: usize) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    if let Some(tab) = state.tabs.get_mut(id) {
        tab.set_capacity(n);
        let status = if n == 0 {
            format!("Max capacity of \"{}\" disabled", tab.name)
        } else {
            format!("Max capacity of \"{}\" set to {}", tab.name, n)
        };
        state.set_status(status);
    }
    UpdateResult::none()
}

pub fn handle_dump_visible(state: &mut AppState) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let indices: Vec<usize> = state
        .tabs
        .get(id)
        .map(|tab| tab.visible_records().map(|(i, _)| i).collect())
        .unwrap_or_default();
    for index in indices {
        state.emit_record(id, index);
    }
    UpdateResult::none()
}

pub fn handle_save_records(state: &mut AppState, path: PathBuf) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    match state.tabs.get(id) {
        Some(tab) => UpdateResult::action(UpdateAction::SaveRecords {
            path,
            records: tab.store.iter().cloned().collect(),
        }),
        None => UpdateResult::none(),
    }
}

pub fn handle_records_saved(
    state: &mut AppState,
    path: PathBuf,
    error: Option<String>,
) -> UpdateResult {
    match error {
        None => state.set_status(format!(
            "Records have been saved to \"{}\"",
            path.display()
        )),
        Some(e) => state.report_error("Couldn't save records", e),
    }
    UpdateResult::none()
}

pub fn handle_load_records(path: PathBuf) -> UpdateResult {
    UpdateResult::action(UpdateAction::LoadRecords { path })
}

pub fn handle_records_loaded(
    state: &mut AppState,
    path: PathBuf,
    result: std::result::Result<Vec<LogRecord>, String>,
) -> UpdateResult {
    let records = match result {
        Ok(records) => records,
        Err(e) => {
            state.report_error("Couldn't load records", e);
            return UpdateResult::none();
        }
    };

    let template = state.tab_template();
    let id = state.tabs.create_tab(&tab_name_for(&path), &template);
    let Some(tab) = state.tabs.get_mut(id) else {
        return UpdateResult::none();
    };
    tab.merge_records(records);
    let name = tab.name.clone();

    state.emit(EngineEvent::TabCreated { tab: name.clone() });
    state.set_status(format!("Records have been loaded into \"{}\" tab", name));
    UpdateResult::none()
}

// ─────────────────────────────────────────────────────────
// Filters
// ─────────────────────────────────────────────────────────

pub fn handle_set_level(state: &mut AppState, level: &str, enabled: bool) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let known = state
        .tabs
        .get_mut(id)
        .is_some_and(|tab| tab.set_level_enabled(level, enabled));
    if !known {
        state.report_error("Level error", format!("Unknown level \"{}\"", level));
    }
    UpdateResult::none()
}

pub fn handle_all_levels(state: &mut AppState, enabled: bool) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    if let Some(tab) = state.tabs.get_mut(id) {
        if enabled {
            tab.levels.enable_all();
        } else {
            tab.levels.disable_all();
        }
    }
    UpdateResult::none()
}

pub fn handle_select_namespaces(state: &mut AppState, paths: &[String]) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let unknown = state
        .tabs
        .get_mut(id)
        .map(|tab| tab.select_namespaces(paths))
        .unwrap_or_default();
    if !unknown.is_empty() {
        state.set_status(format!("Unknown namespaces ignored: {}", unknown.join(", ")));
    }
    UpdateResult::none()
}

pub fn handle_include_children(state: &mut AppState, include: bool) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    if let Some(tab) = state.tabs.get_mut(id) {
        tab.set_include_children(include);
    }
    UpdateResult::none()
}

pub fn handle_set_search(
    state: &mut AppState,
    query: String,
    mode: Option<SearchMode>,
    case_sensitive: Option<bool>,
) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let defaults = &state.settings.search;
    let mode = mode.unwrap_or(if defaults.regex {
        SearchMode::Regex
    } else if defaults.wildcard {
        SearchMode::Wildcard
    } else {
        SearchMode::Plain
    });
    let case_sensitive = case_sensitive.unwrap_or(defaults.case_sensitive);

    match SearchFilter::new(query, mode, case_sensitive) {
        Ok(search) => {
            if let Some(tab) = state.tabs.get_mut(id) {
                tab.set_search(Some(search));
            }
        }
        Err(e) => state.report_error("Invalid search", e.to_string()),
    }
    UpdateResult::none()
}

pub fn handle_clear_search(state: &mut AppState) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    if let Some(tab) = state.tabs.get_mut(id) {
        tab.set_search(None);
    }
    UpdateResult::none()
}

pub fn handle_find_next(state: &mut AppState) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let Some(tab) = state.tabs.get_mut(id) else {
        return UpdateResult::none();
    };
    let hit = tab.advance_search();
    let name = tab.name.clone();
    let record = hit.and_then(|index| state.record_view(id, index));
    state.emit(EngineEvent::SearchMatch { tab: name, record });
    UpdateResult::none()
}

// ─────────────────────────────────────────────────────────
// Presentation
// ─────────────────────────────────────────────────────────

pub fn handle_column_visible(state: &mut AppState, column: &str, visible: bool) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    let known = state
        .tabs
        .get_mut(id)
        .is_some_and(|tab| tab.header.set_visible(column, visible));
    if !known {
        state.report_error("Column error", format!("Unknown column \"{}\"", column));
    }
    UpdateResult::none()
}

pub fn handle_extra_mode(state: &mut AppState, enabled: bool) -> UpdateResult {
    let Some(id) = selected_or_report(state) else {
        return UpdateResult::none();
    };
    if let Some(tab) = state.tabs.get_mut(id) {
        tab.extra_mode = enabled;
    }
    UpdateResult::none()
}

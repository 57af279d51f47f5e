//! Main update function - handles state transitions (TEA pattern)

use crate::message::Message;
use crate::state::{AppPhase, AppState};

use super::{presets, server, tabs, UpdateResult};

/// Process a message and update state
/// Returns optional follow-up message and/or action
pub fn update(state: &mut AppState, message: Message) -> UpdateResult {
    match message {
        Message::Quit => {
            state.phase = match state.phase {
                AppPhase::Running => AppPhase::Quitting,
                _ => AppPhase::ForceQuit,
            };
            UpdateResult::none()
        }

        Message::InvalidCommand(text) => {
            state.report_error("Invalid command", text);
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Server
        // ─────────────────────────────────────────────────────────
        Message::Server(event) => server::handle_server_event(state, event),
        Message::StartServer => server::handle_start(state),
        Message::StopServer => server::handle_stop(state),
        Message::RestartServer => server::handle_restart(state),
        Message::ServerStarted { addr } => server::handle_started(state, addr),
        Message::ServerStartFailed { error } => server::handle_start_failed(state, error),
        Message::StopBenchmark => server::handle_stop_benchmark(state),
        Message::BenchmarkTick => server::handle_benchmark_tick(state),

        // ─────────────────────────────────────────────────────────
        // Tabs
        // ─────────────────────────────────────────────────────────
        Message::SelectTab(name) => tabs::handle_select(state, &name),
        Message::RenameTab(name) => tabs::handle_rename(state, name),
        Message::CloseTab => tabs::handle_close(state),
        Message::MergeTabs {
            dst,
            srcs,
            keep_alive,
        } => tabs::handle_merge(state, &dst, &srcs, keep_alive),
        Message::SetSingleTabMode(enabled) => {
            state.settings.server.single_tab_mode = enabled;
            state.set_status(format!(
                "Single tab mode {}",
                if enabled { "enabled" } else { "disabled" }
            ));
            UpdateResult::none()
        }

        // ─────────────────────────────────────────────────────────
        // Records
        // ─────────────────────────────────────────────────────────
        Message::TrimRecords(n) => tabs::handle_trim(state, n),
        Message::SetMaxCapacity(n) => tabs::handle_set_capacity(state, n),
        Message::DumpVisible => tabs::handle_dump_visible(state),
        Message::SaveRecords(path) => tabs::handle_save_records(state, path),
        Message::RecordsSaved { path, error } => tabs::handle_records_saved(state, path, error),
        Message::LoadRecords(path) => tabs::handle_load_records(path),
        Message::RecordsLoaded { path, result } => {
            tabs::handle_records_loaded(state, path, result)
        }

        // ─────────────────────────────────────────────────────────
        // Filters
        // ─────────────────────────────────────────────────────────
        Message::SetLevelEnabled { level, enabled } => {
            tabs::handle_set_level(state, &level, enabled)
        }
        Message::EnableAllLevels => tabs::handle_all_levels(state, true),
        Message::DisableAllLevels => tabs::handle_all_levels(state, false),
        Message::SelectNamespaces(paths) => tabs::handle_select_namespaces(state, &paths),
        Message::SetIncludeChildren(include) => tabs::handle_include_children(state, include),
        Message::SetSearch {
            query,
            mode,
            case_sensitive,
        } => tabs::handle_set_search(state, query, mode, case_sensitive),
        Message::ClearSearch => tabs::handle_clear_search(state),
        Message::FindNext => tabs::handle_find_next(state),

        // ─────────────────────────────────────────────────────────
        // Presentation
        // ─────────────────────────────────────────────────────────
        Message::SetColumnVisible { column, visible } => {
            tabs::handle_column_visible(state, &column, visible)
        }
        Message::SetExtraMode(enabled) => tabs::handle_extra_mode(state, enabled),

        // ─────────────────────────────────────────────────────────
        // Presets
        // ─────────────────────────────────────────────────────────
        Message::LoadLevelPreset(name) => presets::handle_load_levels(state, &name),
        Message::SaveLevelPreset(name) => presets::handle_save_levels(state, &name),
        Message::DeleteLevelPreset(name) => presets::handle_delete_levels(state, &name),
        Message::SetDefaultLevelPreset(name) => presets::handle_default_levels(state, name),
        Message::LoadHeaderPreset(name) => presets::handle_load_header(state, &name),
        Message::SaveHeaderPreset(name) => presets::handle_save_header(state, &name),
        Message::DeleteHeaderPreset(name) => presets::handle_delete_header(state, &name),
        Message::SetDefaultHeaderPreset(name) => presets::handle_default_header(state, name),
    }
}

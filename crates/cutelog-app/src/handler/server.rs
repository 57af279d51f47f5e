//! Server lifecycle, connection events and the benchmark monitor

use std::net::SocketAddr;

use cutelog_core::prelude::*;
use cutelog_core::LogRecord;
use cutelog_wire::{ConnectionId, ConnectionInfo, ServerEvent, ShutdownReport};

use crate::engine_event::EngineEvent;
use crate::message::Message;
use crate::state::{AppState, ServerStatus};

use super::{UpdateAction, UpdateResult};

pub fn handle_server_event(state: &mut AppState, event: ServerEvent) -> UpdateResult {
    match event {
        ServerEvent::ConnectionOpened(info) => handle_connection_opened(state, info),
        ServerEvent::Record { conn_id, record } => {
            handle_record(state, conn_id, record);
            UpdateResult::none()
        }
        ServerEvent::ConnectionFinished { conn_id } => {
            if finish_connection(state, conn_id) {
                UpdateResult::action(stop_monitor(state))
            } else {
                UpdateResult::none()
            }
        }
        ServerEvent::ServerStopped(report) => handle_server_stopped(state, report),
    }
}

fn handle_connection_opened(state: &mut AppState, info: ConnectionInfo) -> UpdateResult {
    debug!("New connection id={}", info.id);
    let template = state.tab_template();
    let routed = state.tabs.route_new_connection(
        &info,
        &template,
        state.settings.server.single_tab_mode,
        state.settings.server.new_conn_clears_tab,
    );
    let Some(tab_name) = state.tabs.get(routed.tab_id).map(|t| t.name.clone()) else {
        return UpdateResult::none();
    };

    if routed.created {
        state.emit(EngineEvent::TabCreated {
            tab: tab_name.clone(),
        });
    }
    state.emit(EngineEvent::connection_opened(&info, &tab_name));

    if info.is_benchmark() {
        state.benchmark.reset(Some(routed.tab_id));
        return UpdateResult::action(UpdateAction::StartMonitor);
    }
    UpdateResult::none()
}

fn handle_record(state: &mut AppState, conn_id: ConnectionId, record: LogRecord) {
    match state.tabs.deliver(conn_id, record) {
        Some((tab_id, true)) => {
            let last = state.tabs.get(tab_id).map(|t| t.store.len().saturating_sub(1));
            if let Some(index) = last {
                state.emit_record(tab_id, index);
            }
        }
        Some((_, false)) => {}
        None => trace!("Dropping record from unrouted connection id={}", conn_id),
    }
}

/// Detach a finished connection from its tab. Returns true if it was the
/// benchmark source.
fn finish_connection(state: &mut AppState, conn_id: ConnectionId) -> bool {
    let Some(finished) = state.tabs.finish_connection(conn_id) else {
        debug!("Connection id={} finished without a tab", conn_id);
        return false;
    };
    let Some(tab) = state.tabs.get(finished.tab_id) else {
        return false;
    };
    let tab_name = tab.name.clone();
    let marker_index = tab.store.len().saturating_sub(1);

    if finished.marker_visible {
        state.emit_record(finished.tab_id, marker_index);
    }
    state.emit(EngineEvent::ConnectionClosed {
        conn_id,
        tab: tab_name,
    });
    finished.connection.benchmark
}

fn handle_server_stopped(state: &mut AppState, report: ShutdownReport) -> UpdateResult {
    let mut benchmark_finished = false;
    for conn_id in report.connections() {
        benchmark_finished |= finish_connection(state, conn_id);
    }
    if !report.is_clean() {
        warn!("{} connections had to be aborted", report.aborted.len());
    }

    state.server = ServerStatus::Stopped;
    state.emit(EngineEvent::ServerStopped {
        clean: report.is_clean(),
    });
    state.set_status("Server has stopped");

    let action = if benchmark_finished || state.benchmark.tab.is_some() {
        Some(stop_monitor(state))
    } else {
        None
    };
    let message = if state.pending_start && !state.should_quit() {
        state.pending_start = false;
        Some(Message::StartServer)
    } else {
        None
    };
    UpdateResult { message, action }
}

pub fn handle_start(state: &mut AppState) -> UpdateResult {
    match state.server {
        ServerStatus::Stopped => {
            state.server = ServerStatus::Starting;
            state.set_status("Starting the server");
            UpdateResult::action(UpdateAction::StartServer(
                state.settings.server.to_server_config(),
            ))
        }
        ServerStatus::Stopping => {
            state.pending_start = true;
            UpdateResult::none()
        }
        ServerStatus::Starting | ServerStatus::Running { .. } => UpdateResult::none(),
    }
}

pub fn handle_stop(state: &mut AppState) -> UpdateResult {
    state.pending_start = false;
    match state.server {
        ServerStatus::Running { .. } => {
            state.server = ServerStatus::Stopping;
            state.set_status("Stopping the server...");
            UpdateResult::action(UpdateAction::StopServer)
        }
        _ => UpdateResult::none(),
    }
}

pub fn handle_restart(state: &mut AppState) -> UpdateResult {
    debug!("Restarting the server");
    match state.server {
        ServerStatus::Running { .. } => {
            let result = handle_stop(state);
            state.pending_start = true;
            result
        }
        ServerStatus::Stopping => {
            state.pending_start = true;
            UpdateResult::none()
        }
        ServerStatus::Stopped => handle_start(state),
        ServerStatus::Starting => UpdateResult::none(),
    }
}

pub fn handle_started(state: &mut AppState, addr: SocketAddr) -> UpdateResult {
    state.server = ServerStatus::Running { addr };
    state.emit(EngineEvent::Listening { addr });
    let host = state.settings.server.listen_host.clone();
    state.set_status(format!(
        "Server is listening on {}:{}...",
        host,
        addr.port()
    ));
    UpdateResult::none()
}

pub fn handle_start_failed(state: &mut AppState, error: String) -> UpdateResult {
    state.server = ServerStatus::Stopped;
    state.pending_start = false;
    state.report_error("Could not start the server", error);
    UpdateResult::none()
}

pub fn handle_stop_benchmark(state: &mut AppState) -> UpdateResult {
    match state.server {
        ServerStatus::Running { .. } => UpdateResult::action(UpdateAction::StopBenchmark),
        _ => UpdateResult::none(),
    }
}

pub fn handle_benchmark_tick(state: &mut AppState) -> UpdateResult {
    let count = state
        .benchmark
        .tab
        .and_then(|id| state.tabs.get_mut(id))
        .map(|tab| std::mem::take(&mut tab.monitor_count));

    match count {
        Some(count) => {
            if let Some(status) = state.benchmark.sample(count) {
                state.set_status(status);
            }
            UpdateResult::none()
        }
        None => UpdateResult::action(stop_monitor(state)),
    }
}

pub(super) fn stop_monitor(state: &mut AppState) -> UpdateAction {
    if let Some(average) = state.benchmark.average() {
        info!("Benchmark result: {} rows/s average", average);
    }
    state.benchmark.reset(None);
    UpdateAction::StopMonitor
}

//! Connection identity, cancellation flags, and events sent to the controller

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cutelog_core::LogRecord;

/// Identifier of a connection, unique for the lifetime of the process
pub type ConnectionId = u64;

/// Cooperative cancellation flags shared between a connection task and its owners.
///
/// The server sets `stop_requested` on shutdown; the owning tab sets
/// `tab_closed` when it is destroyed. The task polls both.
#[derive(Debug, Clone, Default)]
pub struct ConnectionControl {
    stop_requested: Arc<AtomicBool>,
    tab_closed: Arc<AtomicBool>,
}

impl ConnectionControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn close_tab(&self) {
        self.tab_closed.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn is_tab_closed(&self) -> bool {
        self.tab_closed.load(Ordering::SeqCst)
    }

    /// Either flag is set
    pub fn need_to_stop(&self) -> bool {
        self.is_stop_requested() || self.is_tab_closed()
    }
}

/// Where a connection's records come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A TCP client
    Socket { peer: SocketAddr },
    /// The synthetic load generator
    Benchmark,
}

/// Everything the controller needs to attach a new connection to a tab
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub kind: SourceKind,
    pub control: ConnectionControl,
}

impl ConnectionInfo {
    pub fn is_benchmark(&self) -> bool {
        self.kind == SourceKind::Benchmark
    }
}

/// Outcome of closing a server generation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Connections that stopped within the timeout
    pub stopped: Vec<ConnectionId>,
    /// Connections that had to be aborted
    pub aborted: Vec<ConnectionId>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.aborted.is_empty()
    }

    /// Every connection the generation owned when it was closed
    pub fn connections(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.stopped.iter().chain(self.aborted.iter()).copied()
    }
}

/// Events flowing from the server and its connections to the controller.
///
/// For a given connection, `ConnectionOpened` is always delivered before any of
/// its records, and `ConnectionFinished` after the last one. `ServerStopped`
/// follows every event of the generation it closes.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    ConnectionOpened(ConnectionInfo),
    Record {
        conn_id: ConnectionId,
        record: LogRecord,
    },
    ConnectionFinished {
        conn_id: ConnectionId,
    },
    ServerStopped(ShutdownReport),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_flags_are_shared_between_clones() {
        let control = ConnectionControl::new();
        let task_side = control.clone();
        assert!(!task_side.need_to_stop());

        control.close_tab();
        assert!(task_side.is_tab_closed());
        assert!(!task_side.is_stop_requested());
        assert!(task_side.need_to_stop());
    }

    #[test]
    fn test_report_lists_all_connections() {
        let report = ShutdownReport {
            stopped: vec![1, 2],
            aborted: vec![3],
        };
        assert!(!report.is_clean());
        assert_eq!(report.connections().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_request_stop() {
        let control = ConnectionControl::new();
        control.request_stop();
        assert!(control.need_to_stop());
    }
}

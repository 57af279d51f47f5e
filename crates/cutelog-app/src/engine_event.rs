//! Domain events emitted by the Engine for external consumers
//!
//! Front-ends subscribe via `Engine::subscribe()`. Events are published in the
//! order the Engine produced them while processing messages.

use std::net::SocketAddr;

use cutelog_core::{Fields, LogRecord};
use cutelog_wire::{ConnectionId, ConnectionInfo, SourceKind};

use crate::tab::LoggerTab;

/// A record as a tab presents it
#[derive(Debug, Clone, PartialEq)]
pub struct RecordView {
    /// Store index at the time of the event
    pub index: usize,
    pub created: f64,
    /// `created` rendered with the configured time format
    pub time: String,
    pub level: Option<String>,
    pub logger: Option<String>,
    /// Message column text (with hidden fields appended in extra mode)
    pub message: String,
    pub exception: Option<String>,
    pub extra: Fields,
}

impl RecordView {
    pub fn render(tab: &LoggerTab, index: usize, record: &LogRecord, time_format: &str) -> Self {
        Self {
            index,
            created: record.created,
            time: record.asctime(time_format),
            level: record.level_name.clone(),
            logger: record.logger_name.clone(),
            message: tab.render_message(record, false),
            exception: record.exception_text.clone(),
            extra: record.extra_fields.clone(),
        }
    }
}

/// Domain events emitted by the Engine for external consumers.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    // ─────────────────────────────────────────────────────────
    // Server Lifecycle
    // ─────────────────────────────────────────────────────────
    /// The listener is bound
    Listening { addr: SocketAddr },

    /// A server generation has finished, all its connections included
    ServerStopped { clean: bool },

    // ─────────────────────────────────────────────────────────
    // Connections
    // ─────────────────────────────────────────────────────────
    ConnectionOpened {
        conn_id: ConnectionId,
        tab: String,
        peer: Option<SocketAddr>,
        benchmark: bool,
    },

    ConnectionClosed { conn_id: ConnectionId, tab: String },

    // ─────────────────────────────────────────────────────────
    // Tabs
    // ─────────────────────────────────────────────────────────
    TabCreated { tab: String },

    TabRenamed { old: String, new: String },

    TabClosed { tab: String },

    /// A record became visible in a tab
    Record { tab: String, record: RecordView },

    /// Result of a find-next request
    SearchMatch {
        tab: String,
        record: Option<RecordView>,
    },

    // ─────────────────────────────────────────────────────────
    // User Feedback
    // ─────────────────────────────────────────────────────────
    /// Status bar text
    Status { message: String },

    /// A failure the user has to know about
    Error { title: String, message: String },

    // ─────────────────────────────────────────────────────────
    // Engine Lifecycle
    // ─────────────────────────────────────────────────────────
    /// Engine is shutting down
    Shutdown,
}

impl EngineEvent {
    pub fn connection_opened(info: &ConnectionInfo, tab: &str) -> Self {
        let peer = match info.kind {
            SourceKind::Socket { peer } => Some(peer),
            SourceKind::Benchmark => None,
        };
        Self::ConnectionOpened {
            conn_id: info.id,
            tab: tab.to_string(),
            peer,
            benchmark: info.is_benchmark(),
        }
    }

    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Returns a short string label for this event type (for logging/debugging).
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Listening { .. } => "listening",
            Self::ServerStopped { .. } => "server_stopped",
            Self::ConnectionOpened { .. } => "connection_opened",
            Self::ConnectionClosed { .. } => "connection_closed",
            Self::TabCreated { .. } => "tab_created",
            Self::TabRenamed { .. } => "tab_renamed",
            Self::TabClosed { .. } => "tab_closed",
            Self::Record { .. } => "record",
            Self::SearchMatch { .. } => "search_match",
            Self::Status { .. } => "status",
            Self::Error { .. } => "error",
            Self::Shutdown => "shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab::TabTemplate;
    use cutelog_wire::ConnectionControl;
    use serde_json::json;

    #[test]
    fn test_event_type_labels() {
        assert_eq!(EngineEvent::Shutdown.event_type(), "shutdown");
        assert_eq!(EngineEvent::status("x").event_type(), "status");
        assert_eq!(EngineEvent::error("t", "m").event_type(), "error");
    }

    #[test]
    fn test_connection_opened_peer() {
        let info = ConnectionInfo {
            id: 0,
            kind: SourceKind::Benchmark,
            control: ConnectionControl::new(),
        };
        match EngineEvent::connection_opened(&info, "Logger") {
            EngineEvent::ConnectionOpened {
                peer, benchmark, ..
            } => {
                assert!(peer.is_none());
                assert!(benchmark);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_record_view_render() {
        let tab = LoggerTab::new("Logger", &TabTemplate::default());
        let mut fields = Fields::new();
        fields.insert("msg".into(), json!("hello\nworld"));
        fields.insert("levelname".into(), json!("warning"));
        fields.insert("name".into(), json!("app.db"));
        fields.insert("created".into(), json!(0.5));
        fields.insert("user".into(), json!("bob"));
        let record = LogRecord::from_fields(fields);

        let view = RecordView::render(&tab, 3, &record, "%S");
        assert_eq!(view.index, 3);
        assert_eq!(view.level.as_deref(), Some("WARNING"));
        assert_eq!(view.logger.as_deref(), Some("app.db"));
        assert_eq!(view.message, "hello\nworld");
        assert_eq!(view.extra.get("user"), Some(&json!("bob")));
        assert_eq!(view.time.len(), 2);
    }
}

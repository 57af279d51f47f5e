//! Headless mode - NDJSON event output and stdin commands
//!
//! The cutelog front-end without widgets: every engine event is written to
//! stdout as one JSON object per line, and commands are read from stdin (see
//! [`commands`]).
//!
//! # Event Format
//!
//! Each event has an "event" field indicating its type, along with
//! event-specific data and a millisecond timestamp.
//!
//! # Example Output
//!
//! ```json
//! {"event":"listening","address":"0.0.0.0:19996","timestamp":1704700001000}
//! {"event":"tab_created","tab":"Logger","timestamp":1704700002000}
//! {"event":"record","tab":"Logger","index":0,"time":"2024-01-08 08:00:02.125","level":"INFO","logger":"app.db","message":"connected","timestamp":1704700002130}
//! ```

pub mod commands;
pub mod runner;

use chrono::Utc;
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use cutelog_app::{EngineEvent, RecordView};
use cutelog_core::Fields;

/// Events emitted in headless mode
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HeadlessEvent {
    /// The server is accepting connections
    Listening { address: String, timestamp: i64 },

    /// The server and all its connections have stopped
    ServerStopped { clean: bool, timestamp: i64 },

    TabCreated { tab: String, timestamp: i64 },

    TabRenamed {
        old: String,
        new: String,
        timestamp: i64,
    },

    TabClosed { tab: String, timestamp: i64 },

    ConnectionOpened {
        conn_id: u64,
        tab: String,
        peer: Option<String>,
        benchmark: bool,
        timestamp: i64,
    },

    ConnectionClosed {
        conn_id: u64,
        tab: String,
        timestamp: i64,
    },

    /// A record visible in a tab
    Record {
        tab: String,
        index: usize,
        time: String,
        level: Option<String>,
        logger: Option<String>,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        exception: Option<String>,
        #[serde(skip_serializing_if = "Fields::is_empty")]
        extra: Fields,
        timestamp: i64,
    },

    /// Result of `next`; `index` is null when nothing matches
    SearchMatch {
        tab: String,
        index: Option<usize>,
        message: Option<String>,
        timestamp: i64,
    },

    Status { message: String, timestamp: i64 },

    Error {
        title: String,
        message: String,
        timestamp: i64,
    },

    Shutdown { timestamp: i64 },
}

impl HeadlessEvent {
    /// Emit this event to stdout as JSON
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize headless event: {}", e);
                return;
            }
        };

        // NDJSON: one event per line
        let mut stdout = io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{}", json) {
            error!("Failed to write headless event to stdout: {}", e);
            return;
        }

        if let Err(e) = stdout.flush() {
            error!("Failed to flush headless stdout: {}", e);
        }
    }

    /// Get current timestamp in milliseconds
    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn record(tab: &str, record: &RecordView) -> Self {
        Self::Record {
            tab: tab.to_string(),
            index: record.index,
            time: record.time.clone(),
            level: record.level.clone(),
            logger: record.logger.clone(),
            message: record.message.clone(),
            exception: record.exception.clone(),
            extra: record.extra.clone(),
            timestamp: Self::now(),
        }
    }
}

impl From<&EngineEvent> for HeadlessEvent {
    fn from(event: &EngineEvent) -> Self {
        let timestamp = Self::now();
        match event {
            EngineEvent::Listening { addr } => Self::Listening {
                address: addr.to_string(),
                timestamp,
            },
            EngineEvent::ServerStopped { clean } => Self::ServerStopped {
                clean: *clean,
                timestamp,
            },
            EngineEvent::ConnectionOpened {
                conn_id,
                tab,
                peer,
                benchmark,
            } => Self::ConnectionOpened {
                conn_id: *conn_id,
                tab: tab.clone(),
                peer: peer.map(|p| p.to_string()),
                benchmark: *benchmark,
                timestamp,
            },
            EngineEvent::ConnectionClosed { conn_id, tab } => Self::ConnectionClosed {
                conn_id: *conn_id,
                tab: tab.clone(),
                timestamp,
            },
            EngineEvent::TabCreated { tab } => Self::TabCreated {
                tab: tab.clone(),
                timestamp,
            },
            EngineEvent::TabRenamed { old, new } => Self::TabRenamed {
                old: old.clone(),
                new: new.clone(),
                timestamp,
            },
            EngineEvent::TabClosed { tab } => Self::TabClosed {
                tab: tab.clone(),
                timestamp,
            },
            EngineEvent::Record { tab, record } => Self::record(tab, record),
            EngineEvent::SearchMatch { tab, record } => Self::SearchMatch {
                tab: tab.clone(),
                index: record.as_ref().map(|r| r.index),
                message: record.as_ref().map(|r| r.message.clone()),
                timestamp,
            },
            EngineEvent::Status { message } => Self::Status {
                message: message.clone(),
                timestamp,
            },
            EngineEvent::Error { title, message } => Self::Error {
                title: title.clone(),
                message: message.clone(),
                timestamp,
            },
            EngineEvent::Shutdown => Self::Shutdown { timestamp },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn to_value(event: &EngineEvent) -> Value {
        serde_json::to_value(HeadlessEvent::from(event)).unwrap()
    }

    #[test]
    fn test_event_tag_is_snake_case() {
        let value = to_value(&EngineEvent::TabCreated {
            tab: "Logger".into(),
        });
        assert_eq!(value["event"], "tab_created");
        assert_eq!(value["tab"], "Logger");
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn test_record_event_fields() {
        let mut extra = Fields::new();
        extra.insert("user".into(), json!("alice"));
        let record = RecordView {
            index: 3,
            created: 1000.0,
            time: "1970-01-01 00:16:40.000".into(),
            level: Some("INFO".into()),
            logger: Some("app.mod".into()),
            message: "hi".into(),
            exception: None,
            extra,
        };
        let value = to_value(&EngineEvent::Record {
            tab: "Logger".into(),
            record,
        });

        assert_eq!(value["event"], "record");
        assert_eq!(value["index"], 3);
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["logger"], "app.mod");
        assert_eq!(value["extra"]["user"], "alice");
        assert!(value.get("exception").is_none());
    }

    #[test]
    fn test_connection_opened_peer() {
        let value = to_value(&EngineEvent::ConnectionOpened {
            conn_id: 7,
            tab: "Logger".into(),
            peer: Some("127.0.0.1:5000".parse().unwrap()),
            benchmark: false,
        });
        assert_eq!(value["event"], "connection_opened");
        assert_eq!(value["peer"], "127.0.0.1:5000");
        assert_eq!(value["conn_id"], 7);
    }

    #[test]
    fn test_search_miss_has_null_index() {
        let value = to_value(&EngineEvent::SearchMatch {
            tab: "Logger".into(),
            record: None,
        });
        assert_eq!(value["event"], "search_match");
        assert!(value["index"].is_null());
    }

    #[test]
    fn test_shutdown_event() {
        let value = to_value(&EngineEvent::Shutdown);
        assert_eq!(value["event"], "shutdown");
    }
}

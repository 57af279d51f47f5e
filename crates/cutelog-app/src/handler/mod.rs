//! Handler module - TEA update function and event handlers
//!
//! Organized into submodules:
//! - `update`: Main update() function and message dispatch
//! - `server`: Server lifecycle, connection events and the benchmark monitor
//! - `tabs`: Tab management, record history and filters of the selected tab
//! - `presets`: Level and header presets

pub(crate) mod presets;
pub(crate) mod server;
pub(crate) mod tabs;
pub(crate) mod update;


use std::path::PathBuf;

use cutelog_core::LogRecord;
use cutelog_wire::ServerConfig;

use crate::message::Message;

// Re-export main entry point
pub use update::update;

/// Actions that the Engine should perform after update
#[derive(Debug, Clone)]
pub enum UpdateAction {
    /// Bind a new server generation
    StartServer(ServerConfig),

    /// Close the running generation in the background; it reports back with
    /// `ServerEvent::ServerStopped`
    StopServer,

    /// Ask the running generation's benchmark source to stop
    StopBenchmark,

    /// Start sampling the benchmark tab's ingestion rate
    StartMonitor,

    StopMonitor,

    /// Write a snapshot of a tab's records to disk
    SaveRecords {
        path: PathBuf,
        records: Vec<LogRecord>,
    },

    /// Read a records file into a new tab
    LoadRecords { path: PathBuf },
}

/// Result of processing a message
#[derive(Debug, Default)]
pub struct UpdateResult {
    /// Optional follow-up message to process
    pub message: Option<Message>,
    /// Optional action for the Engine to perform
    pub action: Option<UpdateAction>,
}

impl UpdateResult {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn message(msg: Message) -> Self {
        Self {
            message: Some(msg),
            action: None,
        }
    }

    pub fn action(action: UpdateAction) -> Self {
        Self {
            message: None,
            action: Some(action),
        }
    }
}

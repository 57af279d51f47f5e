//! Message types for the application (TEA pattern)

use std::net::SocketAddr;
use std::path::PathBuf;

use cutelog_core::{LogRecord, SearchMode};
use cutelog_wire::ServerEvent;

/// All possible messages/actions in the application
#[derive(Debug, Clone)]
pub enum Message {
    /// Request to quit; a second one while shutting down forces the exit
    Quit,

    /// Event from the running server generation
    Server(ServerEvent),

    // ─────────────────────────────────────────────────────────
    // Server Control
    // ─────────────────────────────────────────────────────────
    StartServer,
    StopServer,
    /// Stop, then start again once the old generation has finished
    RestartServer,
    /// The listener is bound
    ServerStarted { addr: SocketAddr },
    /// Binding the listener failed
    ServerStartFailed { error: String },
    /// Stop the synthetic source of the benchmark tab
    StopBenchmark,
    /// Benchmark monitor sampling period elapsed
    BenchmarkTick,

    // ─────────────────────────────────────────────────────────
    // Tab Management
    // ─────────────────────────────────────────────────────────
    SelectTab(String),
    RenameTab(String),
    CloseTab,
    MergeTabs {
        dst: String,
        srcs: Vec<String>,
        keep_alive: bool,
    },
    /// Route every new connection into the first tab
    SetSingleTabMode(bool),

    // ─────────────────────────────────────────────────────────
    // Records of the Selected Tab
    // ─────────────────────────────────────────────────────────
    TrimRecords(usize),
    SetMaxCapacity(usize),
    /// Re-emit every visible record
    DumpVisible,
    SaveRecords(PathBuf),
    RecordsSaved {
        path: PathBuf,
        error: Option<String>,
    },
    LoadRecords(PathBuf),
    RecordsLoaded {
        path: PathBuf,
        result: Result<Vec<LogRecord>, String>,
    },

    // ─────────────────────────────────────────────────────────
    // Filters of the Selected Tab
    // ─────────────────────────────────────────────────────────
    SetLevelEnabled { level: String, enabled: bool },
    EnableAllLevels,
    DisableAllLevels,
    /// Select namespace subtrees; `""` is the root
    SelectNamespaces(Vec<String>),
    SetIncludeChildren(bool),
    /// Unset options fall back to the `[search]` settings
    SetSearch {
        query: String,
        mode: Option<SearchMode>,
        case_sensitive: Option<bool>,
    },
    ClearSearch,
    FindNext,

    // ─────────────────────────────────────────────────────────
    // Presentation
    // ─────────────────────────────────────────────────────────
    SetColumnVisible { column: String, visible: bool },
    SetExtraMode(bool),

    // ─────────────────────────────────────────────────────────
    // Presets
    // ─────────────────────────────────────────────────────────
    LoadLevelPreset(String),
    SaveLevelPreset(String),
    DeleteLevelPreset(String),
    SetDefaultLevelPreset(String),
    LoadHeaderPreset(String),
    SaveHeaderPreset(String),
    DeleteHeaderPreset(String),
    SetDefaultHeaderPreset(String),

    /// A front-end could not interpret user input
    InvalidCommand(String),
}

//! cutelog-app - Tabs, filtering state and orchestration for cutelog
//!
//! This crate implements the TEA (The Elm Architecture) pattern for state
//! management: every server event and front-end command is a [`Message`] run
//! through [`handler::update`] by the [`Engine`], which owns all tabs and
//! broadcasts [`EngineEvent`]s. It also holds configuration and preset storage.

pub mod config;
pub mod engine;
pub mod engine_event;
pub mod handler;
pub mod message;
pub mod records_io;
pub mod signals;
pub mod state;
pub mod tab;
pub mod tab_manager;

// Re-export primary types
pub use config::{PresetStore, Settings};
pub use engine::Engine;
pub use engine_event::{EngineEvent, RecordView};
pub use handler::{UpdateAction, UpdateResult};
pub use message::Message;
pub use state::{AppPhase, AppState, ServerStatus};
pub use tab::{LoggerTab, TabId};
pub use tab_manager::TabManager;

// Re-export types front-ends need to build messages
pub use cutelog_core::SearchMode;
pub use cutelog_wire::SerializationFormat;

//! # cutelog-core - Core Domain Types
//!
//! Foundation crate for cutelog. Provides the log record model, per-tab level and
//! namespace registries, the bounded record store, filtering, and error handling.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, chrono, thiserror, regex, tracing).
//!
//! ## Public API
//!
//! ### Records (`record`, `store`, `export`)
//! - [`LogRecord`] - A normalized log event with ordered extra fields
//! - [`RecordStore`] - Bounded, arrival-ordered record sequence with eviction
//! - [`write_records()`], [`read_records()`] - JSON history export/import
//!
//! ### Levels (`level`)
//! - [`Level`] - Named severity with enabled flag and light/dark presentation
//! - [`LevelRegistry`] - Per-tab name → Level mapping and level filter predicate
//!
//! ### Namespaces (`namespace`)
//! - [`NamespaceTree`] - Arena tree of dot-separated logger names
//! - [`NamespaceFilter`] - Selection-based namespace predicate
//!
//! ### Filtering (`filter`, `search`, `header`)
//! - [`RecordFilter`] - Level, namespace, and search stages combined
//! - [`SearchFilter`] - Plain / regex / wildcard message search
//! - [`HeaderLayout`], [`Column`] - Column layout and extra-field view
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum with `fatal` vs `recoverable` classification
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait for adding error context
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use cutelog_core::prelude::*;
//! ```

pub mod error;
pub mod export;
pub mod filter;
pub mod header;
pub mod level;
pub mod logging;
pub mod namespace;
pub mod record;
pub mod search;
pub mod store;

/// Prelude for common imports used throughout all cutelog crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{Error, Result, ResultExt};
pub use export::{read_records, write_records};
pub use filter::RecordFilter;
pub use header::{default_columns, Column, HeaderLayout};
pub use level::{stock_levels, Level, LevelRegistry, Presentation, Rgb, STOCK_PRESET};
pub use namespace::{NamespaceFilter, NamespaceNode, NamespaceTree, NodeId, ROOT};
pub use record::{now_timestamp, Fields, LogRecord, DEFAULT_TIME_FORMAT};
pub use search::{SearchFilter, SearchMode};
pub use store::RecordStore;

//! Logger tab: one record stream with its own filters and connections

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Local};

use cutelog_core::prelude::*;
use cutelog_core::{
    Column, HeaderLayout, Level, LevelRegistry, LogRecord, NamespaceTree, RecordFilter,
    RecordStore, SearchFilter, ROOT,
};
use cutelog_wire::{ConnectionControl, ConnectionId, ConnectionInfo};

/// Unique identifier for a tab
pub type TabId = u64;

static TAB_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique tab ID
pub fn next_tab_id() -> TabId {
    TAB_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Settings a new tab starts from
#[derive(Debug, Clone)]
pub struct TabTemplate {
    pub max_capacity: usize,
    pub levels_preset: String,
    pub levels: Vec<Level>,
    pub header_preset: String,
    pub columns: Vec<Column>,
    pub extra_mode: bool,
}

impl Default for TabTemplate {
    fn default() -> Self {
        Self {
            max_capacity: 0,
            levels_preset: cutelog_core::STOCK_PRESET.to_string(),
            levels: cutelog_core::stock_levels(),
            header_preset: cutelog_core::STOCK_PRESET.to_string(),
            columns: cutelog_core::default_columns(),
            extra_mode: false,
        }
    }
}

/// A connection feeding a tab
#[derive(Debug, Clone)]
pub struct TabConnection {
    pub id: ConnectionId,
    pub control: ConnectionControl,
    pub benchmark: bool,
}

impl From<&ConnectionInfo> for TabConnection {
    fn from(info: &ConnectionInfo) -> Self {
        Self {
            id: info.id,
            control: info.control.clone(),
            benchmark: info.is_benchmark(),
        }
    }
}

/// A single log stream
#[derive(Debug)]
pub struct LoggerTab {
    pub id: TabId,

    /// Display name, unique among open tabs
    pub name: String,

    pub store: RecordStore,

    // ─────────────────────────────────────────────────────────
    // Filter State
    // ─────────────────────────────────────────────────────────
    pub levels: LevelRegistry,

    /// Every logger name seen by this tab
    pub tree: NamespaceTree,

    pub filter: RecordFilter,

    pub header: HeaderLayout,

    /// Show fields without a visible column as part of the message
    pub extra_mode: bool,

    /// Store index of the last search hit
    pub search_cursor: Option<usize>,

    // ─────────────────────────────────────────────────────────
    // Connections
    // ─────────────────────────────────────────────────────────
    connections: Vec<TabConnection>,

    /// Records received since the benchmark monitor last sampled this tab
    pub monitor_count: u64,

    pub created_at: DateTime<Local>,
}

impl LoggerTab {
    pub fn new(name: impl Into<String>, template: &TabTemplate) -> Self {
        Self {
            id: next_tab_id(),
            name: name.into(),
            store: RecordStore::new(template.max_capacity),
            levels: LevelRegistry::from_levels(&template.levels_preset, template.levels.clone()),
            tree: NamespaceTree::new(),
            filter: RecordFilter::new(),
            header: HeaderLayout::new(&template.header_preset, template.columns.clone()),
            extra_mode: template.extra_mode,
            search_cursor: None,
            connections: Vec::new(),
            monitor_count: 0,
            created_at: Local::now(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Records
    // ─────────────────────────────────────────────────────────

    /// Register a record's level and logger name without storing it
    fn observe(&mut self, record: &LogRecord) {
        if record.is_marker() {
            return;
        }
        if let Some(level) = &record.level_name {
            self.levels.resolve(level);
        }
        if let Some(name) = &record.logger_name {
            self.tree.register(name);
        }
    }

    /// Store a record received from a connection. Returns whether it is visible.
    pub fn on_record(&mut self, record: LogRecord) -> bool {
        self.observe(&record);
        self.monitor_count += 1;
        let visible = self.is_visible(&record);
        self.append(record);
        visible
    }

    /// Append the "connection closed" marker
    pub fn add_conn_closed_record(&mut self, conn_id: ConnectionId) -> bool {
        let record = LogRecord::connection_closed(conn_id);
        let visible = self.is_visible(&record);
        self.append(record);
        visible
    }

    /// Store a record, keeping the search cursor on the same record across eviction
    fn append(&mut self, record: LogRecord) {
        let evicted = self.store.add_record(record);
        if evicted > 0 {
            self.search_cursor = self.search_cursor.and_then(|c| c.checked_sub(evicted));
        }
    }

    /// Merge another history into this one, re-sorting by time.
    pub fn merge_records(&mut self, records: Vec<LogRecord>) -> usize {
        for record in &records {
            self.observe(record);
        }
        self.search_cursor = None;
        self.store.merge_with(records)
    }

    pub fn is_visible(&self, record: &LogRecord) -> bool {
        self.filter.accepts(record, &self.levels, &self.tree)
    }

    /// Records passing every filter stage, with their store index
    pub fn visible_records(&self) -> impl Iterator<Item = (usize, &LogRecord)> {
        self.store
            .iter()
            .enumerate()
            .filter(|(_, r)| self.is_visible(r))
    }

    pub fn visible_count(&self) -> usize {
        self.visible_records().count()
    }

    /// Store index of the next visible record after `start`, wrapping around.
    ///
    /// Returns None when no search is active or nothing matches.
    pub fn find_next(&self, start: Option<usize>) -> Option<usize> {
        self.filter.search.as_ref()?;
        let mut first = None;
        for (index, _) in self.visible_records() {
            if start.map_or(true, |s| index > s) {
                return Some(index);
            }
            first.get_or_insert(index);
        }
        first
    }

    /// Message text as shown in the message column
    pub fn render_message(&self, record: &LogRecord, word_wrap: bool) -> String {
        if self.extra_mode {
            self.header.message_with_extra(record, word_wrap)
        } else {
            record.display_message().unwrap_or_default().to_string()
        }
    }

    /// Keep only the newest `n` records
    pub fn trim(&mut self, n: usize) -> usize {
        self.search_cursor = None;
        self.store.trim_except_last_n(n)
    }

    pub fn set_capacity(&mut self, max_capacity: usize) -> usize {
        self.search_cursor = None;
        self.store.set_capacity(max_capacity)
    }

    // ─────────────────────────────────────────────────────────
    // Filters
    // ─────────────────────────────────────────────────────────

    pub fn set_level_enabled(&mut self, name: &str, enabled: bool) -> bool {
        self.levels.set_enabled(name, enabled)
    }

    pub fn apply_level_preset(&mut self, preset_name: &str, levels: Vec<Level>) {
        self.levels.apply_preset(preset_name, levels);
    }

    /// Select namespace subtrees by path; `""` selects the root.
    ///
    /// Unknown paths are skipped and returned.
    pub fn select_namespaces<S: AsRef<str>>(&mut self, paths: &[S]) -> Vec<String> {
        let mut ids = Vec::new();
        let mut unknown = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if path.is_empty() {
                ids.push(ROOT);
            } else {
                match self.tree.get(path) {
                    Some(id) => ids.push(id),
                    None => unknown.push(path.to_string()),
                }
            }
        }
        self.filter.namespaces.set_selection(ids);
        unknown
    }

    pub fn set_include_children(&mut self, include: bool) {
        self.filter.namespaces.set_include_children(include);
    }

    pub fn set_search(&mut self, search: Option<SearchFilter>) {
        self.filter.search = search;
        self.search_cursor = None;
    }

    /// Advance the search cursor to the next hit
    pub fn advance_search(&mut self) -> Option<usize> {
        self.search_cursor = self.find_next(self.search_cursor);
        self.search_cursor
    }

    // ─────────────────────────────────────────────────────────
    // Connections
    // ─────────────────────────────────────────────────────────

    pub fn add_connection(&mut self, connection: TabConnection) {
        debug!("Tab \"{}\" now owns connection id={}", self.name, connection.id);
        self.connections.push(connection);
    }

    /// Forget a finished connection. Returns false if it was not ours.
    pub fn remove_connection(&mut self, conn_id: ConnectionId) -> bool {
        let before = self.connections.len();
        self.connections.retain(|c| c.id != conn_id);
        self.connections.len() != before
    }

    pub fn connections(&self) -> &[TabConnection] {
        &self.connections
    }

    pub fn has_connection(&self, conn_id: ConnectionId) -> bool {
        self.connections.iter().any(|c| c.id == conn_id)
    }

    pub fn is_benchmark(&self) -> bool {
        self.connections.iter().any(|c| c.benchmark)
    }

    /// Hand all connections over to another tab
    pub fn take_connections(&mut self) -> Vec<TabConnection> {
        std::mem::take(&mut self.connections)
    }

    /// Tell every connection its tab is gone and drop the history.
    pub fn destroy(&mut self) {
        for connection in self.connections.drain(..) {
            connection.control.close_tab();
        }
        self.store.clear();
        debug!("Tab \"{}\" destroyed", self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutelog_core::{Fields, SearchMode};
    use serde_json::json;

    fn record(value: serde_json::Value) -> LogRecord {
        match value {
            serde_json::Value::Object(map) => LogRecord::from_fields(map),
            _ => LogRecord::from_fields(Fields::new()),
        }
    }

    fn tab() -> LoggerTab {
        LoggerTab::new("Logger", &TabTemplate::default())
    }

    #[test]
    fn test_tab_ids_are_unique() {
        assert_ne!(tab().id, tab().id);
    }

    #[test]
    fn test_on_record_registers_level_and_namespace() {
        let mut tab = tab();
        assert!(tab.on_record(record(json!({"msg": "hi", "levelname": "trace", "name": "app.mod"}))));

        assert_eq!(tab.store.len(), 1);
        assert!(tab.levels.get("TRACE").is_some());
        assert!(tab.tree.get("app").is_some());
        assert!(tab.tree.get("app.mod").is_some());
        assert_eq!(tab.monitor_count, 1);
    }

    #[test]
    fn test_disabled_level_hides_record() {
        let mut tab = tab();
        tab.set_level_enabled("DEBUG", false);
        assert!(!tab.on_record(record(json!({"msg": "x", "levelname": "debug"}))));
        assert!(tab.on_record(record(json!({"msg": "y", "levelname": "info"}))));
        assert!(tab.on_record(record(json!({"msg": "no level"}))));
        assert_eq!(tab.store.len(), 3);
        assert_eq!(tab.visible_count(), 2);
    }

    #[test]
    fn test_namespace_selection() {
        let mut tab = tab();
        tab.on_record(record(json!({"msg": "1", "name": "a.b.c"})));
        tab.on_record(record(json!({"msg": "2", "name": "a.x"})));
        tab.add_conn_closed_record(3);

        let unknown = tab.select_namespaces(&["a.b", "nope"]);
        assert_eq!(unknown, vec!["nope"]);
        let visible: Vec<_> = tab
            .visible_records()
            .map(|(_, r)| r.display_message().unwrap().to_string())
            .collect();
        assert_eq!(visible, vec!["1"]);

        tab.select_namespaces(&[""]);
        assert_eq!(tab.visible_count(), 3);
    }

    #[test]
    fn test_find_next_wraps_around() {
        let mut tab = tab();
        for msg in ["apple", "banana", "apricot", "cherry"] {
            tab.on_record(record(json!({ "msg": msg })));
        }
        assert_eq!(tab.find_next(None), None);

        tab.set_search(Some(SearchFilter::new("ap", SearchMode::Plain, false).unwrap()));
        assert_eq!(tab.find_next(None), Some(0));
        assert_eq!(tab.find_next(Some(0)), Some(2));
        assert_eq!(tab.find_next(Some(2)), Some(0));

        assert_eq!(tab.advance_search(), Some(0));
        assert_eq!(tab.advance_search(), Some(2));
        assert_eq!(tab.advance_search(), Some(0));
    }

    #[test]
    fn test_search_cursor_follows_eviction() {
        let template = TabTemplate {
            max_capacity: 3,
            ..TabTemplate::default()
        };
        let mut tab = LoggerTab::new("Logger", &template);
        for msg in ["ap 1", "x", "ap 2"] {
            tab.on_record(record(json!({ "msg": msg })));
        }
        tab.set_search(Some(SearchFilter::new("ap", SearchMode::Plain, false).unwrap()));
        assert_eq!(tab.advance_search(), Some(0));

        // "ap 1" under the cursor is evicted
        tab.on_record(record(json!({"msg": "ap 3"})));
        assert_eq!(tab.search_cursor, None);
        assert_eq!(tab.advance_search(), Some(1));

        // "ap 2" moves from index 1 to 0
        tab.on_record(record(json!({"msg": "y"})));
        assert_eq!(tab.search_cursor, Some(0));
        assert_eq!(tab.advance_search(), Some(1));
        assert_eq!(tab.store.get(1).unwrap().message.as_deref(), Some("ap 3"));
    }

    #[test]
    fn test_merge_resets_search_cursor() {
        let mut tab = tab();
        tab.on_record(record(json!({"msg": "ap", "created": 1.0})));
        tab.set_search(Some(SearchFilter::new("ap", SearchMode::Plain, false).unwrap()));
        assert_eq!(tab.advance_search(), Some(0));

        tab.merge_records(vec![record(json!({"msg": "ap early", "created": 0.5}))]);
        assert_eq!(tab.search_cursor, None);
        assert_eq!(tab.advance_search(), Some(0));
        assert_eq!(tab.store.get(0).unwrap().message.as_deref(), Some("ap early"));
    }

    #[test]
    fn test_merge_records_sorts_by_time() {
        let mut tab = tab();
        for t in [1.0, 3.0, 5.0] {
            tab.on_record(record(json!({"msg": "a", "created": t})));
        }
        let other: Vec<_> = [2.0, 4.0]
            .into_iter()
            .map(|t| record(json!({"msg": "b", "created": t, "levelname": "custom"})))
            .collect();
        tab.merge_records(other);

        let times: Vec<f64> = tab.store.iter().map(|r| r.created).collect();
        assert_eq!(times, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(tab.levels.get("CUSTOM").is_some());
    }

    #[test]
    fn test_destroy_flags_connections() {
        let mut tab = tab();
        let control = ConnectionControl::new();
        tab.add_connection(TabConnection {
            id: 5,
            control: control.clone(),
            benchmark: false,
        });
        tab.on_record(record(json!({"msg": "x"})));

        tab.destroy();
        assert!(control.is_tab_closed());
        assert!(tab.connections().is_empty());
        assert!(tab.store.is_empty());
    }

    #[test]
    fn test_remove_connection() {
        let mut tab = tab();
        tab.add_connection(TabConnection {
            id: 1,
            control: ConnectionControl::new(),
            benchmark: true,
        });
        assert!(tab.is_benchmark());
        assert!(tab.remove_connection(1));
        assert!(!tab.remove_connection(1));
        assert!(!tab.is_benchmark());
    }

    #[test]
    fn test_render_message_extra_mode() {
        let mut tab = tab();
        let rec = record(json!({"msg": "line1\nline2", "user": "bob"}));
        assert_eq!(tab.render_message(&rec, true), "line1\nline2");

        tab.extra_mode = true;
        assert_eq!(tab.render_message(&rec, false), "line1\nuser=bob");
    }
}

//! Manages the open tabs and routes connections to them

use std::collections::HashMap;

use cutelog_core::prelude::*;
use cutelog_core::LogRecord;
use cutelog_wire::{ConnectionId, ConnectionInfo};

use crate::tab::{LoggerTab, TabConnection, TabId, TabTemplate};

/// Base name for tabs created by a connection
pub const DEFAULT_TAB_NAME: &str = "Logger";

/// Where a new connection ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routed {
    pub tab_id: TabId,
    /// Whether a tab was created for the connection
    pub created: bool,
}

/// A connection detached from its tab
#[derive(Debug, Clone)]
pub struct Finished {
    pub tab_id: TabId,
    pub connection: TabConnection,
    /// Whether the closed marker passes the tab's filters
    pub marker_visible: bool,
}

/// Open tabs in display order plus the connection routing table
#[derive(Debug, Default)]
pub struct TabManager {
    tabs: HashMap<TabId, LoggerTab>,

    /// Tab order as displayed
    order: Vec<TabId>,

    selected: Option<TabId>,

    /// Tab currently receiving each live connection
    routes: HashMap<ConnectionId, TabId>,
}

impl TabManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tabs in display order
    pub fn iter(&self) -> impl Iterator<Item = &LoggerTab> {
        self.order.iter().filter_map(|id| self.tabs.get(id))
    }

    pub fn get(&self, id: TabId) -> Option<&LoggerTab> {
        self.tabs.get(&id)
    }

    pub fn get_mut(&mut self, id: TabId) -> Option<&mut LoggerTab> {
        self.tabs.get_mut(&id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<TabId> {
        self.iter().find(|t| t.name == name).map(|t| t.id)
    }

    pub fn selected_id(&self) -> Option<TabId> {
        self.selected
    }

    pub fn selected(&self) -> Option<&LoggerTab> {
        self.selected.and_then(|id| self.tabs.get(&id))
    }

    pub fn selected_mut(&mut self) -> Option<&mut LoggerTab> {
        self.selected.and_then(|id| self.tabs.get_mut(&id))
    }

    pub fn select(&mut self, id: TabId) -> bool {
        if self.tabs.contains_key(&id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    /// `name`, or `name 1`, `name 2`, ... if it is taken
    pub fn unique_name(&self, name: &str) -> String {
        let mut candidate = name.to_string();
        let mut counter = 1;
        while self.find_by_name(&candidate).is_some() {
            candidate = format!("{} {}", name, counter);
            counter += 1;
        }
        candidate
    }

    /// Open a tab named after `name` and select it
    pub fn create_tab(&mut self, name: &str, template: &TabTemplate) -> TabId {
        let tab = LoggerTab::new(self.unique_name(name), template);
        let id = tab.id;
        debug!("Created tab \"{}\" (id={})", tab.name, id);
        self.tabs.insert(id, tab);
        self.order.push(id);
        self.selected = Some(id);
        id
    }

    pub fn rename(&mut self, id: TabId, new_name: &str) -> Result<()> {
        if let Some(existing) = self.find_by_name(new_name) {
            if existing != id {
                return Err(Error::tab_name_taken(new_name));
            }
        }
        let tab = self
            .tabs
            .get_mut(&id)
            .ok_or_else(|| Error::tab_not_found(id.to_string()))?;
        debug!("Renaming tab \"{}\" to \"{}\"", tab.name, new_name);
        tab.name = new_name.to_string();
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Connection routing
    // ─────────────────────────────────────────────────────────

    /// Attach a new connection to a tab.
    ///
    /// In single-tab mode the first tab receives it (cleared first when
    /// `clear_on_connect` is set); otherwise, or when no tab is open, a new tab
    /// is created.
    pub fn route_new_connection(
        &mut self,
        info: &ConnectionInfo,
        template: &TabTemplate,
        single_tab_mode: bool,
        clear_on_connect: bool,
    ) -> Routed {
        let existing = if single_tab_mode {
            self.order.first().copied()
        } else {
            None
        };

        let routed = match existing {
            Some(tab_id) => {
                if clear_on_connect {
                    if let Some(tab) = self.tabs.get_mut(&tab_id) {
                        tab.store.clear();
                        tab.search_cursor = None;
                    }
                }
                Routed {
                    tab_id,
                    created: false,
                }
            }
            None => Routed {
                tab_id: self.create_tab(DEFAULT_TAB_NAME, template),
                created: true,
            },
        };

        if let Some(tab) = self.tabs.get_mut(&routed.tab_id) {
            tab.add_connection(TabConnection::from(info));
        }
        self.routes.insert(info.id, routed.tab_id);
        routed
    }

    pub fn route_of(&self, conn_id: ConnectionId) -> Option<TabId> {
        self.routes.get(&conn_id).copied()
    }

    /// Deliver a record to the tab owning `conn_id`.
    ///
    /// Returns the tab and whether the record passes its filters.
    pub fn deliver(&mut self, conn_id: ConnectionId, record: LogRecord) -> Option<(TabId, bool)> {
        let tab_id = self.route_of(conn_id)?;
        let tab = self.tabs.get_mut(&tab_id)?;
        Some((tab_id, tab.on_record(record)))
    }

    /// Detach a finished connection and append the closed marker to its tab.
    pub fn finish_connection(&mut self, conn_id: ConnectionId) -> Option<Finished> {
        let tab_id = self.routes.remove(&conn_id)?;
        let tab = self.tabs.get_mut(&tab_id)?;
        let connection = tab
            .connections()
            .iter()
            .find(|c| c.id == conn_id)
            .cloned()?;
        tab.remove_connection(conn_id);
        let marker_visible = tab.add_conn_closed_record(conn_id);
        Some(Finished {
            tab_id,
            connection,
            marker_visible,
        })
    }

    /// Tab running the synthetic benchmark source, if any
    pub fn benchmark_tab(&self) -> Option<TabId> {
        self.iter().find(|t| t.is_benchmark()).map(|t| t.id)
    }

    // ─────────────────────────────────────────────────────────
    // Closing and merging
    // ─────────────────────────────────────────────────────────

    /// Close a tab, flagging its connections. Returns the closed tab's name.
    pub fn close_tab(&mut self, id: TabId) -> Option<String> {
        let mut tab = self.tabs.remove(&id)?;
        let position = self.order.iter().position(|t| *t == id);
        self.order.retain(|t| *t != id);
        self.routes.retain(|_, t| *t != id);
        tab.destroy();

        if self.selected == Some(id) {
            self.selected = position
                .and_then(|p| self.order.get(p.min(self.order.len().saturating_sub(1))))
                .copied();
        }
        Some(tab.name)
    }

    /// Close every tab
    pub fn close_all(&mut self) -> Vec<String> {
        let ids = self.order.clone();
        ids.into_iter().filter_map(|id| self.close_tab(id)).collect()
    }

    /// Merge the histories of `srcs` into `dst` and close the sources.
    ///
    /// With `keep_alive` the sources' live connections keep feeding `dst`;
    /// otherwise they are told their tab closed. Returns the closed tab names.
    pub fn merge(&mut self, dst: TabId, srcs: &[TabId], keep_alive: bool) -> Result<Vec<String>> {
        if !self.tabs.contains_key(&dst) {
            return Err(Error::tab_not_found(dst.to_string()));
        }
        if let Some(missing) = srcs.iter().find(|id| !self.tabs.contains_key(id)) {
            return Err(Error::tab_not_found(missing.to_string()));
        }

        let mut closed = Vec::new();
        for &src_id in srcs {
            if src_id == dst {
                continue;
            }
            let Some(src) = self.tabs.get_mut(&src_id) else {
                continue;
            };
            let records = src.store.take_records();
            let connections = if keep_alive {
                src.take_connections()
            } else {
                Vec::new()
            };

            if let Some(dst_tab) = self.tabs.get_mut(&dst) {
                debug!(
                    "Merging {} records into \"{}\" (keep_alive={})",
                    records.len(),
                    dst_tab.name,
                    keep_alive
                );
                dst_tab.merge_records(records);
                for connection in connections {
                    self.routes.insert(connection.id, dst);
                    dst_tab.add_connection(connection);
                }
            }

            if let Some(name) = self.close_tab(src_id) {
                closed.push(name);
            }
        }
        self.selected = Some(dst);
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cutelog_core::Fields;
    use cutelog_wire::{ConnectionControl, SourceKind};
    use serde_json::json;

    fn info(id: ConnectionId) -> ConnectionInfo {
        ConnectionInfo {
            id,
            kind: SourceKind::Socket {
                peer: "127.0.0.1:40000".parse().unwrap(),
            },
            control: ConnectionControl::new(),
        }
    }

    fn record(msg: &str, created: f64) -> LogRecord {
        let mut fields = Fields::new();
        fields.insert("msg".into(), json!(msg));
        fields.insert("created".into(), json!(created));
        LogRecord::from_fields(fields)
    }

    #[test]
    fn test_unique_names() {
        let mut tabs = TabManager::new();
        let template = TabTemplate::default();
        let a = tabs.create_tab("Logger", &template);
        let b = tabs.create_tab("Logger", &template);
        let c = tabs.create_tab("Logger", &template);
        assert_eq!(tabs.get(a).unwrap().name, "Logger");
        assert_eq!(tabs.get(b).unwrap().name, "Logger 1");
        assert_eq!(tabs.get(c).unwrap().name, "Logger 2");
        assert_eq!(tabs.selected_id(), Some(c));
    }

    #[test]
    fn test_rename_rejects_duplicates() {
        let mut tabs = TabManager::new();
        let template = TabTemplate::default();
        let a = tabs.create_tab("Logger", &template);
        tabs.create_tab("Other", &template);

        assert!(matches!(
            tabs.rename(a, "Other"),
            Err(Error::TabNameTaken { .. })
        ));
        tabs.rename(a, "Logger").unwrap();
        tabs.rename(a, "Renamed").unwrap();
        assert_eq!(tabs.find_by_name("Renamed"), Some(a));
    }

    #[test]
    fn test_each_connection_gets_a_tab() {
        let mut tabs = TabManager::new();
        let template = TabTemplate::default();
        let first = tabs.route_new_connection(&info(1), &template, false, false);
        let second = tabs.route_new_connection(&info(2), &template, false, false);
        assert!(first.created && second.created);
        assert_ne!(first.tab_id, second.tab_id);
        assert_eq!(tabs.route_of(2), Some(second.tab_id));
    }

    #[test]
    fn test_single_tab_mode_reuses_first_tab() {
        let mut tabs = TabManager::new();
        let template = TabTemplate::default();
        let first = tabs.route_new_connection(&info(1), &template, true, true);
        tabs.deliver(1, record("old", 1.0));

        let second = tabs.route_new_connection(&info(2), &template, true, true);
        assert!(!second.created);
        assert_eq!(second.tab_id, first.tab_id);
        assert!(tabs.get(first.tab_id).unwrap().store.is_empty());
        assert_eq!(tabs.get(first.tab_id).unwrap().connections().len(), 2);
    }

    #[test]
    fn test_deliver_and_finish() {
        let mut tabs = TabManager::new();
        let routed = tabs.route_new_connection(&info(7), &TabTemplate::default(), false, false);

        let (tab_id, visible) = tabs.deliver(7, record("hello", 1.0)).unwrap();
        assert_eq!(tab_id, routed.tab_id);
        assert!(visible);
        assert!(tabs.deliver(99, record("stray", 1.0)).is_none());

        let finished = tabs.finish_connection(7).unwrap();
        assert_eq!(finished.connection.id, 7);
        assert!(finished.marker_visible);
        let tab = tabs.get(finished.tab_id).unwrap();
        assert!(tab.store.last().unwrap().is_marker());
        assert!(tab.connections().is_empty());
        assert!(tabs.finish_connection(7).is_none());
    }

    #[test]
    fn test_close_tab_flags_connections_and_drops_routes() {
        let mut tabs = TabManager::new();
        let conn = info(3);
        let control = conn.control.clone();
        let routed = tabs.route_new_connection(&conn, &TabTemplate::default(), false, false);

        assert_eq!(tabs.close_tab(routed.tab_id).as_deref(), Some("Logger"));
        assert!(control.is_tab_closed());
        assert!(tabs.route_of(3).is_none());
        assert!(tabs.selected_id().is_none());
        assert!(tabs.finish_connection(3).is_none());
    }

    #[test]
    fn test_merge_keep_alive_reroutes_connections() {
        let mut tabs = TabManager::new();
        let template = TabTemplate::default();
        let dst = tabs.route_new_connection(&info(1), &template, false, false).tab_id;
        let src_conn = info(2);
        let control = src_conn.control.clone();
        let src = tabs.route_new_connection(&src_conn, &template, false, false).tab_id;

        tabs.deliver(1, record("a", 1.0));
        tabs.deliver(2, record("b", 0.5));
        tabs.deliver(1, record("c", 2.0));

        let closed = tabs.merge(dst, &[src], true).unwrap();
        assert_eq!(closed, vec!["Logger 1"]);
        assert!(!control.is_tab_closed());
        assert_eq!(tabs.route_of(2), Some(dst));

        let messages: Vec<_> = tabs
            .get(dst)
            .unwrap()
            .store
            .iter()
            .map(|r| r.message.clone().unwrap())
            .collect();
        assert_eq!(messages, vec!["b", "a", "c"]);
        assert_eq!(tabs.len(), 1);
    }

    #[test]
    fn test_merge_without_keep_alive_closes_sources() {
        let mut tabs = TabManager::new();
        let template = TabTemplate::default();
        let dst = tabs.create_tab("Logger", &template);
        let src_conn = info(5);
        let control = src_conn.control.clone();
        let src = tabs.route_new_connection(&src_conn, &template, false, false).tab_id;

        tabs.merge(dst, &[src], false).unwrap();
        assert!(control.is_tab_closed());
        assert!(tabs.route_of(5).is_none());
        assert!(matches!(
            tabs.merge(dst, &[src], false),
            Err(Error::TabNotFound { .. })
        ));
    }

    #[test]
    fn test_close_selects_neighbour() {
        let mut tabs = TabManager::new();
        let template = TabTemplate::default();
        let a = tabs.create_tab("a", &template);
        let b = tabs.create_tab("b", &template);
        tabs.select(a);
        tabs.close_tab(a);
        assert_eq!(tabs.selected_id(), Some(b));
    }
}

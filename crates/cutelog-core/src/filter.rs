//! Combined record visibility predicate

use crate::level::LevelRegistry;
use crate::namespace::{NamespaceFilter, NamespaceTree};
use crate::record::LogRecord;
use crate::search::SearchFilter;

/// Per-tab filter state: namespace selection plus an optional text search.
///
/// Level state lives in the tab's [`LevelRegistry`]; it is passed in alongside
/// the namespace tree when evaluating a record.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub namespaces: NamespaceFilter,
    pub search: Option<SearchFilter>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `record` is visible: level check, then namespace, then search.
    pub fn accepts(&self, record: &LogRecord, levels: &LevelRegistry, tree: &NamespaceTree) -> bool {
        if !levels.contains(record.level_name.as_deref()) {
            return false;
        }
        if !self.namespaces.matches(tree, record.logger_name.as_deref()) {
            return false;
        }
        match &self.search {
            Some(search) => search.matches(record.display_message()),
            None => true,
        }
    }

    /// Whether any stage besides the level check can hide records
    pub fn is_active(&self) -> bool {
        self.namespaces.is_active() || self.search.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Fields;
    use crate::search::SearchMode;
    use serde_json::json;

    fn record(name: Option<&str>, level: Option<&str>, msg: &str) -> LogRecord {
        let mut fields = Fields::new();
        if let Some(name) = name {
            fields.insert("name".into(), json!(name));
        }
        if let Some(level) = level {
            fields.insert("levelname".into(), json!(level));
        }
        fields.insert("msg".into(), json!(msg));
        LogRecord::from_fields(fields)
    }

    #[test]
    fn test_default_filter_accepts_known_levels() {
        let filter = RecordFilter::new();
        let levels = LevelRegistry::new();
        let tree = NamespaceTree::new();
        assert!(filter.accepts(&record(Some("a"), Some("INFO"), "x"), &levels, &tree));
        assert!(filter.accepts(&record(None, None, "x"), &levels, &tree));
        assert!(!filter.is_active());
    }

    #[test]
    fn test_level_then_namespace_then_search() {
        let mut levels = LevelRegistry::new();
        let mut tree = NamespaceTree::new();
        tree.register("app.db");
        tree.register("app.web");

        let mut filter = RecordFilter::new();
        filter.namespaces.select(tree.get("app.db").unwrap());
        filter.search = Some(SearchFilter::new("slow", SearchMode::Plain, false).unwrap());
        assert!(filter.is_active());

        let visible = record(Some("app.db"), Some("WARNING"), "slow query");
        assert!(filter.accepts(&visible, &levels, &tree));

        assert!(!filter.accepts(&record(Some("app.web"), Some("WARNING"), "slow"), &levels, &tree));
        assert!(!filter.accepts(&record(Some("app.db"), Some("WARNING"), "fast"), &levels, &tree));

        levels.set_enabled("WARNING", false);
        assert!(!filter.accepts(&visible, &levels, &tree));
    }

    #[test]
    fn test_marker_fails_namespace_selection() {
        let levels = LevelRegistry::new();
        let mut tree = NamespaceTree::new();
        tree.register("a");
        let mut filter = RecordFilter::new();
        let marker = LogRecord::connection_closed(1);
        assert!(filter.accepts(&marker, &levels, &tree));

        filter.namespaces.select(tree.get("a").unwrap());
        assert!(!filter.accepts(&marker, &levels, &tree));
    }
}

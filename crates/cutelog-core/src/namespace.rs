//! Logger namespace tree and the namespace filter
//!
//! Logger names such as `app.db.pool` form a tree rooted at the empty path.
//! Nodes live in an arena and refer to their parent by index, so the tree has no
//! reference cycles and node ids stay valid for the lifetime of the tab.

use std::collections::{BTreeSet, HashMap};

/// Index of a node inside a [`NamespaceTree`]
pub type NodeId = usize;

/// The root node; its path is the empty string
pub const ROOT: NodeId = 0;

/// Deepest level of the tree below the root
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone)]
pub struct NamespaceNode {
    /// Last path segment (empty for the root)
    pub segment: String,
    /// Full dot-joined path from the root
    pub path: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Per-tab registry of every logger name seen, as a tree.
#[derive(Debug, Clone)]
pub struct NamespaceTree {
    nodes: Vec<NamespaceNode>,
    registry: HashMap<String, NodeId>,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    pub fn new() -> Self {
        let root = NamespaceNode {
            segment: String::new(),
            path: String::new(),
            parent: None,
            children: Vec::new(),
        };
        let mut registry = HashMap::new();
        registry.insert(String::new(), ROOT);
        Self {
            nodes: vec![root],
            registry,
        }
    }

    /// Register a full logger name, creating any missing ancestors.
    ///
    /// Idempotent: registering an existing name returns its node unchanged.
    /// Names nested deeper than [`MAX_DEPTH`] keep the remainder as one leaf segment.
    pub fn register(&mut self, full_name: &str) -> NodeId {
        if let Some(&id) = self.registry.get(full_name) {
            return id;
        }

        let mut parent = ROOT;
        let mut end = 0;
        for (depth, segment) in full_name.splitn(MAX_DEPTH, '.').enumerate() {
            end += if depth == 0 { segment.len() } else { segment.len() + 1 };
            let path = &full_name[..end];
            parent = match self.registry.get(path) {
                Some(&id) => id,
                None => self.insert_node(parent, segment, path),
            };
        }
        parent
    }

    fn insert_node(&mut self, parent: NodeId, segment: &str, path: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NamespaceNode {
            segment: segment.to_string(),
            path: path.to_string(),
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        self.registry.insert(path.to_string(), id);
        id
    }

    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.registry.get(path).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&NamespaceNode> {
        self.nodes.get(id)
    }

    pub fn path(&self, id: NodeId) -> Option<&str> {
        self.nodes.get(id).map(|n| n.path.as_str())
    }

    /// Whether `id` lies strictly below `ancestor`
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.nodes.get(id).and_then(|n| n.parent);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes[node].parent;
        }
        false
    }

    /// Paths of every registered node in depth-first order, root excluded
    pub fn paths(&self) -> Vec<&str> {
        let mut out = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: Vec<NodeId> = self.nodes[ROOT].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            out.push(node.path.as_str());
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Number of registered names, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

/// Selection-based filter over a [`NamespaceTree`].
#[derive(Debug, Clone)]
pub struct NamespaceFilter {
    selected: BTreeSet<NodeId>,
    include_children: bool,
}

impl Default for NamespaceFilter {
    fn default() -> Self {
        Self {
            selected: BTreeSet::new(),
            include_children: true,
        }
    }
}

impl NamespaceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: NodeId) {
        self.selected.insert(id);
    }

    pub fn deselect(&mut self, id: NodeId) {
        self.selected.remove(&id);
    }

    /// Replace the whole selection
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selected = ids.into_iter().collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.selected.iter().copied()
    }

    pub fn include_children(&self) -> bool {
        self.include_children
    }

    pub fn set_include_children(&mut self, include: bool) {
        self.include_children = include;
    }

    pub fn is_active(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Namespace filter predicate.
    ///
    /// - nothing selected: everything passes
    /// - root selected: everything passes
    /// - a record without a logger name fails
    /// - otherwise the name must equal a selected path or, with
    ///   `include_children`, lie below one (`path.` prefix)
    pub fn matches(&self, tree: &NamespaceTree, logger_name: Option<&str>) -> bool {
        if self.selected.is_empty() || self.selected.contains(&ROOT) {
            return true;
        }
        let Some(name) = logger_name else {
            return false;
        };

        self.selected
            .iter()
            .filter_map(|&id| tree.path(id))
            .any(|path| {
                name == path
                    || (self.include_children
                        && name
                            .strip_prefix(path)
                            .is_some_and(|rest| rest.starts_with('.')))
            })
    }
}

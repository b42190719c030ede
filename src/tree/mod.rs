//! Lazily-loaded navigation tree
//!
//! Nodes are stored in a flat arena and addressed by [`NodeIndex`]; parent
//! links are plain indices. Each node also has a string identity derived from
//! its ancestor path, so background loads can re-resolve their target after
//! the fact instead of holding on to an index.
//!
//! Nodes are never removed individually. A reconnect replaces the whole model.

pub mod node;

pub use node::{NodeDescriptor, NodeIndex, NodeKind, NodeMeta, TreeNode};

use crate::fuzzy::FuzzyMatcher;
use std::collections::{HashMap, HashSet};

/// Result of [`TreeModel::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Node is not loaded yet; it is now marked expanded and needs its children fetched
    NeedsLoad,
    Expanded,
    Collapsed,
    /// Leaf, or a loaded node without children
    Unchanged,
}

pub struct TreeModel {
    nodes: Vec<TreeNode>,
    by_id: HashMap<String, NodeIndex>,
}

impl TreeModel {
    /// Create a tree holding only the (always expanded) root
    pub fn new(root_label: impl Into<String>) -> Self {
        let root = TreeNode {
            id: NodeKind::Root.prefix().to_string(),
            label: root_label.into(),
            kind: NodeKind::Root,
            expanded: true,
            loaded: false,
            selectable: false,
            meta: NodeMeta::None,
            parent: None,
            children: Vec::new(),
        };
        let mut by_id = HashMap::new();
        by_id.insert(root.id.clone(), NodeIndex(0));
        Self {
            nodes: vec![root],
            by_id,
        }
    }

    pub fn root(&self) -> NodeIndex {
        NodeIndex(0)
    }

    /// Number of nodes including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index.0)
    }

    /// Resolve a node identity. Absence is normal (e.g. the tree was rebuilt).
    pub fn find_by_id(&self, id: &str) -> Option<NodeIndex> {
        self.by_id.get(id).copied()
    }

    /// Append children under `parent` and mark it loaded.
    /// Returns the indices of the new nodes; leaf parents accept nothing.
    pub fn add_children(
        &mut self,
        parent: NodeIndex,
        children: Vec<NodeDescriptor>,
    ) -> Vec<NodeIndex> {
        let Some(parent_node) = self.nodes.get(parent.0) else {
            return Vec::new();
        };
        if parent_node.kind.is_leaf() {
            return Vec::new();
        }
        let parent_id = parent_node.id.clone();
        let parent_is_root = parent_node.kind == NodeKind::Root;

        let mut added = Vec::with_capacity(children.len());
        for desc in children {
            let base = if parent_is_root {
                format!("{}:{}", desc.kind.prefix(), desc.label)
            } else {
                format!("{}/{}:{}", parent_id, desc.kind.prefix(), desc.label)
            };
            let id = self.unique_id(base);
            let index = NodeIndex(self.nodes.len());
            self.nodes.push(TreeNode {
                id: id.clone(),
                label: desc.label,
                kind: desc.kind,
                expanded: false,
                // Leaves have nothing to load
                loaded: desc.kind.is_leaf(),
                selectable: desc.kind.is_relation(),
                meta: desc.meta,
                parent: Some(parent),
                children: Vec::new(),
            });
            self.by_id.insert(id, index);
            added.push(index);
        }

        let parent_node = &mut self.nodes[parent.0];
        parent_node.children.extend_from_slice(&added);
        parent_node.loaded = true;
        added
    }

    // Overloaded routines can share a label under one parent
    fn unique_id(&self, base: String) -> String {
        if !self.by_id.contains_key(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}#{}", base, n))
            .find(|candidate| !self.by_id.contains_key(candidate))
            .unwrap_or(base)
    }

    /// Expand/collapse with lazy-load semantics:
    /// unloaded nodes always become expanded (the caller issues the load),
    /// loaded nodes without children stay put, everything else flips.
    pub fn toggle(&mut self, index: NodeIndex) -> ToggleOutcome {
        let Some(node) = self.nodes.get_mut(index.0) else {
            return ToggleOutcome::Unchanged;
        };
        if node.kind.is_leaf() || node.kind == NodeKind::Root {
            return ToggleOutcome::Unchanged;
        }
        if !node.loaded {
            node.expanded = true;
            return ToggleOutcome::NeedsLoad;
        }
        if node.children.is_empty() {
            return ToggleOutcome::Unchanged;
        }
        node.expanded = !node.expanded;
        if node.expanded {
            ToggleOutcome::Expanded
        } else {
            ToggleOutcome::Collapsed
        }
    }

    /// Expand only (never collapses). Same lazy-load rule as `toggle`.
    pub fn expand(&mut self, index: NodeIndex) -> ToggleOutcome {
        match self.nodes.get(index.0) {
            Some(node) if node.loaded && node.expanded => ToggleOutcome::Unchanged,
            Some(_) => self.toggle(index),
            None => ToggleOutcome::Unchanged,
        }
    }

    /// Collapse only. Descendants keep their own `expanded` flags.
    pub fn collapse(&mut self, index: NodeIndex) -> ToggleOutcome {
        match self.nodes.get_mut(index.0) {
            Some(node) if node.expanded && node.kind != NodeKind::Root => {
                node.expanded = false;
                ToggleOutcome::Collapsed
            }
            _ => ToggleOutcome::Unchanged,
        }
    }

    /// Undo the optimistic expand after a failed lazy load
    pub fn mark_load_failed(&mut self, index: NodeIndex) {
        if let Some(node) = self.nodes.get_mut(index.0)
            && !node.loaded
        {
            node.expanded = false;
        }
    }

    /// Visible nodes in display order: pre-order below the root,
    /// descending only into expanded nodes.
    pub fn flatten(&self) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            out.push(index);
            let node = &self.nodes[index.0];
            if node.expanded {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Root is depth 0, its children depth 1
    pub fn depth(&self, index: NodeIndex) -> usize {
        let mut depth = 0;
        let mut current = self.nodes.get(index.0).and_then(|n| n.parent);
        while let Some(parent) = current {
            depth += 1;
            current = self.nodes[parent.0].parent;
        }
        depth
    }

    /// Strict ancestry: a node is not its own ancestor
    pub fn is_ancestor_of(&self, ancestor: NodeIndex, descendant: NodeIndex) -> bool {
        let mut current = self.nodes.get(descendant.0).and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes[parent.0].parent;
        }
        false
    }

    /// Nodes from the first level down to `index` inclusive (root excluded)
    pub fn path(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut path = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            let Some(node) = self.nodes.get(i.0) else {
                break;
            };
            if node.kind == NodeKind::Root {
                break;
            }
            path.push(i);
            current = node.parent;
        }
        path.reverse();
        path
    }

    /// Labels along `path`, for breadcrumbs
    pub fn path_labels(&self, index: NodeIndex) -> Vec<&str> {
        self.path(index)
            .into_iter()
            .map(|i| self.nodes[i.0].label.as_str())
            .collect()
    }

    /// Closest node of `kind` at or above `index`
    pub fn ancestor_of_kind(&self, index: NodeIndex, kind: NodeKind) -> Option<NodeIndex> {
        let mut current = Some(index);
        while let Some(i) = current {
            let node = self.nodes.get(i.0)?;
            if node.kind == kind {
                return Some(i);
            }
            current = node.parent;
        }
        None
    }

    /// Label of the closest ancestor of `kind`
    pub fn ancestor_label(&self, index: NodeIndex, kind: NodeKind) -> Option<&str> {
        self.ancestor_of_kind(index, kind)
            .map(|i| self.nodes[i.0].label.as_str())
    }

    /// The database node flagged as the session's active database
    pub fn active_database(&self) -> Option<NodeIndex> {
        self.nodes[0]
            .children
            .iter()
            .copied()
            .find(|i| matches!(self.nodes[i.0].meta, NodeMeta::Database { active: true }))
    }

    /// Loaded nodes whose label fuzzy-matches `query`, best first
    pub fn search(&self, query: &str, matcher: &FuzzyMatcher) -> Vec<(NodeIndex, i64)> {
        matcher.rank(
            query,
            self.nodes
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, n)| (NodeIndex(i), n.label.as_str())),
        )
    }

    /// Display list for a filter: every loaded node that matches, plus the
    /// ancestors needed to place it, in pre-order regardless of expansion.
    pub fn filter_view(&self, query: &str, matcher: &FuzzyMatcher) -> Vec<NodeIndex> {
        if query.is_empty() {
            return self.flatten();
        }
        let mut keep: HashSet<NodeIndex> = HashSet::new();
        for (index, _) in self.search(query, matcher) {
            keep.insert(index);
            let mut current = self.nodes[index.0].parent;
            while let Some(parent) = current {
                if !keep.insert(parent) {
                    break;
                }
                current = self.nodes[parent.0].parent;
            }
        }

        let mut out = Vec::new();
        let mut stack: Vec<NodeIndex> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(index) = stack.pop() {
            if !keep.contains(&index) {
                continue;
            }
            out.push(index);
            stack.extend(self.nodes[index.0].children.iter().rev().copied());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(name: &str) -> NodeDescriptor {
        NodeDescriptor::new(NodeKind::Database, name)
    }

    fn ids(tree: &TreeModel, list: &[NodeIndex]) -> Vec<String> {
        list.iter()
            .map(|i| tree.node(*i).unwrap().id().to_string())
            .collect()
    }

    /// root → db:postgres → schema:public → table:users → column:id
    fn sample() -> (TreeModel, NodeIndex, NodeIndex, NodeIndex) {
        let mut tree = TreeModel::new("localhost");
        let db = tree.add_children(tree.root(), vec![db("postgres")])[0];
        let schema = tree.add_children(db, vec![NodeDescriptor::new(NodeKind::Schema, "public")])[0];
        let table = tree.add_children(
            schema,
            vec![NodeDescriptor::new(NodeKind::Table, "users")],
        )[0];
        tree.add_children(
            table,
            vec![
                NodeDescriptor::new(NodeKind::Column, "id"),
                NodeDescriptor::new(NodeKind::Column, "email"),
            ],
        );
        (tree, db, schema, table)
    }

    #[test]
    fn test_identity_derived_from_path() {
        let (tree, db, schema, table) = sample();
        assert_eq!(tree.node(db).unwrap().id(), "db:postgres");
        assert_eq!(tree.node(schema).unwrap().id(), "db:postgres/schema:public");
        assert_eq!(
            tree.node(table).unwrap().id(),
            "db:postgres/schema:public/table:users"
        );
        assert_eq!(tree.find_by_id("db:postgres/schema:public"), Some(schema));
        assert_eq!(tree.find_by_id("db:missing"), None);
    }

    #[test]
    fn test_duplicate_labels_get_distinct_ids() {
        let (mut tree, _, schema, _) = sample();
        let added = tree.add_children(
            schema,
            vec![
                NodeDescriptor::new(NodeKind::Function, "f"),
                NodeDescriptor::new(NodeKind::Function, "f"),
            ],
        );
        let a = tree.node(added[0]).unwrap().id().to_string();
        let b = tree.node(added[1]).unwrap().id().to_string();
        assert_ne!(a, b);
        assert!(b.ends_with("#2"));
    }

    #[test]
    fn test_add_children_sets_parent_and_loaded() {
        let (tree, db, schema, _) = sample();
        let node = tree.node(schema).unwrap();
        assert_eq!(node.parent(), Some(db));
        assert!(tree.node(db).unwrap().children().contains(&schema));
        assert!(tree.node(db).unwrap().is_loaded());
    }

    #[test]
    fn test_toggle_unloaded_sets_expanded() {
        let mut tree = TreeModel::new("srv");
        let db = tree.add_children(tree.root(), vec![db("postgres")])[0];
        assert_eq!(tree.toggle(db), ToggleOutcome::NeedsLoad);
        assert!(tree.node(db).unwrap().is_expanded());
        // Still unloaded: toggling again keeps it expanded
        assert_eq!(tree.toggle(db), ToggleOutcome::NeedsLoad);
        assert!(tree.node(db).unwrap().is_expanded());
        assert_eq!(ids(&tree, &tree.flatten()), vec!["db:postgres"]);
    }

    #[test]
    fn test_toggle_loaded_without_children_is_noop() {
        let mut tree = TreeModel::new("srv");
        let db = tree.add_children(tree.root(), vec![db("empty")])[0];
        tree.add_children(db, vec![]);
        assert_eq!(tree.toggle(db), ToggleOutcome::Unchanged);
        assert!(!tree.node(db).unwrap().is_expanded());
    }

    #[test]
    fn test_toggle_leaf_ignored() {
        let (mut tree, _, _, table) = sample();
        let column = tree.node(table).unwrap().children()[0];
        assert_eq!(tree.toggle(column), ToggleOutcome::Unchanged);
        assert!(!tree.node(column).unwrap().is_expanded());
        assert!(tree.add_children(column, vec![db("x")]).is_empty());
    }

    #[test]
    fn test_flatten_respects_expansion() {
        let (mut tree, db, schema, table) = sample();
        assert_eq!(ids(&tree, &tree.flatten()), vec!["db:postgres"]);

        tree.toggle(db);
        tree.toggle(schema);
        tree.toggle(table);
        assert_eq!(tree.flatten().len(), 5);

        // Collapsing an ancestor hides descendants without touching their flags
        tree.toggle(db);
        assert_eq!(tree.flatten(), vec![db]);
        assert!(tree.node(schema).unwrap().is_expanded());
        assert!(tree.node(table).unwrap().is_expanded());

        tree.toggle(db);
        assert_eq!(tree.flatten().len(), 5);
    }

    #[test]
    fn test_flatten_contains_node_iff_ancestors_expanded() {
        let (mut tree, db, schema, _) = sample();
        tree.toggle(db);
        tree.toggle(schema);
        let visible: HashSet<NodeIndex> = tree.flatten().into_iter().collect();
        for i in 1..tree.len() {
            let index = NodeIndex(i);
            let all_expanded = tree.path(index)[..tree.path(index).len() - 1]
                .iter()
                .all(|a| tree.node(*a).unwrap().is_expanded());
            assert_eq!(visible.contains(&index), all_expanded, "node {}", i);
        }
    }

    #[test]
    fn test_structural_queries() {
        let (tree, db, schema, table) = sample();
        let column = tree.node(table).unwrap().children()[1];
        assert_eq!(tree.depth(tree.root()), 0);
        assert_eq!(tree.depth(db), 1);
        assert_eq!(tree.depth(column), 4);
        assert!(tree.is_ancestor_of(db, column));
        assert!(tree.is_ancestor_of(schema, table));
        assert!(!tree.is_ancestor_of(table, schema));
        assert!(!tree.is_ancestor_of(table, table));
        assert_eq!(
            tree.path_labels(column),
            vec!["postgres", "public", "users", "email"]
        );
        assert_eq!(tree.ancestor_label(column, NodeKind::Schema), Some("public"));
        assert_eq!(tree.ancestor_label(column, NodeKind::Database), Some("postgres"));
        assert_eq!(tree.ancestor_label(db, NodeKind::Schema), None);
    }

    #[test]
    fn test_collapse_and_expand() {
        let (mut tree, db, _, _) = sample();
        assert_eq!(tree.expand(db), ToggleOutcome::Expanded);
        assert_eq!(tree.expand(db), ToggleOutcome::Unchanged);
        assert_eq!(tree.collapse(db), ToggleOutcome::Collapsed);
        assert_eq!(tree.collapse(db), ToggleOutcome::Unchanged);
    }

    #[test]
    fn test_mark_load_failed_collapses_unloaded() {
        let mut tree = TreeModel::new("srv");
        let db = tree.add_children(tree.root(), vec![db("postgres")])[0];
        tree.toggle(db);
        tree.mark_load_failed(db);
        assert!(!tree.node(db).unwrap().is_expanded());
    }

    #[test]
    fn test_active_database() {
        let mut tree = TreeModel::new("srv");
        let added = tree.add_children(
            tree.root(),
            vec![
                db("template1").with_meta(NodeMeta::Database { active: false }),
                db("app").with_meta(NodeMeta::Database { active: true }),
            ],
        );
        assert_eq!(tree.active_database(), Some(added[1]));
    }

    #[test]
    fn test_filter_view_includes_ancestors_of_collapsed_matches() {
        let (tree, db, schema, table) = sample();
        let matcher = FuzzyMatcher::new();
        let view = tree.filter_view("email", &matcher);
        let email = tree.node(table).unwrap().children()[1];
        assert_eq!(view, vec![db, schema, table, email]);
        assert_eq!(tree.filter_view("", &matcher), tree.flatten());
        assert!(tree.filter_view("zzz", &matcher).is_empty());
    }
}

//! Navigation node types
//!
//! Nodes live in the arena owned by [`TreeModel`](super::TreeModel) and refer
//! to each other by [`NodeIndex`], never by owning pointers.

/// Position of a node in its tree's arena. Only meaningful for the tree that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(pub(crate) usize);

/// Every kind of object the browser can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Database,
    Schema,
    Table,
    View,
    MaterializedView,
    Column,
    Function,
    Procedure,
    Trigger,
    TriggerFunction,
    Sequence,
    Index,
    Extension,
    CompositeType,
    EnumType,
    DomainType,
    RangeType,
}

impl NodeKind {
    /// Short tag used when deriving node identities
    pub fn prefix(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Database => "db",
            NodeKind::Schema => "schema",
            NodeKind::Table => "table",
            NodeKind::View => "view",
            NodeKind::MaterializedView => "matview",
            NodeKind::Column => "column",
            NodeKind::Function => "function",
            NodeKind::Procedure => "procedure",
            NodeKind::Trigger => "trigger",
            NodeKind::TriggerFunction => "trigger_fn",
            NodeKind::Sequence => "sequence",
            NodeKind::Index => "index",
            NodeKind::Extension => "extension",
            NodeKind::CompositeType => "composite",
            NodeKind::EnumType => "enum",
            NodeKind::DomainType => "domain",
            NodeKind::RangeType => "range",
        }
    }

    /// Human-readable name for status lines
    pub fn display_name(self) -> &'static str {
        match self {
            NodeKind::Root => "server",
            NodeKind::Database => "database",
            NodeKind::Schema => "schema",
            NodeKind::Table => "table",
            NodeKind::View => "view",
            NodeKind::MaterializedView => "materialized view",
            NodeKind::Column => "column",
            NodeKind::Function => "function",
            NodeKind::Procedure => "procedure",
            NodeKind::Trigger => "trigger",
            NodeKind::TriggerFunction => "trigger function",
            NodeKind::Sequence => "sequence",
            NodeKind::Index => "index",
            NodeKind::Extension => "extension",
            NodeKind::CompositeType => "composite type",
            NodeKind::EnumType => "enum type",
            NodeKind::DomainType => "domain type",
            NodeKind::RangeType => "range type",
        }
    }

    /// Leaf kinds have no children and ignore expand/collapse
    pub fn is_leaf(self) -> bool {
        !matches!(
            self,
            NodeKind::Root
                | NodeKind::Database
                | NodeKind::Schema
                | NodeKind::Table
                | NodeKind::View
                | NodeKind::MaterializedView
                | NodeKind::CompositeType
        )
    }

    /// Kinds whose rows can be paged into the data grid
    pub fn is_relation(self) -> bool {
        matches!(
            self,
            NodeKind::Table | NodeKind::View | NodeKind::MaterializedView
        )
    }
}

/// Per-kind payload carried by a node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NodeMeta {
    #[default]
    None,
    Database {
        /// The database the session is connected to
        active: bool,
    },
    Relation {
        row_estimate: Option<i64>,
    },
    Column {
        data_type: String,
        nullable: bool,
        primary_key: bool,
    },
    Routine {
        arguments: String,
        returns: Option<String>,
    },
    Index {
        unique: bool,
        primary: bool,
    },
    Trigger {
        function: String,
    },
    Extension {
        version: String,
    },
    EnumType {
        labels: Vec<String>,
    },
}

/// What a data source returns for a child: the tree derives identity and links
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub kind: NodeKind,
    pub label: String,
    pub meta: NodeMeta,
}

impl NodeDescriptor {
    pub fn new(kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            meta: NodeMeta::None,
        }
    }

    pub fn with_meta(mut self, meta: NodeMeta) -> Self {
        self.meta = meta;
        self
    }
}

/// One node of the navigation tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) kind: NodeKind,
    pub(crate) expanded: bool,
    pub(crate) loaded: bool,
    pub(crate) selectable: bool,
    pub(crate) meta: NodeMeta,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) children: Vec<NodeIndex>,
}

impl TreeNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_selectable(&self) -> bool {
        self.selectable
    }

    pub fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }

    /// Whether the expand indicator should be drawn
    pub fn can_expand(&self) -> bool {
        !self.kind.is_leaf() && (!self.loaded || !self.children.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_kinds() {
        assert!(NodeKind::Column.is_leaf());
        assert!(NodeKind::Index.is_leaf());
        assert!(!NodeKind::Table.is_leaf());
        assert!(!NodeKind::Database.is_leaf());
    }

    #[test]
    fn test_relation_kinds() {
        assert!(NodeKind::View.is_relation());
        assert!(NodeKind::MaterializedView.is_relation());
        assert!(!NodeKind::Schema.is_relation());
    }

    #[test]
    fn test_descriptor_builder() {
        let d = NodeDescriptor::new(NodeKind::Extension, "pgcrypto").with_meta(
            NodeMeta::Extension {
                version: "1.3".into(),
            },
        );
        assert_eq!(d.label, "pgcrypto");
        assert!(matches!(d.meta, NodeMeta::Extension { .. }));
    }
}

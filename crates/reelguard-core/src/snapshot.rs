//! Owned UI tree snapshots.
//!
//! A snapshot is rebuilt fresh for every accessibility event and handed to
//! the classifier by value. Nodes live in a flat arena and reference their
//! children by index, so a traversal never holds on to anything that needs
//! releasing and an early return cannot leak.
//!
//! Two shapes exist:
//!
//! - [`SnapshotNode`]: the nested form external providers and recorded
//!   fixtures produce (`children` inline).
//! - [`UiSnapshot`]: the flattened arena the classifier walks.

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;

/// Index of a node inside a [`UiSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// A single node of a UI snapshot.
///
/// Every text attribute may be empty; an empty attribute never matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiNode {
    /// View resource identifier, e.g. `com.instagram.android:id/clips_tab`.
    #[serde(default)]
    pub identifier: String,
    /// Widget class name, e.g. `androidx.recyclerview.widget.RecyclerView`.
    #[serde(default)]
    pub type_name: String,
    /// Accessibility description.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub text: String,
    /// Children in on-screen order.
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl UiNode {
    pub fn new(identifier: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

/// Arena-backed snapshot of an application's UI tree.
///
/// Built through [`UiSnapshot::add_root`]/[`UiSnapshot::add_child`] or from a
/// nested [`SnapshotNode`]. A deserialized arena may carry dangling child
/// indices; readers treat those as unreadable nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiSnapshot {
    nodes: Vec<UiNode>,
    root: Option<NodeId>,
}

impl UiSnapshot {
    /// Create an empty snapshot (no root).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `node` as the root. Any previous root stays in the arena but is
    /// no longer reachable.
    pub fn add_root(&mut self, mut node: UiNode) -> NodeId {
        node.children.clear();
        let id = self.push(node);
        self.root = Some(id);
        id
    }

    /// Append `node` as the last child of `parent`.
    ///
    /// Returns `None` if `parent` is not a node of this snapshot.
    pub fn add_child(&mut self, parent: NodeId, mut node: UiNode) -> Option<NodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        node.children.clear();
        let id = self.push(node);
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    fn push(&mut self, node: UiNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Look up a node. `None` for an index outside the arena.
    pub fn node(&self, id: NodeId) -> Option<&UiNode> {
        self.nodes.get(id.0)
    }

    /// Total number of nodes in the arena (reachable or not).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flatten a nested tree into an arena.
    ///
    /// Iterative so that deeply nested input cannot overflow the stack.
    pub fn from_tree(root: SnapshotNode) -> Self {
        let mut snapshot = Self::new();
        let (node, children) = root.split();
        let root_id = snapshot.add_root(node);

        // Children are pushed reversed so the arena keeps on-screen order
        // when popped.
        let mut pending: Vec<(NodeId, SnapshotNode)> = children
            .into_iter()
            .rev()
            .map(|child| (root_id, child))
            .collect();

        while let Some((parent, next)) = pending.pop() {
            let (node, children) = next.split();
            if let Some(id) = snapshot.add_child(parent, node) {
                pending.extend(children.into_iter().rev().map(|child| (id, child)));
            }
        }

        snapshot
    }
}

/// Nested snapshot node, the interchange format for providers and fixtures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<SnapshotNode>,
}

impl SnapshotNode {
    pub fn new(identifier: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_children(mut self, children: Vec<SnapshotNode>) -> Self {
        self.children = children;
        self
    }

    fn split(self) -> (UiNode, Vec<SnapshotNode>) {
        let node = UiNode {
            identifier: self.identifier,
            type_name: self.type_name,
            description: self.description,
            text: self.text,
            children: Vec::new(),
        };
        (node, self.children)
    }
}

impl From<SnapshotNode> for UiSnapshot {
    fn from(root: SnapshotNode) -> Self {
        UiSnapshot::from_tree(root)
    }
}

/// Source of the current UI tree for the foreground window.
///
/// Called at most once per event, and only for monitored apps.
pub trait SnapshotProvider {
    fn snapshot(&self) -> Result<UiSnapshot, SnapshotError>;
}

impl<F> SnapshotProvider for F
where
    F: Fn() -> Result<UiSnapshot, SnapshotError>,
{
    fn snapshot(&self) -> Result<UiSnapshot, SnapshotError> {
        self()
    }
}

impl SnapshotProvider for UiSnapshot {
    fn snapshot(&self) -> Result<UiSnapshot, SnapshotError> {
        Ok(self.clone())
    }
}

/// Provider for events that arrive without any window content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnapshot;

impl SnapshotProvider for NoSnapshot {
    fn snapshot(&self) -> Result<UiSnapshot, SnapshotError> {
        Err(SnapshotError::Unavailable("no active window".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_tree_preserves_child_order() {
        let tree = SnapshotNode::new("root", "FrameLayout").with_children(vec![
            SnapshotNode::new("a", "View").with_children(vec![SnapshotNode::new("a1", "View")]),
            SnapshotNode::new("b", "View"),
        ]);

        let snapshot = UiSnapshot::from_tree(tree);
        assert_eq!(snapshot.len(), 4);

        let root = snapshot.node(snapshot.root().unwrap()).unwrap();
        let names: Vec<_> = root
            .children
            .iter()
            .map(|id| snapshot.node(*id).unwrap().identifier.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let a = snapshot.node(root.children[0]).unwrap();
        assert_eq!(snapshot.node(a.children[0]).unwrap().identifier, "a1");
    }

    #[test]
    fn add_child_rejects_unknown_parent() {
        let mut snapshot = UiSnapshot::new();
        assert!(snapshot.add_child(NodeId(3), UiNode::default()).is_none());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn from_tree_handles_deep_nesting() {
        let mut tree = SnapshotNode::new("leaf", "View");
        for i in 0..5_000 {
            tree = SnapshotNode::new(format!("n{i}"), "View").with_children(vec![tree]);
        }
        let snapshot = UiSnapshot::from_tree(tree);
        assert_eq!(snapshot.len(), 5_001);
    }

    #[test]
    fn nested_json_fixture_deserializes_with_missing_fields() {
        let json = r#"{"identifier":"root","children":[{"text":"Shorts"}]}"#;
        let tree: SnapshotNode = serde_json::from_str(json).unwrap();
        let snapshot = UiSnapshot::from(tree);
        let root = snapshot.node(snapshot.root().unwrap()).unwrap();
        assert_eq!(root.type_name, "");
        assert_eq!(snapshot.node(root.children[0]).unwrap().text, "Shorts");
    }

    #[test]
    fn closure_provider_is_a_snapshot_provider() {
        let provider = || -> Result<UiSnapshot, SnapshotError> {
            Ok(UiSnapshot::from_tree(SnapshotNode::new("root", "View")))
        };
        assert_eq!(provider.snapshot().unwrap().len(), 1);
        assert!(NoSnapshot.snapshot().is_err());
    }
}

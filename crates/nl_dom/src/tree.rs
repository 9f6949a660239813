use std::fmt::Debug;
use std::hash::Hash;

/// A tree whose nodes are addressed by small copyable ids with parent links.
///
/// The sectioner only needs upward and sideways navigation plus a way to copy
/// a run of sibling subtrees into a new standalone tree.
pub trait DomTree {
    type NodeId: Copy + Eq + Hash + Debug;
    type Fragment;

    fn parent(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    fn next_sibling(&self, node: Self::NodeId) -> Option<Self::NodeId>;

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: Self::NodeId) -> String;

    /// Builds a new tree holding deep copies of `nodes`, in the given order.
    fn fragment(&self, nodes: &[Self::NodeId]) -> Self::Fragment;

    /// Ancestors from the parent up to the root.
    fn ancestors(&self, node: Self::NodeId) -> Vec<Self::NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parent(node);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent(parent);
        }
        chain
    }
}

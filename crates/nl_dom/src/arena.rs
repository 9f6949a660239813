use crate::tree::DomTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Element(String),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    attrs: Vec<(String, String)>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Index-addressed tree: nodes live in a vector, links are positions in it.
#[derive(Debug, Clone)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                attrs: Vec::new(),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind, attrs: Vec<(String, String)>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            attrs,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push(parent, NodeKind::Element(tag.to_string()), Vec::new())
    }

    pub fn element_with(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let attrs = attrs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        self.push(parent, NodeKind::Element(tag.to_string()), attrs)
    }

    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeKind::Text(text.to_string()), Vec::new())
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// Elements with the given tag, in document order.
    pub fn by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|id| self.tag(*id) == Some(tag))
            .collect()
    }

    fn copy_into(&self, source: NodeId, target: &mut Arena, parent: NodeId) {
        let node = &self.nodes[source.0];
        let copy = target.push(parent, node.kind.clone(), node.attrs.clone());
        for child in &node.children {
            self.copy_into(*child, target, copy);
        }
    }
}

impl DomTree for Arena {
    type NodeId = NodeId;
    type Fragment = Arena;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let position = siblings.iter().position(|s| *s == node)?;
        siblings.get(position + 1).copied()
    }

    fn text_content(&self, node: NodeId) -> String {
        std::iter::once(node)
            .chain(self.descendants(node))
            .filter_map(|id| match self.kind(id) {
                NodeKind::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn fragment(&self, nodes: &[NodeId]) -> Arena {
        let mut target = Arena::new();
        let root = target.root();
        for node in nodes {
            self.copy_into(*node, &mut target, root);
        }
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation() {
        let mut arena = Arena::new();
        let body = arena.element(arena.root(), "body");
        let first = arena.element(body, "p");
        let text = arena.text(first, "one");
        let second = arena.element(body, "p");

        assert_eq!(arena.parent(text), Some(first));
        assert_eq!(arena.next_sibling(first), Some(second));
        assert_eq!(arena.next_sibling(second), None);
        assert_eq!(arena.ancestors(text), vec![first, body, arena.root()]);
        assert_eq!(arena.by_tag("p"), vec![first, second]);
        assert_eq!(arena.text_content(body), "one");
    }

    #[test]
    fn test_fragment_is_a_deep_copy() {
        let mut arena = Arena::new();
        let body = arena.element(arena.root(), "body");
        let div = arena.element_with(body, "div", &[("class", "item")]);
        arena.text(div, "hello");
        arena.element(body, "hr");

        let fragment = arena.fragment(&[div]);
        assert_eq!(fragment.children(fragment.root()).len(), 1);
        let copy = fragment.children(fragment.root())[0];
        assert_eq!(fragment.attr(copy, "class"), Some("item"));
        assert_eq!(fragment.text_content(copy), "hello");
        assert_eq!(arena.len(), 5);
    }
}

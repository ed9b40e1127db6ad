//! Minimal text tree standing in for a rendered container
//!
//! Elements and text nodes in an arena. The flattened text of a node is the
//! concatenation of its descendant text nodes in document order; markup
//! contributes nothing to it. Offset resolution and segment mounting both
//! work on this tree so neither needs a browser.

use std::fmt;

/// Index of a node in its [`TextTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct TextTree {
    nodes: Vec<Node>,
}

impl TextTree {
    /// Create a tree whose root is an element named `root_tag`
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Element {
                    tag: root_tag.to_string(),
                    attributes: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> NodeId {
        self.push(
            parent,
            NodeKind::Element {
                tag: tag.to_string(),
                attributes: Vec::new(),
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.push(parent, NodeKind::Text(text.to_string()))
    }

    /// Set an attribute on an element; ignored for text nodes
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attributes, .. } = &mut self.nodes[node.0].kind {
            match attributes.iter_mut().find(|(n, _)| n == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attributes.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.nodes.get(node.0).map(|n| &n.kind)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match self.kind(node)? {
            NodeKind::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    /// Whether `node` is `ancestor` or lies beneath it
    pub fn is_inclusive_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// Flattened text of a subtree
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.kind(node) {
            Some(NodeKind::Text(text)) => out.push_str(text),
            Some(NodeKind::Element { .. }) => {
                for &child in self.children(node) {
                    self.collect_text(child, out);
                }
            }
            None => {}
        }
    }

    /// Length in chars of a subtree's flattened text
    pub fn text_len(&self, node: NodeId) -> usize {
        match self.kind(node) {
            Some(NodeKind::Text(text)) => text.chars().count(),
            Some(NodeKind::Element { .. }) => {
                self.children(node).iter().map(|&c| self.text_len(c)).sum()
            }
            None => 0,
        }
    }

    /// Chars of `root`'s flattened text that precede `target`
    ///
    /// `None` when `target` is not inside `root`.
    pub fn chars_before(&self, root: NodeId, target: NodeId) -> Option<usize> {
        if !self.is_inclusive_descendant(target, root) {
            return None;
        }

        // Walk up from the target, summing the text of earlier siblings
        let mut count = 0;
        let mut current = target;
        while current != root {
            let parent = self.parent(current)?;
            for &sibling in self.children(parent) {
                if sibling == current {
                    break;
                }
                count += self.text_len(sibling);
            }
            current = parent;
        }
        Some(count)
    }
}

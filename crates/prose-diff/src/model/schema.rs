use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Node, TEXT_NODE};

/// How a node type takes part in linearization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSpec {
    /// Inline (text-level) rather than block node.
    pub inline: bool,
    /// Has no content.
    pub leaf: bool,
    /// List container or list item. Its boundaries are word boundaries.
    pub list: bool,
    /// Hard line break. Sticks to the preceding word.
    pub line_break: bool,
}

impl NodeSpec {
    pub const fn block() -> Self {
        Self {
            inline: false,
            leaf: false,
            list: false,
            line_break: false,
        }
    }

    pub const fn list() -> Self {
        Self {
            list: true,
            ..Self::block()
        }
    }

    pub const fn block_leaf() -> Self {
        Self {
            leaf: true,
            ..Self::block()
        }
    }

    pub const fn inline_leaf() -> Self {
        Self {
            inline: true,
            leaf: true,
            ..Self::block()
        }
    }

    pub const fn line_break() -> Self {
        Self {
            line_break: true,
            ..Self::inline_leaf()
        }
    }
}

/// Node type registry plus the fragment-building capability the engine
/// needs from its host.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    top: String,
    nodes: IndexMap<String, NodeSpec>,
}

impl Schema {
    /// A schema whose top-level container type is `top`.
    pub fn new(top: impl Into<String>) -> Self {
        let top = top.into();
        let mut nodes = IndexMap::new();
        nodes.insert(top.clone(), NodeSpec::block());
        nodes.insert(TEXT_NODE.to_owned(), NodeSpec::inline_leaf());
        Self { top, nodes }
    }

    /// Paragraphs, headings, quotes, code blocks, rules, lists, images and
    /// hard breaks under a `doc` container.
    pub fn basic() -> Self {
        Self::new("doc")
            .with_node("paragraph", NodeSpec::block())
            .with_node("heading", NodeSpec::block())
            .with_node("blockquote", NodeSpec::block())
            .with_node("code_block", NodeSpec::block())
            .with_node("horizontal_rule", NodeSpec::block_leaf())
            .with_node("bullet_list", NodeSpec::list())
            .with_node("ordered_list", NodeSpec::list())
            .with_node("list_item", NodeSpec::list())
            .with_node("image", NodeSpec::inline_leaf())
            .with_node("hard_break", NodeSpec::line_break())
    }

    pub fn with_node(mut self, name: impl Into<String>, spec: NodeSpec) -> Self {
        self.nodes.insert(name.into(), spec);
        self
    }

    pub fn top(&self) -> &str {
        &self.top
    }

    pub fn spec(&self, kind: &str) -> Option<NodeSpec> {
        self.nodes.get(kind).copied()
    }

    /// Wrap `nodes` into a minimal top-level document.
    pub fn fragment(&self, nodes: Vec<Node>) -> Node {
        Node::new(self.top.as_str()).with_content(nodes)
    }

    /// Size of `node` in document positions: one per text character, one
    /// per leaf, content plus an open and a close token otherwise.
    pub fn node_size(&self, node: &Node) -> usize {
        if node.is_text() {
            return node.text.as_deref().map_or(0, |t| t.chars().count());
        }
        match self.spec(&node.kind) {
            Some(spec) if spec.leaf => 1,
            _ => self.content_size(node) + 2,
        }
    }

    pub fn content_size(&self, node: &Node) -> usize {
        node.content.iter().map(|child| self.node_size(child)).sum()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::basic()
    }
}

//! Rich document tree consumed by the engine.
//!
//! Nodes use the common JSON document shape:
//!
//! ```json
//! {"type": "paragraph", "attrs": {}, "content": [
//!   {"type": "text", "text": "hello", "marks": [{"type": "bold"}]}
//! ]}
//! ```
//!
//! The tree is plain data. Whether a node is a block, an inline leaf or a
//! text node is decided by the [`Schema`].

mod schema;

pub use schema::{NodeSpec, Schema};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute map of a node or mark. Insertion order is preserved.
pub type Attrs = Map<String, Value>;

/// Type name of text nodes.
pub const TEXT_NODE: &str = "text";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mark {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Attrs,
}

impl Mark {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attrs: Attrs,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
}

impl Node {
    /// An element node without attributes or content.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::new(),
            content: Vec::new(),
            text: None,
            marks: Vec::new(),
        }
    }

    /// A text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(TEXT_NODE)
        }
    }

    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = content;
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.push(mark);
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == TEXT_NODE
    }

    pub fn child_count(&self) -> usize {
        self.content.len()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Node> = vec![self];
        while let Some(node) = stack.pop() {
            if let Some(text) = &node.text {
                out.push_str(text);
            }
            stack.extend(node.content.iter().rev());
        }
        out
    }
}

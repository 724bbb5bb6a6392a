#![allow(dead_code)]

use prose_diff::{Mark, Node, Schema};
use serde_json::{json, Value};

pub fn schema() -> Schema {
    Schema::basic()
}

pub fn doc(content: Vec<Node>) -> Node {
    schema().fragment(content)
}

pub fn p(content: Vec<Node>) -> Node {
    Node::new("paragraph").with_content(content)
}

pub fn h(level: u64, content: Vec<Node>) -> Node {
    Node::new("heading")
        .with_attr("level", level)
        .with_content(content)
}

pub fn text(t: &str) -> Node {
    Node::text(t)
}

pub fn bold(t: &str) -> Node {
    Node::text(t).with_mark(Mark::new("bold"))
}

pub fn ul(items: Vec<Node>) -> Node {
    Node::new("bullet_list").with_content(items)
}

pub fn li(content: Vec<Node>) -> Node {
    Node::new("list_item").with_content(content)
}

/// A document of one plain paragraph per entry.
pub fn paragraphs<S: AsRef<str>>(texts: &[S]) -> Node {
    doc(texts.iter().map(|t| p(vec![text(t.as_ref())])).collect())
}

/// Parse a document from its JSON form.
pub fn from_json(value: Value) -> Node {
    serde_json::from_value(value).expect("valid document json")
}

pub fn sample_article() -> Node {
    from_json(json!({
        "type": "doc",
        "content": [
            {"type": "heading", "attrs": {"level": 1}, "content": [{"type": "text", "text": "Release notes"}]},
            {"type": "paragraph", "content": [
                {"type": "text", "text": "This release "},
                {"type": "text", "text": "fixes", "marks": [{"type": "bold"}]},
                {"type": "text", "text": " two bugs."}
            ]},
            {"type": "bullet_list", "content": [
                {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "crash on start"}]}]},
                {"type": "list_item", "content": [{"type": "paragraph", "content": [{"type": "text", "text": "slow search"}]}]}
            ]},
            {"type": "horizontal_rule"},
            {"type": "paragraph", "content": [
                {"type": "text", "text": "See"},
                {"type": "hard_break"},
                {"type": "image", "attrs": {"src": "a.png"}}
            ]}
        ]
    }))
}

/// Top-level node count of a document.
pub fn top_level(doc: &Node) -> usize {
    doc.content.len()
}

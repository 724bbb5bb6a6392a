use serde::{Deserialize, Serialize};

use super::{NodeMeta, BLOCK_END, BLOCK_START, LEAF};
use crate::error::DiffError;
use crate::model::Node;

/// Rebuilt content of a marked sequence that may start or end inside
/// blocks. `open_start` counts blocks whose opening sentinel lies before
/// the sequence, `open_end` blocks whose closing sentinel lies after it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Slice {
    pub content: Vec<Node>,
    pub open_start: usize,
    pub open_end: usize,
}

impl Slice {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

struct Frame<'m> {
    meta: Option<&'m NodeMeta>,
    children: Vec<Node>,
}

struct Builder<'m> {
    frames: Vec<Frame<'m>>,
    open_start: usize,
}

impl<'m> Builder<'m> {
    fn new() -> Self {
        Self {
            frames: vec![Frame {
                meta: None,
                children: Vec::new(),
            }],
            open_start: 0,
        }
    }

    fn top(&mut self) -> &mut Vec<Node> {
        let last = self.frames.len() - 1;
        &mut self.frames[last].children
    }

    /// Blocks opened and not yet closed.
    fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    fn push_char(&mut self, c: char, meta: &NodeMeta) {
        let children = self.top();
        if let Some(last) = children.last_mut() {
            if last.is_text() && last.marks == meta.marks && last.attrs == meta.attrs {
                if let Some(text) = last.text.as_mut() {
                    text.push(c);
                    return;
                }
            }
        }
        let mut node = Node::text(c.to_string());
        node.kind = meta.kind.clone();
        node.marks = meta.marks.clone();
        node.attrs = meta.attrs.clone();
        children.push(node);
    }

    /// A close with no open block wraps everything built so far in the
    /// block it closes.
    fn step(&mut self, c: char, meta: &'m NodeMeta) {
        match c {
            BLOCK_START => self.frames.push(Frame {
                meta: Some(meta),
                children: Vec::new(),
            }),
            BLOCK_END if self.depth() > 0 => {
                if let Some(frame) = self.frames.pop() {
                    let node = element(frame.meta.unwrap_or(meta), frame.children);
                    self.top().push(node);
                }
            }
            BLOCK_END => {
                let children = std::mem::take(self.top());
                let node = element(meta, children);
                self.top().push(node);
                self.open_start += 1;
            }
            LEAF => {
                let node = element(meta, Vec::new());
                self.top().push(node);
            }
            c => self.push_char(c, meta),
        }
    }

    /// Close every open block.
    fn finish(mut self) -> Slice {
        let open_end = self.depth();
        while self.depth() > 0 {
            if let Some(frame) = self.frames.pop() {
                if let Some(meta) = frame.meta {
                    let node = element(meta, frame.children);
                    self.top().push(node);
                }
            }
        }
        let content = self.frames.pop().map(|f| f.children).unwrap_or_default();
        Slice {
            content,
            open_start: self.open_start,
            open_end,
        }
    }
}

fn element(meta: &NodeMeta, content: Vec<Node>) -> Node {
    let mut node = Node::new(meta.kind.as_str()).with_content(content);
    node.attrs = meta.attrs.clone();
    node.marks = meta.marks.clone();
    node
}

/// Rebuild a balanced sequence. Any unmatched sentinel is an error.
pub(crate) fn build_nodes<'m, I>(items: I) -> Result<Vec<Node>, DiffError>
where
    I: IntoIterator<Item = (char, &'m NodeMeta)>,
{
    let mut builder = Builder::new();
    let mut pos = 0;
    for (c, meta) in items {
        if c == BLOCK_END && builder.depth() == 0 {
            return Err(DiffError::Unbalanced { pos });
        }
        builder.step(c, meta);
        pos += 1;
    }
    if builder.depth() > 0 {
        return Err(DiffError::Unbalanced { pos });
    }
    Ok(builder.finish().content)
}

/// Rebuild a possibly open sequence. Unmatched closes wrap everything
/// before them; unmatched opens are closed at the end.
pub(crate) fn build_slice<'m, I>(items: I) -> Slice
where
    I: IntoIterator<Item = (char, &'m NodeMeta)>,
{
    let mut builder = Builder::new();
    for (c, meta) in items {
        builder.step(c, meta);
    }
    builder.finish()
}

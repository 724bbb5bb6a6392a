//! Document Linearizer — flattens a document tree into a marked sequence.
//!
//! Every document position becomes one character: literal text characters
//! for text nodes, and reserved sentinels for block boundaries and leaves.
//! Each character is paired with the id of an interned [`NodeMeta`]
//! descriptor, so "same text, same structure" is two slice comparisons.
//!
//! The index of a character in the full sequence is its document position,
//! which is what makes diff spans addressable back into the tree.

mod meta;
mod rebuild;

pub use meta::{MetaId, MetaTable, NodeMeta};
pub use rebuild::Slice;
pub(crate) use rebuild::build_nodes;

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::error::DiffError;
use crate::model::{Node, Schema};
use meta::Ancestor;

/// Opening boundary of a block node.
pub const BLOCK_START: char = '\u{E000}';
/// Closing boundary of a block node.
pub const BLOCK_END: char = '\u{E001}';
/// A leaf node that is not text (image, hard break, rule).
pub const LEAF: char = '\u{E002}';

pub fn is_sentinel(c: char) -> bool {
    matches!(c, BLOCK_START | BLOCK_END | LEAF)
}

// ── MarkedString ──────────────────────────────────────────────────────────

/// Immutable view over a linearized document.
///
/// Cloning and slicing are O(1): views share the character buffer, the
/// descriptor id buffer and the descriptor arena.
#[derive(Clone)]
pub struct MarkedString {
    chars: Arc<[char]>,
    metas: Arc<[MetaId]>,
    table: Arc<MetaTable>,
    range: Range<usize>,
    start_pos: usize,
}

impl MarkedString {
    pub(crate) fn new(chars: Vec<char>, metas: Vec<MetaId>, table: Arc<MetaTable>) -> Self {
        let len = chars.len();
        Self {
            chars: chars.into(),
            metas: metas.into(),
            table,
            range: 0..len,
            start_pos: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Document position of the first character of this view.
    pub fn start_pos(&self) -> usize {
        self.start_pos
    }

    pub fn end_pos(&self) -> usize {
        self.start_pos + self.len()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars[self.range.clone()]
    }

    pub fn meta_ids(&self) -> &[MetaId] {
        &self.metas[self.range.clone()]
    }

    pub fn table(&self) -> &Arc<MetaTable> {
        &self.table
    }

    pub fn char_at(&self, i: usize) -> char {
        self.chars()[i]
    }

    pub fn meta_at(&self, i: usize) -> &NodeMeta {
        self.table.get(self.meta_ids()[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, &NodeMeta)> + '_ {
        self.chars()
            .iter()
            .zip(self.meta_ids())
            .map(|(c, id)| (*c, self.table.get(*id)))
    }

    /// Sub-view by view-relative indices, clamped to this view.
    pub fn slice(&self, start: usize, end: usize) -> MarkedString {
        let end = end.min(self.len());
        let start = start.min(end);
        MarkedString {
            chars: Arc::clone(&self.chars),
            metas: Arc::clone(&self.metas),
            table: Arc::clone(&self.table),
            range: self.range.start + start..self.range.start + end,
            start_pos: self.start_pos + start,
        }
    }

    /// Sub-view by document positions. `None` when the span is not inside
    /// this view.
    pub fn slice_pos(&self, from: usize, to: usize) -> Option<MarkedString> {
        if from < self.start_pos || to < from || to > self.end_pos() {
            return None;
        }
        Some(self.slice(from - self.start_pos, to - self.start_pos))
    }

    /// Empty view at document position `pos`, clamped to this view.
    pub fn point_at(&self, pos: usize) -> MarkedString {
        let i = pos.saturating_sub(self.start_pos).min(self.len());
        self.slice(i, i)
    }

    /// The same characters addressed from a different start position.
    pub fn with_start_pos(&self, start_pos: usize) -> MarkedString {
        MarkedString {
            start_pos,
            ..self.clone()
        }
    }

    /// Characters including sentinels.
    pub fn text(&self) -> String {
        self.chars().iter().collect()
    }

    /// Literal text only.
    pub fn text_content(&self) -> String {
        self.chars().iter().filter(|c| !is_sentinel(**c)).collect()
    }

    /// Same characters with the same descriptors.
    pub fn same_content(&self, other: &MarkedString) -> bool {
        if self.chars() != other.chars() {
            return false;
        }
        if Arc::ptr_eq(&self.table, &other.table) {
            return self.meta_ids() == other.meta_ids();
        }
        self.meta_ids()
            .iter()
            .zip(other.meta_ids())
            .all(|(a, b)| self.table.get(*a).identity() == other.table.get(*b).identity())
    }

    /// Number of top-level units in this view: depth-1 block ends and
    /// depth-1 leaves.
    pub fn top_level_units(&self) -> usize {
        self.iter()
            .filter(|(c, meta)| meta.depth == 1 && matches!(*c, BLOCK_END | LEAF))
            .count()
    }

    /// Rebuild a balanced view into nodes.
    pub fn to_nodes(&self) -> Result<Vec<Node>, DiffError> {
        rebuild::build_nodes(self.iter())
    }

    /// Rebuild a view that may start inside and end inside blocks.
    pub fn to_slice(&self) -> Slice {
        rebuild::build_slice(self.iter())
    }
}

impl fmt::Debug for MarkedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown: String = self
            .chars()
            .iter()
            .map(|c| match *c {
                BLOCK_START => '<',
                BLOCK_END => '>',
                LEAF => '*',
                c => c,
            })
            .collect();
        f.debug_struct("MarkedString")
            .field("start_pos", &self.start_pos)
            .field("text", &shown)
            .finish()
    }
}

// ── Linearizer ────────────────────────────────────────────────────────────

/// Linearize the content of `doc`. The container's own boundaries are not
/// part of the output, so position 0 is the start of its first child.
pub fn linearize(schema: &Schema, doc: &Node) -> Result<MarkedString, DiffError> {
    let mut table = MetaTable::default();
    let (chars, metas) = Linearizer::new(schema, &mut table).run(doc)?;
    Ok(MarkedString::new(chars, metas, Arc::new(table)))
}

/// Linearize two documents into one descriptor arena, so equal descriptors
/// across the pair share ids.
pub fn linearize_pair(
    schema: &Schema,
    left: &Node,
    right: &Node,
) -> Result<(MarkedString, MarkedString), DiffError> {
    let mut table = MetaTable::default();
    let (lc, lm) = Linearizer::new(schema, &mut table).run(left)?;
    let (rc, rm) = Linearizer::new(schema, &mut table).run(right)?;
    let table = Arc::new(table);
    Ok((
        MarkedString::new(lc, lm, Arc::clone(&table)),
        MarkedString::new(rc, rm, table),
    ))
}

enum Visit<'a> {
    Enter(&'a Node),
    /// Close a block with the descriptor its opening sentinel used.
    Exit(MetaId),
}

struct Linearizer<'s, 't> {
    schema: &'s Schema,
    table: &'t mut MetaTable,
    chars: Vec<char>,
    metas: Vec<MetaId>,
}

impl<'s, 't> Linearizer<'s, 't> {
    fn new(schema: &'s Schema, table: &'t mut MetaTable) -> Self {
        Self {
            schema,
            table,
            chars: Vec::new(),
            metas: Vec::new(),
        }
    }

    fn push(&mut self, c: char, meta: MetaId) {
        self.chars.push(c);
        self.metas.push(meta);
    }

    fn run(mut self, doc: &Node) -> Result<(Vec<char>, Vec<MetaId>), DiffError> {
        let mut ancestors = vec![Ancestor::root(&doc.kind, &doc.attrs)];
        let mut stack: Vec<Visit<'_>> = doc.content.iter().rev().map(Visit::Enter).collect();

        while let Some(visit) = stack.pop() {
            let node = match visit {
                Visit::Exit(meta) => {
                    ancestors.pop();
                    self.push(BLOCK_END, meta);
                    continue;
                }
                Visit::Enter(node) => node,
            };
            let Some(parent) = ancestors.last() else {
                return Err(DiffError::Unbalanced {
                    pos: self.chars.len(),
                });
            };

            if node.is_text() {
                let text = node.text.as_deref().unwrap_or_default();
                if text.is_empty() {
                    continue;
                }
                if text.chars().any(is_sentinel) {
                    return Err(DiffError::ReservedCharacter {
                        kind: node.kind.clone(),
                    });
                }
                let meta = self.table.intern(NodeMeta::new(
                    &node.kind,
                    &node.marks,
                    &node.attrs,
                    parent,
                    false,
                    false,
                ));
                for c in text.chars() {
                    self.push(c, meta);
                }
                continue;
            }

            let spec = self
                .schema
                .spec(&node.kind)
                .ok_or_else(|| DiffError::UnsupportedNode {
                    kind: node.kind.clone(),
                })?;
            let meta = self.table.intern(NodeMeta::new(
                &node.kind,
                &node.marks,
                &node.attrs,
                parent,
                spec.list,
                spec.line_break,
            ));

            if spec.leaf {
                if !node.content.is_empty() {
                    return Err(DiffError::UnsupportedNode {
                        kind: node.kind.clone(),
                    });
                }
                self.push(LEAF, meta);
            } else if !spec.inline {
                self.push(BLOCK_START, meta);
                let child = parent.child(&node.kind, &node.attrs);
                ancestors.push(child);
                stack.push(Visit::Exit(meta));
                stack.extend(node.content.iter().rev().map(Visit::Enter));
            } else {
                return Err(DiffError::UnsupportedNode {
                    kind: node.kind.clone(),
                });
            }
        }

        Ok((self.chars, self.metas))
    }
}

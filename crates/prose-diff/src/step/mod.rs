//! Replace steps, position mapping and change replay.
//!
//! Positions follow the usual document convention: a text character or a
//! leaf is one position, any other node adds one position before and one
//! after its content.

use crate::changes::Change;
use crate::error::DiffError;
use crate::linearize::{build_nodes, linearize, NodeMeta, Slice};
use crate::model::{Node, Schema};

/// Replace `from..to` of a document with `slice`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaceStep {
    pub from: usize,
    pub to: usize,
    pub slice: Slice,
}

impl ReplaceStep {
    /// Position map of this step. The slice size is measured with `schema`.
    pub fn step_map(&self, schema: &Schema) -> StepMap {
        let size: usize = self.slice.content.iter().map(|n| schema.node_size(n)).sum();
        let new_size = size.saturating_sub(self.slice.open_start + self.slice.open_end);
        StepMap::new(vec![MapRange {
            start: self.from,
            old_size: self.to - self.from,
            new_size,
        }])
    }
}

// ── Mapping ───────────────────────────────────────────────────────────────

/// Which side a position sticks to when content is inserted exactly at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    Before,
    #[default]
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// The content around the mapped position was deleted.
    pub deleted: bool,
}

/// Replaced ranges of a single step, sorted by start, in the coordinates of
/// the document before the step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StepMap {
    ranges: Vec<MapRange>,
}

impl StepMap {
    pub fn new(ranges: Vec<MapRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[MapRange] {
        &self.ranges
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.start + range.old_size;
            if pos <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos == range.start {
                    Assoc::Before
                } else if pos == end {
                    Assoc::After
                } else {
                    assoc
                };
                let base = offset(range.start, diff);
                let mapped = match side {
                    Assoc::Before => base,
                    Assoc::After => base + range.new_size,
                };
                let edge = match assoc {
                    Assoc::Before => range.start,
                    Assoc::After => end,
                };
                return MapResult {
                    pos: mapped,
                    deleted: pos != edge,
                };
            }
            diff += range.new_size as isize - range.old_size as isize;
        }
        MapResult {
            pos: offset(pos, diff),
            deleted: false,
        }
    }
}

fn offset(pos: usize, diff: isize) -> usize {
    pos.checked_add_signed(diff).unwrap_or(0)
}

/// A sequence of step maps applied one after another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    /// Mapping from the original to the modified document of a change list.
    /// Each change is addressed in the coordinates left by the ones before
    /// it, so the maps compose left to right.
    pub fn from_changes(changes: &[Change]) -> Self {
        let mut mapping = Mapping::default();
        let mut delta: isize = 0;
        for change in changes {
            let old_size = change.to() - change.from();
            let new_size = change.ins_to() - change.ins_from();
            mapping.append_map(StepMap::new(vec![MapRange {
                start: offset(change.from(), delta),
                old_size,
                new_size,
            }]));
            delta += new_size as isize - old_size as isize;
        }
        mapping
    }

    pub fn append_map(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut deleted = false;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map_result(pos, assoc);
            deleted |= result.deleted;
            pos = result.pos;
        }
        MapResult { pos, deleted }
    }
}

// ── Replay ────────────────────────────────────────────────────────────────

/// Apply every accepted change to `doc`. Changes must be ordered by
/// position and must still match the content they were extracted from.
pub fn apply_changes(schema: &Schema, doc: &Node, changes: &[Change]) -> Result<Node, DiffError> {
    let seq = linearize(schema, doc)?;
    let mut items: Vec<(char, &NodeMeta)> = Vec::with_capacity(seq.len());
    let mut cursor = 0;

    for change in changes.iter().filter(|c| c.is_accepted()) {
        let (from, to) = (change.from(), change.to());
        if from < cursor {
            return Err(DiffError::StaleChange { from, to });
        }
        let current = seq
            .slice_pos(from, to)
            .ok_or(DiffError::PositionOutOfRange {
                pos: to,
                size: seq.len(),
            })?;
        if !current.same_content(change.deleted()) {
            return Err(DiffError::StaleChange { from, to });
        }
        items.extend((cursor..from).map(|i| (seq.char_at(i), seq.meta_at(i))));
        items.extend(change.inserted().iter());
        cursor = to;
    }
    items.extend((cursor..seq.len()).map(|i| (seq.char_at(i), seq.meta_at(i))));

    let content = build_nodes(items)?;
    let mut out = Node::new(doc.kind.as_str()).with_content(content);
    out.attrs = doc.attrs.clone();
    out.marks = doc.marks.clone();
    Ok(out)
}

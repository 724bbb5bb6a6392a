//! Turns token diff opcodes into replace operations
//! addressed in both documents' coordinates.

mod block_split;

use tracing::debug;

use crate::error::DiffError;
use crate::linearize::{linearize_pair, MarkedString, Slice};
use crate::model::{Node, Schema};
use crate::options::{DiffOptions, ExtractMode};
use crate::step::ReplaceStep;
use crate::token_diff::{self, DiffOp};

/// One replacement: `deleted` is a span of the original document, `inserted`
/// a span of the modified one. Either side may be an empty span, which then
/// only carries a position.
#[derive(Debug, Clone)]
pub struct Change {
    deleted: MarkedString,
    inserted: MarkedString,
    /// Top-level units removed by this change.
    pub removed_block_length: usize,
    /// Top-level units added by this change.
    pub added_block_length: usize,
    accepted: bool,
}

impl Change {
    pub fn new(deleted: MarkedString, inserted: MarkedString) -> Self {
        Self {
            removed_block_length: deleted.top_level_units(),
            added_block_length: inserted.top_level_units(),
            deleted,
            inserted,
            accepted: true,
        }
    }

    /// Start of the deleted range in the original document.
    pub fn from(&self) -> usize {
        self.deleted.start_pos()
    }

    /// End of the deleted range in the original document.
    pub fn to(&self) -> usize {
        self.deleted.end_pos()
    }

    /// Start of the inserted range in the modified document.
    pub fn ins_from(&self) -> usize {
        self.inserted.start_pos()
    }

    /// End of the inserted range in the modified document.
    pub fn ins_to(&self) -> usize {
        self.inserted.end_pos()
    }

    pub fn deleted(&self) -> &MarkedString {
        &self.deleted
    }

    pub fn inserted(&self) -> &MarkedString {
        &self.inserted
    }

    pub fn is_insertion(&self) -> bool {
        self.deleted.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.inserted.is_empty()
    }

    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    pub fn set_accepted(&mut self, accepted: bool) {
        self.accepted = accepted;
    }

    /// The replace step that applies this change to the original document.
    pub fn step(&self) -> ReplaceStep {
        ReplaceStep {
            from: self.from(),
            to: self.to(),
            slice: self.inserted.to_slice(),
        }
    }

    /// Removed literal text, trimmed.
    pub fn deleted_text(&self) -> String {
        self.deleted.text_content().trim().to_owned()
    }

    /// Added literal text, trimmed.
    pub fn added_text(&self) -> String {
        self.inserted.text_content().trim().to_owned()
    }

    pub fn deleted_slice(&self) -> Slice {
        self.deleted.to_slice()
    }

    pub fn inserted_slice(&self) -> Slice {
        self.inserted.to_slice()
    }

    /// Re-address this change relative to a chunk starting at `left_offset`
    /// in the original and `right_offset` in the modified document, whose
    /// sizes are `left_size` and `right_size`.
    pub fn rebased(
        &self,
        left_offset: usize,
        right_offset: usize,
        left_size: usize,
        right_size: usize,
    ) -> Result<Change, DiffError> {
        let deleted = rebase_span(&self.deleted, left_offset, left_size)?;
        let inserted = rebase_span(&self.inserted, right_offset, right_size)?;
        Ok(Change {
            deleted,
            inserted,
            ..self.clone()
        })
    }
}

fn rebase_span(span: &MarkedString, offset: usize, size: usize) -> Result<MarkedString, DiffError> {
    if span.start_pos() < offset {
        return Err(DiffError::PositionOutOfRange {
            pos: span.start_pos(),
            size,
        });
    }
    let start = span.start_pos() - offset;
    if start + span.len() > size {
        return Err(DiffError::PositionOutOfRange {
            pos: start + span.len(),
            size,
        });
    }
    Ok(span.with_start_pos(start))
}

impl PartialEq for Change {
    fn eq(&self, other: &Self) -> bool {
        self.from() == other.from()
            && self.to() == other.to()
            && self.ins_from() == other.ins_from()
            && self.ins_to() == other.ins_to()
            && self.accepted == other.accepted
            && self.removed_block_length == other.removed_block_length
            && self.added_block_length == other.added_block_length
            && self.deleted.same_content(&other.deleted)
            && self.inserted.same_content(&other.inserted)
    }
}

/// Extract the changes that turn `left` into `right` (or `right` into `left`
/// when `options.is_inverted` is set). The result is ordered by position in
/// the original document.
pub fn extract_changes(
    schema: &Schema,
    left: &Node,
    right: &Node,
    options: &DiffOptions,
) -> Result<Vec<Change>, DiffError> {
    let (left, right) = if options.is_inverted {
        (right, left)
    } else {
        (left, right)
    };
    if left == right {
        return Ok(Vec::new());
    }

    let (l, r) = linearize_pair(schema, left, right)?;
    let diff_options = DiffOptions {
        cleanup_semantic: false,
        ..options.clone()
    };
    let ops = token_diff::diff(&l, &r, &diff_options);

    let mut changes = Vec::new();
    let mut pos_delta: isize = 0;
    let mut i = 0;
    while i < ops.len() {
        let (op, span) = &ops[i];
        i += 1;
        let (mut deleted, mut inserted) = match op {
            DiffOp::Unchanged => continue,
            DiffOp::Removed => (Some(span.clone()), None),
            DiffOp::Inserted => (None, Some(span.clone())),
        };
        match (op, ops.get(i)) {
            (DiffOp::Removed, Some((DiffOp::Inserted, next))) => {
                inserted = Some(next.clone());
                i += 1;
            }
            (DiffOp::Inserted, Some((DiffOp::Removed, next))) => {
                deleted = Some(next.clone());
                i += 1;
            }
            _ => {}
        }

        let (deleted, inserted) = match (deleted, inserted) {
            (Some(d), Some(ins)) => (d, ins),
            (Some(d), None) => {
                let at = shift(d.start_pos(), pos_delta);
                let ins = r.point_at(at);
                (d, ins)
            }
            (None, Some(ins)) => {
                let at = shift(ins.start_pos(), -pos_delta);
                (l.point_at(at), ins)
            }
            (None, None) => continue,
        };
        if deleted.is_empty() && inserted.is_empty() {
            continue;
        }
        if !deleted.is_empty() && !inserted.is_empty() && deleted.same_content(&inserted) {
            continue;
        }
        pos_delta += inserted.len() as isize - deleted.len() as isize;
        changes.push(Change::new(deleted, inserted));
    }

    if options.extract_mode == ExtractMode::BlockSplit {
        changes = block_split::split(changes);
    }
    debug!(
        changes = changes.len(),
        left_len = l.len(),
        right_len = r.len(),
        "extracted changes"
    );
    Ok(changes)
}

fn shift(pos: usize, delta: isize) -> usize {
    pos.checked_add_signed(delta).unwrap_or(0)
}

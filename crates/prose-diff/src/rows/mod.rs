//! Groups top-level nodes of both documents into
//! side-by-side rows, each carrying the changes that fall inside it.
//!
//! [`RowChunker`] is a resumable state machine: [`RowChunker::run_batch`]
//! processes a bounded number of left nodes and returns, so the caller
//! decides when to continue. [`compute_rows`] drives it, yielding to the
//! runtime between batches.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::changes::Change;
use crate::error::DiffError;
use crate::model::{Node, Schema};
use crate::options::RowOptions;

/// One side-by-side row. `left`/`right` wrap the row's top-level nodes in a
/// minimal document and are `None` when that side contributes nothing.
///
/// Changes are addressed relative to the start of the chunk the row was cut
/// from, on both sides. A chunk touched by an accepted change is one row. A
/// chunk only rejected changes touch is shown as unchanged: its nodes pair
/// one to one, any surplus on one side follows in a row whose other side is
/// empty, and the chunk's changes ride on its last row.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffRow {
    pub left: Option<Node>,
    pub right: Option<Node>,
    pub left_count: usize,
    pub right_count: usize,
    pub changes: Vec<Change>,
    pub has_added_content: bool,
    pub has_removed_content: bool,
}

/// Cooperative cancellation flag shared between a host and a running
/// [`compute_rows`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Top-level nodes of one document plus a cursor.
struct Side<'a> {
    nodes: &'a [Node],
    /// `starts[i]` is the position of node `i`; the last entry is the
    /// content size.
    starts: Vec<usize>,
    idx: usize,
}

impl<'a> Side<'a> {
    fn new(schema: &Schema, doc: &'a Node) -> Self {
        let mut starts = Vec::with_capacity(doc.content.len() + 1);
        let mut pos = 0;
        starts.push(pos);
        for node in &doc.content {
            pos += schema.node_size(node);
            starts.push(pos);
        }
        Self {
            nodes: &doc.content,
            starts,
            idx: 0,
        }
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn remaining(&self) -> usize {
        self.len() - self.idx
    }

    fn pos(&self) -> usize {
        self.starts[self.idx]
    }

    fn end(&self) -> usize {
        self.starts[self.len()]
    }

    /// Index of the node starting at `pos`, or `len()` for the end.
    fn index_at(&self, pos: usize) -> Option<usize> {
        self.starts.binary_search(&pos).ok()
    }

    fn take(&mut self, schema: &Schema, end_idx: usize) -> Option<Node> {
        let all = self.nodes;
        let nodes = &all[self.idx..end_idx];
        self.idx = end_idx;
        (!nodes.is_empty()).then(|| schema.fragment(nodes.to_vec()))
    }
}

pub struct RowChunker<'a> {
    schema: &'a Schema,
    left: Side<'a>,
    right: Side<'a>,
    pending: VecDeque<Change>,
    /// Inserted minus deleted length of every change consumed so far.
    delta: isize,
    rows: Vec<DiffRow>,
}

impl<'a> RowChunker<'a> {
    pub fn new(schema: &'a Schema, left: &'a Node, right: &'a Node, changes: &[Change]) -> Self {
        let mut pending: Vec<Change> = changes.to_vec();
        pending.sort_by_key(|c| c.from());
        Self {
            schema,
            left: Side::new(schema, left),
            right: Side::new(schema, right),
            pending: pending.into(),
            delta: 0,
            rows: Vec::new(),
        }
    }

    /// Number of top-level nodes of the left document.
    pub fn left_len(&self) -> usize {
        self.left.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_done(&self) -> bool {
        self.left.remaining() == 0 && self.right.remaining() == 0 && self.pending.is_empty()
    }

    /// Emit rows until at least `max_left_nodes` left nodes were consumed or
    /// everything is done. Returns whether everything is done.
    pub fn run_batch(&mut self, max_left_nodes: usize) -> Result<bool, DiffError> {
        let target = self.left.idx + max_left_nodes.max(1);
        while !self.is_done() && self.left.idx < target {
            self.next_rows()?;
        }
        Ok(self.is_done())
    }

    pub fn run_to_end(&mut self) -> Result<(), DiffError> {
        while !self.is_done() {
            self.next_rows()?;
        }
        Ok(())
    }

    /// Freeze the rows produced so far.
    pub fn finish(self) -> Arc<[DiffRow]> {
        self.rows.into()
    }

    /// Cut the next chunk and emit its rows.
    fn next_rows(&mut self) -> Result<(), DiffError> {
        if let Some(row) = self.inserted_nodes_row()? {
            self.rows.push(row);
            return Ok(());
        }

        let l_start = self.left.pos();
        let r_start = self.right.pos();
        let exhausted = self.left.remaining() == 0;
        let mut l_count = usize::from(!exhausted);
        let mut drained: Vec<Change> = Vec::new();
        let mut delta = self.delta;

        let (l_end, r_end) = loop {
            let l_end = self.left.starts[self.left.idx + l_count];
            let last = self.left.idx + l_count == self.left.len();
            while let Some(front) = self.pending.front() {
                if !(exhausted || front.from() < l_end) {
                    break;
                }
                if let Some(change) = self.pending.pop_front() {
                    delta += span_delta(&change);
                    drained.push(change);
                }
            }
            if exhausted {
                break (l_end, self.right.end());
            }
            let reaches_past = drained.iter().any(|c| c.to() > l_end);
            let r_end = l_end
                .checked_add_signed(delta)
                .filter(|&r| r >= r_start && self.right.index_at(r).is_some());
            if let (false, Some(r_end)) = (reaches_past, r_end) {
                break (l_end, r_end);
            }
            if last {
                // No left boundary lines up: everything that is left goes
                // into this row.
                while let Some(change) = self.pending.pop_front() {
                    delta += span_delta(&change);
                    drained.push(change);
                }
                break (l_end, self.right.end());
            }
            l_count += 1;
        };

        let r_end_idx = self
            .right
            .index_at(r_end)
            .ok_or(DiffError::PositionOutOfRange {
                pos: r_end,
                size: self.right.end(),
            })?;
        let r_count = r_end_idx - self.right.idx;
        if l_count == 0 && r_count == 0 && drained.is_empty() {
            return Err(DiffError::PositionOutOfRange {
                pos: l_start,
                size: self.left.end(),
            });
        }

        self.delta = delta;
        let changes = rebase_all(&drained, (l_start, l_end), (r_start, r_end))?;
        let affected = changes.iter().any(Change::is_accepted);
        if !affected && l_count.min(r_count) > 0 && (l_count, r_count) != (1, 1) {
            self.push_unaffected(l_count, r_count, changes);
        } else {
            let left = self.left.take(self.schema, self.left.idx + l_count);
            let right = self.right.take(self.schema, r_end_idx);
            self.rows.push(DiffRow::new(left, right, l_count, r_count, changes));
        }
        Ok(())
    }

    /// Rows of a chunk no accepted change touches.
    fn push_unaffected(&mut self, l_count: usize, r_count: usize, mut changes: Vec<Change>) {
        let pairs = l_count.min(r_count);
        let surplus = l_count != r_count;
        for i in 0..pairs {
            let left = self.left.take(self.schema, self.left.idx + 1);
            let right = self.right.take(self.schema, self.right.idx + 1);
            let carried = if i + 1 == pairs && !surplus {
                std::mem::take(&mut changes)
            } else {
                Vec::new()
            };
            self.rows.push(DiffRow::new(left, right, 1, 1, carried));
        }
        if surplus {
            let (l_rest, r_rest) = (l_count - pairs, r_count - pairs);
            let left = self.left.take(self.schema, self.left.idx + l_rest);
            let right = self.right.take(self.schema, self.right.idx + r_rest);
            self.rows.push(DiffRow::new(left, right, l_rest, r_rest, changes));
        }
        trace!(l_count, r_count, "chunk without accepted changes shown as pairs");
    }

    /// A pending pure insertion of whole top-level nodes exactly at both
    /// cursors becomes a row with nothing on the left.
    fn inserted_nodes_row(&mut self) -> Result<Option<DiffRow>, DiffError> {
        let l_start = self.left.pos();
        let r_start = self.right.pos();
        let Some(front) = self.pending.front() else {
            return Ok(None);
        };
        if !front.is_insertion() || front.from() != l_start || front.ins_from() != r_start {
            return Ok(None);
        }
        let Some(r_end_idx) = self.right.index_at(front.ins_to()) else {
            return Ok(None);
        };
        let Some(change) = self.pending.pop_front() else {
            return Ok(None);
        };
        let r_end = change.ins_to();
        self.delta += span_delta(&change);
        let r_count = r_end_idx - self.right.idx;
        let changes = rebase_all(&[change], (l_start, l_start), (r_start, r_end))?;
        let right = self.right.take(self.schema, r_end_idx);
        Ok(Some(DiffRow::new(None, right, 0, r_count, changes)))
    }
}

impl DiffRow {
    fn new(
        left: Option<Node>,
        right: Option<Node>,
        left_count: usize,
        right_count: usize,
        changes: Vec<Change>,
    ) -> Self {
        let accepted = || changes.iter().filter(|c| c.is_accepted());
        let has_added_content = accepted().any(|c| !c.inserted().is_empty());
        let has_removed_content = accepted().any(|c| !c.deleted().is_empty());
        Self {
            left,
            right,
            left_count,
            right_count,
            has_added_content,
            has_removed_content,
            changes,
        }
    }
}

/// Re-address `changes` to a chunk spanning `l_start..l_end` and
/// `r_start..r_end`.
fn rebase_all(
    changes: &[Change],
    (l_start, l_end): (usize, usize),
    (r_start, r_end): (usize, usize),
) -> Result<Vec<Change>, DiffError> {
    changes
        .iter()
        .map(|c| c.rebased(l_start, r_start, l_end - l_start, r_end - r_start))
        .collect()
}

fn span_delta(change: &Change) -> isize {
    change.inserted().len() as isize - change.deleted().len() as isize
}

/// Chunk `left` and `right` into rows. Small inputs run to completion in one
/// go; larger ones run in batches with a yield to the runtime between
/// batches, checking `cancel` at every batch boundary.
pub async fn compute_rows(
    schema: &Schema,
    left: &Node,
    right: &Node,
    changes: &[Change],
    options: &RowOptions,
    cancel: &CancelToken,
) -> Result<Arc<[DiffRow]>, DiffError> {
    let mut chunker = RowChunker::new(schema, left, right, changes);
    if chunker.left_len() < options.sync_threshold {
        chunker.run_to_end()?;
        debug!(rows = chunker.row_count(), "computed rows synchronously");
        return Ok(chunker.finish());
    }

    loop {
        if cancel.is_cancelled() {
            debug!(rows = chunker.row_count(), "row computation cancelled");
            return Err(DiffError::Cancelled);
        }
        if chunker.run_batch(options.batch_size)? {
            break;
        }
        trace!(rows = chunker.row_count(), "yielding between row batches");
        tokio::task::yield_now().await;
    }
    debug!(rows = chunker.row_count(), "computed rows in batches");
    Ok(chunker.finish())
}

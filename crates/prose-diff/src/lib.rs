//! prose-diff — structured rich-text document diff.
//!
//! Compares two versions of a document tree and produces replace operations
//! that can be shown as inline markup, replayed against the original
//! document, or grouped into side-by-side rows.
//!
//! Pipeline: [`linearize()`] both documents into one marked sequence each,
//! [`token_diff`] them, turn the opcodes into [`Change`]s with
//! [`extract_changes`], and optionally chunk into [`DiffRow`]s with
//! [`compute_rows`].

// Leaf modules
pub mod error;
pub mod json_stable;
pub mod model;
pub mod options;

pub mod linearize;
pub mod token_diff;
pub mod changes;
pub mod step;
pub mod rows;

pub use changes::{extract_changes, Change};
pub use error::DiffError;
pub use linearize::{linearize, linearize_pair, MarkedString, Slice};
pub use model::{Attrs, Mark, Node, NodeSpec, Schema};
pub use options::{CutMode, DiffOptions, ExtractMode, RowOptions};
pub use rows::{compute_rows, CancelToken, DiffRow, RowChunker};
pub use step::{apply_changes, Assoc, Mapping, ReplaceStep, StepMap};
pub use token_diff::{diff, DiffOp};

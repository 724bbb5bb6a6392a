//! Error type shared by every stage of the engine.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// A node the schema does not know, or a leaf node with content.
    #[error("unsupported node type: {kind}")]
    UnsupportedNode { kind: String },
    #[error("text of `{kind}` node contains a reserved sentinel character")]
    ReservedCharacter { kind: String },
    #[error("unbalanced block structure at position {pos}")]
    Unbalanced { pos: usize },
    #[error("position {pos} out of range (size {size})")]
    PositionOutOfRange { pos: usize, size: usize },
    #[error("change {from}..{to} does not match the document")]
    StaleChange { from: usize, to: usize },
    #[error("row computation cancelled")]
    Cancelled,
}

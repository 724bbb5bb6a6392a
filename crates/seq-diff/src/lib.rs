//! prose-diff-seq — generic sequence diff.
//!
//! A Myers O(ND) difference algorithm over slices of arbitrary tokens, plus
//! the cleanup passes that turn its raw output into readable edit runs.
//! Tokens only need `Eq + Clone`; callers that diff large alphabets intern
//! their tokens into small integers first.

pub mod cleanup;
pub mod myers;

pub use cleanup::{cleanup_merge, cleanup_semantic};
pub use myers::{
    diff, diff_with_deadline, invert, normalize, overlap, patch_dst, patch_src, pfx, sfx,
    Deadline, Patch, PatchOpType, PatchOperation,
};

//! Token Diff Engine — diffs two marked sequences at word or character
//! granularity.
//!
//! Tokens are keyed by their characters *and* their descriptors, so a word
//! that only changed its marks is still a different token. Keys are interned
//! into `u32` ids and the generic sequence diff runs over the id streams.

mod tokenize;

use std::collections::HashMap;
use std::ops::Range;

use prose_diff_seq::{cleanup_semantic, diff_with_deadline, Deadline, PatchOpType};
use tracing::warn;

use crate::linearize::MarkedString;
use crate::options::DiffOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffOp {
    Unchanged,
    Inserted,
    Removed,
}

/// Diff `left` against `right`.
///
/// Removed spans are views into `left`; inserted and unchanged spans are
/// views into `right`. Every span keeps its document position.
pub fn diff(
    left: &MarkedString,
    right: &MarkedString,
    options: &DiffOptions,
) -> Vec<(DiffOp, MarkedString)> {
    let left_tokens = tokenize::tokenize(left, options.cut_mode);
    let right_tokens = tokenize::tokenize(right, options.cut_mode);

    let mut unifier = MetaUnifier::default();
    let left_metas = unifier.unify(left);
    let right_metas = unifier.unify(right);

    let mut ids = HashMap::new();
    let src = intern(&mut ids, left, &left_metas, &left_tokens);
    let dst = intern(&mut ids, right, &right_metas, &right_tokens);

    let deadline = Deadline::after(options.timeout());
    let mut patch = diff_with_deadline(&src, &dst, &deadline);
    if deadline.expired() {
        warn!(
            left_tokens = src.len(),
            right_tokens = dst.len(),
            timeout_ms = options.timeout_ms,
            "token diff hit its deadline, result is coarser than minimal"
        );
    }
    if options.cleanup_semantic {
        cleanup_semantic(&mut patch);
    }

    let mut out = Vec::with_capacity(patch.len());
    let (mut lt, mut rt) = (0usize, 0usize);
    for (op, run) in patch {
        let n = run.len();
        match op {
            PatchOpType::Del => {
                out.push((DiffOp::Removed, span(left, &left_tokens, lt, n)));
                lt += n;
            }
            PatchOpType::Ins => {
                out.push((DiffOp::Inserted, span(right, &right_tokens, rt, n)));
                rt += n;
            }
            PatchOpType::Eql => {
                out.push((DiffOp::Unchanged, span(right, &right_tokens, rt, n)));
                lt += n;
                rt += n;
            }
        }
    }
    out
}

/// Token ids for `tokens`, assigned from 1 in order of first appearance.
fn intern<'a>(
    ids: &mut HashMap<(&'a [char], &'a [u32]), u32>,
    seq: &'a MarkedString,
    metas: &'a [u32],
    tokens: &[Range<usize>],
) -> Vec<u32> {
    tokens
        .iter()
        .map(|r| {
            let key = (&seq.chars()[r.clone()], &metas[r.clone()]);
            let next = ids.len() as u32 + 1;
            *ids.entry(key).or_insert(next)
        })
        .collect()
}

/// View over tokens `first..first + n` of `seq`.
fn span(seq: &MarkedString, tokens: &[Range<usize>], first: usize, n: usize) -> MarkedString {
    if n == 0 {
        let at = tokens.get(first).map_or(seq.len(), |r| r.start);
        return seq.slice(at, at);
    }
    seq.slice(tokens[first].start, tokens[first + n - 1].end)
}

/// Maps descriptors of either sequence to ids that are equal iff the
/// descriptors' identities are, regardless of which arena they came from.
#[derive(Default)]
struct MetaUnifier {
    by_identity: HashMap<String, u32>,
}

impl MetaUnifier {
    fn unify(&mut self, seq: &MarkedString) -> Vec<u32> {
        let table = seq.table();
        let mut cache: Vec<Option<u32>> = vec![None; table.len()];
        seq.meta_ids()
            .iter()
            .map(|id| {
                if let Some(unified) = cache[id.index()] {
                    return unified;
                }
                let identity = table.get(*id).identity();
                let next = self.by_identity.len() as u32;
                let unified = *self
                    .by_identity
                    .entry(identity.to_owned())
                    .or_insert(next);
                cache[id.index()] = Some(unified);
                unified
            })
            .collect()
    }
}

//! Myers O(ND) difference algorithm over token slices.
//!
//! The algorithm is the middle-snake bisection variant: common prefix and
//! suffix are stripped first, a containment shortcut handles the case where
//! one side is a run inside the other, and the remaining middle block is
//! split recursively at the first overlapping snake.
//!
//! All lengths are in tokens. A token is any `T: Eq + Clone`; the document
//! engine diffs interned `u32` token ids.

use std::cell::Cell;
use std::time::{Duration, Instant};

use crate::cleanup::cleanup_merge;

// ── Types ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchOpType {
    Del = -1,
    Eql = 0,
    Ins = 1,
}

pub type PatchOperation<T> = (PatchOpType, Vec<T>);
pub type Patch<T> = Vec<PatchOperation<T>>;

/// Wall-clock budget shared by one diff call and all of its recursive
/// sub-problems.
///
/// Once the budget is spent, every bisection still running gives up and
/// reports its sub-problem as delete-all/insert-all. The result stays a
/// valid patch, just a coarser one.
#[derive(Debug)]
pub struct Deadline {
    at: Option<Instant>,
    expired: Cell<bool>,
}

impl Deadline {
    /// A deadline `budget` from now. A zero budget means no deadline.
    pub fn after(budget: Duration) -> Self {
        let at = if budget.is_zero() {
            None
        } else {
            Instant::now().checked_add(budget)
        };
        Self {
            at,
            expired: Cell::new(false),
        }
    }

    /// No deadline at all.
    pub fn unlimited() -> Self {
        Self {
            at: None,
            expired: Cell::new(false),
        }
    }

    /// Whether any bisection hit the deadline so far.
    pub fn expired(&self) -> bool {
        self.expired.get()
    }

    fn reached(&self) -> bool {
        match self.at {
            Some(at) if Instant::now() >= at => {
                self.expired.set(true);
                true
            }
            _ => false,
        }
    }
}

// ── Public utilities ──────────────────────────────────────────────────────

/// Merge consecutive operations of the same type; discard empty operations.
pub fn normalize<T>(patch: Patch<T>) -> Patch<T> {
    let mut result: Patch<T> = Vec::with_capacity(patch.len());
    for (op_type, tokens) in patch {
        if tokens.is_empty() {
            continue;
        }
        match result.last_mut() {
            Some(last) if last.0 == op_type => last.1.extend(tokens),
            _ => result.push((op_type, tokens)),
        }
    }
    result
}

/// Compute the diff between `src` and `dst` without any time budget.
pub fn diff<T: Eq + Clone>(src: &[T], dst: &[T]) -> Patch<T> {
    diff_internal(src, dst, &Deadline::unlimited())
}

/// Compute the diff between `src` and `dst`, degrading to coarser output
/// once `deadline` is reached.
pub fn diff_with_deadline<T: Eq + Clone>(src: &[T], dst: &[T], deadline: &Deadline) -> Patch<T> {
    diff_internal(src, dst, deadline)
}

/// Reconstruct the source sequence from a patch.
pub fn patch_src<T: Clone>(patch: &Patch<T>) -> Vec<T> {
    let mut out = Vec::new();
    for (op_type, tokens) in patch {
        if *op_type != PatchOpType::Ins {
            out.extend_from_slice(tokens);
        }
    }
    out
}

/// Reconstruct the destination sequence from a patch.
pub fn patch_dst<T: Clone>(patch: &Patch<T>) -> Vec<T> {
    let mut out = Vec::new();
    for (op_type, tokens) in patch {
        if *op_type != PatchOpType::Del {
            out.extend_from_slice(tokens);
        }
    }
    out
}

/// Invert a patch so it transforms dst → src instead of src → dst.
pub fn invert<T>(patch: Patch<T>) -> Patch<T> {
    patch
        .into_iter()
        .map(|(op_type, tokens)| {
            let inv = match op_type {
                PatchOpType::Eql => PatchOpType::Eql,
                PatchOpType::Ins => PatchOpType::Del,
                PatchOpType::Del => PatchOpType::Ins,
            };
            (inv, tokens)
        })
        .collect()
}

/// Number of tokens in the common prefix of `a` and `b`.
pub fn pfx<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() || a[0] != b[0] {
        return 0;
    }
    let mut min = 0usize;
    let mut max = a.len().min(b.len());
    let mut mid = max;
    let mut start = 0;
    while min < mid {
        if a[start..mid] == b[start..mid] {
            min = mid;
            start = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

/// Number of tokens in the common suffix of `a` and `b`.
pub fn sfx<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let n1 = a.len();
    let n2 = b.len();
    if n1 == 0 || n2 == 0 || a[n1 - 1] != b[n2 - 1] {
        return 0;
    }
    let mut min = 0usize;
    let mut max = n1.min(n2);
    let mut mid = max;
    let mut end = 0;
    while min < mid {
        if a[n1 - mid..n1 - end] == b[n2 - mid..n2 - end] {
            min = mid;
            end = min;
        } else {
            max = mid;
        }
        mid = (max - min) / 2 + min;
    }
    mid
}

/// Length of the longest suffix of `a` that is a prefix of `b`.
pub fn overlap<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let n1 = a.len();
    let n2 = b.len();
    if n1 == 0 || n2 == 0 {
        return 0;
    }

    let min_len = n1.min(n2);
    let a = if n1 > n2 { &a[n1 - n2..] } else { a };
    let b = if n1 < n2 { &b[..n1] } else { b };

    if a == b {
        return min_len;
    }

    let mut best = 0usize;
    let mut length = 1usize;
    loop {
        let pattern = &a[min_len - length..];
        match find_slice(b, pattern) {
            None => return best,
            Some(found) => {
                length += found;
                if found == 0 || a[min_len - length..] == b[..length] {
                    best = length;
                    length += 1;
                }
            }
        }
    }
}

/// First occurrence of `needle` in `haystack`.
pub(crate) fn find_slice<T: PartialEq>(haystack: &[T], needle: &[T]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

// ── Core diff algorithm ───────────────────────────────────────────────────

fn diff_internal<T: Eq + Clone>(src: &[T], dst: &[T], deadline: &Deadline) -> Patch<T> {
    if src == dst {
        return if src.is_empty() {
            vec![]
        } else {
            vec![(PatchOpType::Eql, src.to_vec())]
        };
    }

    let prefix_len = pfx(src, dst);
    let prefix = &src[..prefix_len];
    let src = &src[prefix_len..];
    let dst = &dst[prefix_len..];

    let suffix_len = sfx(src, dst);
    let suffix = &src[src.len() - suffix_len..];
    let src = &src[..src.len() - suffix_len];
    let dst = &dst[..dst.len() - suffix_len];

    let mut result = diff_no_common_affix(src, dst, deadline);
    if !prefix.is_empty() {
        result.insert(0, (PatchOpType::Eql, prefix.to_vec()));
    }
    if !suffix.is_empty() {
        result.push((PatchOpType::Eql, suffix.to_vec()));
    }

    cleanup_merge(&mut result);
    result
}

fn diff_no_common_affix<T: Eq + Clone>(c1: &[T], c2: &[T], deadline: &Deadline) -> Patch<T> {
    if c1.is_empty() {
        return if c2.is_empty() {
            vec![]
        } else {
            vec![(PatchOpType::Ins, c2.to_vec())]
        };
    }
    if c2.is_empty() {
        return vec![(PatchOpType::Del, c1.to_vec())];
    }

    // Shorter side contained in the longer one
    let (long, short, long_is_src) = if c1.len() > c2.len() {
        (c1, c2, true)
    } else {
        (c2, c1, false)
    };
    if let Some(idx) = find_slice(long, short) {
        let edge = if long_is_src {
            PatchOpType::Del
        } else {
            PatchOpType::Ins
        };
        let mut patch = vec![];
        if idx > 0 {
            patch.push((edge, long[..idx].to_vec()));
        }
        patch.push((PatchOpType::Eql, short.to_vec()));
        if idx + short.len() < long.len() {
            patch.push((edge, long[idx + short.len()..].to_vec()));
        }
        return patch;
    }

    if short.len() == 1 {
        return vec![
            (PatchOpType::Del, c1.to_vec()),
            (PatchOpType::Ins, c2.to_vec()),
        ];
    }

    bisect(c1, c2, deadline)
}

fn bisect<T: Eq + Clone>(c1: &[T], c2: &[T], deadline: &Deadline) -> Patch<T> {
    let n1 = c1.len();
    let n2 = c2.len();
    let max_d = (n1 + n2).div_ceil(2) + 1;
    let v_offset = max_d;
    let v_length = 2 * max_d;

    let mut v1: Vec<i64> = vec![-1; v_length];
    let mut v2: Vec<i64> = vec![-1; v_length];
    v1[v_offset + 1] = 0;
    v2[v_offset + 1] = 0;

    let delta = n1 as i64 - n2 as i64;
    let front = delta % 2 != 0;

    let mut k1start = 0i64;
    let mut k1end = 0i64;
    let mut k2start = 0i64;
    let mut k2end = 0i64;

    for d in 0..max_d as i64 {
        if deadline.reached() {
            break;
        }

        // Forward path
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset as i64 + k1) as usize;
            let mut x1: i64 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n1 as i64 && y1 < n2 as i64 && c1[x1 as usize] == c2[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;
            if x1 > n1 as i64 {
                k1end += 2;
            } else if y1 > n2 as i64 {
                k1start += 2;
            } else if front {
                let k2_offset = (v_offset as i64 + delta - k1) as usize;
                if k2_offset < v_length && v2[k2_offset] != -1 && x1 >= n1 as i64 - v2[k2_offset] {
                    return bisect_split(c1, c2, x1 as usize, y1 as usize, deadline);
                }
            }
            k1 += 2;
        }

        // Reverse path
        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset as i64 + k2) as usize;
            let mut x2: i64 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n1 as i64
                && y2 < n2 as i64
                && c1[n1 - 1 - x2 as usize] == c2[n2 - 1 - y2 as usize]
            {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;
            if x2 > n1 as i64 {
                k2end += 2;
            } else if y2 > n2 as i64 {
                k2start += 2;
            } else if !front {
                let k1_offset = (v_offset as i64 + delta - k2) as usize;
                if k1_offset < v_length {
                    let x1 = v1[k1_offset];
                    if x1 != -1 {
                        let y1 = v_offset as i64 + x1 - k1_offset as i64;
                        let x2_real = n1 as i64 - x2;
                        if x1 >= x2_real {
                            return bisect_split(c1, c2, x1 as usize, y1 as usize, deadline);
                        }
                    }
                }
            }
            k2 += 2;
        }
    }

    // Out of time or no split found
    vec![
        (PatchOpType::Del, c1.to_vec()),
        (PatchOpType::Ins, c2.to_vec()),
    ]
}

fn bisect_split<T: Eq + Clone>(
    c1: &[T],
    c2: &[T],
    x: usize,
    y: usize,
    deadline: &Deadline,
) -> Patch<T> {
    let mut result = diff_internal(&c1[..x], &c2[..y], deadline);
    result.extend(diff_internal(&c1[x..], &c2[y..], deadline));
    result
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn text(tokens: &[char]) -> String {
        tokens.iter().collect()
    }

    #[test]
    fn pfx_empty() {
        assert_eq!(pfx(&chars(""), &chars("hello")), 0);
        assert_eq!(pfx(&chars("hello"), &chars("")), 0);
    }

    #[test]
    fn pfx_basic() {
        assert_eq!(pfx(&chars("hello"), &chars("helloworld")), 5);
        assert_eq!(pfx(&chars("abc"), &chars("abd")), 2);
        assert_eq!(pfx(&[1u32, 2, 3], &[4u32, 2, 3]), 0);
    }

    #[test]
    fn sfx_basic() {
        assert_eq!(sfx(&chars("hello"), &chars("world")), 0);
        assert_eq!(sfx(&chars("hello"), &chars("jello")), 4);
        assert_eq!(sfx(&[7u32, 8, 9], &[8u32, 9]), 2);
    }

    #[test]
    fn overlap_basic() {
        assert_eq!(overlap(&chars("abcxxx"), &chars("xxxdef")), 3);
        assert_eq!(overlap(&chars("abc"), &chars("abc")), 3);
        assert_eq!(overlap(&chars("abc"), &chars("xyz")), 0);
    }

    #[test]
    fn diff_equal_sequences() {
        let p = diff(&[1u32, 2, 3], &[1u32, 2, 3]);
        assert_eq!(p, vec![(PatchOpType::Eql, vec![1, 2, 3])]);
    }

    #[test]
    fn diff_empty_sides() {
        assert_eq!(diff::<u32>(&[], &[]), vec![]);
        assert_eq!(diff(&[], &[5u32]), vec![(PatchOpType::Ins, vec![5])]);
        assert_eq!(diff(&[5u32], &[]), vec![(PatchOpType::Del, vec![5])]);
    }

    #[test]
    fn diff_single_token_replacement() {
        let p = diff(&[1u32, 2, 3], &[1u32, 4, 3]);
        assert_eq!(
            p,
            vec![
                (PatchOpType::Eql, vec![1]),
                (PatchOpType::Del, vec![2]),
                (PatchOpType::Ins, vec![4]),
                (PatchOpType::Eql, vec![3]),
            ]
        );
    }

    #[test]
    fn diff_containment() {
        let p = diff(&[2u32, 3], &[1u32, 2, 3, 4]);
        assert_eq!(
            p,
            vec![
                (PatchOpType::Ins, vec![1]),
                (PatchOpType::Eql, vec![2, 3]),
                (PatchOpType::Ins, vec![4]),
            ]
        );
    }

    #[test]
    fn diff_roundtrip_src_dst() {
        let s = chars("the quick brown fox");
        let d = chars("the slow green fox");
        let p = diff(&s, &d);
        assert_eq!(text(&patch_src(&p)), "the quick brown fox");
        assert_eq!(text(&patch_dst(&p)), "the slow green fox");
    }

    #[test]
    fn expired_deadline_degrades_but_stays_valid() {
        let deadline = Deadline::after(Duration::from_nanos(1));
        std::thread::sleep(Duration::from_millis(2));
        let s = chars("abcdefghij");
        let d = chars("axcyegiqj");
        let p = diff_with_deadline(&s, &d, &deadline);
        assert!(deadline.expired());
        assert_eq!(patch_src(&p), s);
        assert_eq!(patch_dst(&p), d);
    }

    #[test]
    fn zero_budget_means_unlimited() {
        let deadline = Deadline::after(Duration::ZERO);
        let p = diff_with_deadline(&chars("abcdef"), &chars("abxdyf"), &deadline);
        assert!(!deadline.expired());
        assert_eq!(text(&patch_dst(&p)), "abxdyf");
    }

    #[test]
    fn normalize_merges_consecutive() {
        let patch = vec![
            (PatchOpType::Ins, vec![1u32]),
            (PatchOpType::Ins, vec![2u32]),
            (PatchOpType::Eql, vec![]),
        ];
        assert_eq!(normalize(patch), vec![(PatchOpType::Ins, vec![1, 2])]);
    }

    #[test]
    fn invert_patch() {
        let p = diff(&chars("abc"), &chars("aXc"));
        let inv = invert(p);
        assert_eq!(text(&patch_src(&inv)), "aXc");
        assert_eq!(text(&patch_dst(&inv)), "abc");
    }
}

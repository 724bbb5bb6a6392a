//! Patch cleanup passes.
//!
//! [`cleanup_merge`] normalises a raw patch: it merges runs, factors common
//! prefixes and suffixes out of paired deletions/insertions, and slides
//! single edits over neighbouring equalities when that lets two equalities
//! merge.
//!
//! [`cleanup_semantic`] trades minimality for readability by absorbing short
//! equalities that sit between larger edits and by extracting overlaps
//! between adjacent deletions and insertions. Lengths are measured in
//! tokens; there is no character-class boundary scoring because tokens are
//! opaque here.

use crate::myers::{overlap, pfx, sfx, Patch, PatchOpType};

// ── cleanup_merge ─────────────────────────────────────────────────────────

pub fn cleanup_merge<T: Eq + Clone>(diff: &mut Patch<T>) {
    diff.push((PatchOpType::Eql, Vec::new()));
    let mut pointer = 0usize;
    let mut del_cnt = 0usize;
    let mut ins_cnt = 0usize;
    let mut del_run: Vec<T> = Vec::new();
    let mut ins_run: Vec<T> = Vec::new();

    while pointer < diff.len() {
        if pointer < diff.len() - 1 && diff[pointer].1.is_empty() {
            diff.remove(pointer);
            continue;
        }

        match diff[pointer].0 {
            PatchOpType::Ins => {
                ins_cnt += 1;
                ins_run.extend_from_slice(&diff[pointer].1);
                pointer += 1;
            }
            PatchOpType::Del => {
                del_cnt += 1;
                del_run.extend_from_slice(&diff[pointer].1);
                pointer += 1;
            }
            PatchOpType::Eql => {
                let prev_eq = pointer.checked_sub(ins_cnt + del_cnt + 1);

                if !del_run.is_empty() || !ins_run.is_empty() {
                    if !del_run.is_empty() && !ins_run.is_empty() {
                        // Factor out common prefix
                        let common = pfx(&ins_run, &del_run);
                        if common > 0 {
                            let prefix: Vec<T> = ins_run[..common].to_vec();
                            match prev_eq {
                                Some(pq) => diff[pq].1.extend(prefix),
                                None => {
                                    diff.insert(0, (PatchOpType::Eql, prefix));
                                    pointer += 1;
                                }
                            }
                            ins_run.drain(..common);
                            del_run.drain(..common);
                        }

                        // Factor out common suffix
                        let common = sfx(&ins_run, &del_run);
                        if common > 0 {
                            let ins_len = ins_run.len();
                            let mut merged: Vec<T> = ins_run[ins_len - common..].to_vec();
                            merged.extend_from_slice(&diff[pointer].1);
                            diff[pointer].1 = merged;
                            ins_run.truncate(ins_len - common);
                            let del_len = del_run.len();
                            del_run.truncate(del_len - common);
                        }
                    }

                    // Splice the run back as at most one Del and one Ins
                    let start = pointer - (ins_cnt + del_cnt);
                    let mut replacement: Patch<T> = Vec::with_capacity(2);
                    if !del_run.is_empty() {
                        replacement.push((PatchOpType::Del, std::mem::take(&mut del_run)));
                    }
                    if !ins_run.is_empty() {
                        replacement.push((PatchOpType::Ins, std::mem::take(&mut ins_run)));
                    }
                    let added = replacement.len();
                    let _ = diff.splice(start..pointer, replacement);
                    pointer = start + added;
                }

                if pointer != 0 && diff[pointer - 1].0 == PatchOpType::Eql {
                    let tail = std::mem::take(&mut diff[pointer].1);
                    diff[pointer - 1].1.extend(tail);
                    diff.remove(pointer);
                } else {
                    pointer += 1;
                }

                ins_cnt = 0;
                del_cnt = 0;
                del_run.clear();
                ins_run.clear();
            }
        }
    }

    if diff.last().map(|(_, t)| t.is_empty()) == Some(true) {
        diff.pop();
    }

    // Second pass: shift single edits sideways to eliminate equalities
    let mut changes = false;
    let mut pointer = 1usize;
    while pointer + 1 < diff.len() {
        let prev_type = diff[pointer - 1].0;
        let next_type = diff[pointer + 1].0;
        if prev_type == PatchOpType::Eql && next_type == PatchOpType::Eql {
            let prev = diff[pointer - 1].1.clone();
            let cur = diff[pointer].1.clone();
            let next = diff[pointer + 1].1.clone();

            if !prev.is_empty() && cur.ends_with(&prev) {
                // Shift edit over previous equality
                let mut new_cur = prev.clone();
                new_cur.extend_from_slice(&cur[..cur.len() - prev.len()]);
                let mut new_next = prev;
                new_next.extend_from_slice(&next);
                diff[pointer].1 = new_cur;
                diff[pointer + 1].1 = new_next;
                diff.remove(pointer - 1);
                changes = true;
            } else if !next.is_empty() && cur.starts_with(&next) {
                // Shift edit over next equality
                let mut new_prev = prev;
                new_prev.extend_from_slice(&next);
                let mut new_cur = cur[next.len()..].to_vec();
                new_cur.extend_from_slice(&next);
                diff[pointer - 1].1 = new_prev;
                diff[pointer].1 = new_cur;
                diff.remove(pointer + 1);
                changes = true;
                pointer += 1;
            } else {
                pointer += 1;
            }
        } else {
            pointer += 1;
        }
    }

    if changes {
        cleanup_merge(diff);
    }
}

// ── cleanup_semantic ──────────────────────────────────────────────────────

pub fn cleanup_semantic<T: Eq + Clone>(diff: &mut Patch<T>) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<usize> = None;
    let mut pointer = 0usize;
    let mut len_ins1 = 0usize;
    let mut len_del1 = 0usize;
    let mut len_ins2 = 0usize;
    let mut len_del2 = 0usize;

    while pointer < diff.len() {
        if diff[pointer].0 == PatchOpType::Eql {
            equalities.push(pointer);
            len_ins1 = len_ins2;
            len_del1 = len_del2;
            len_ins2 = 0;
            len_del2 = 0;
            last_equality = Some(diff[pointer].1.len());
            pointer += 1;
            continue;
        }

        if diff[pointer].0 == PatchOpType::Ins {
            len_ins2 += diff[pointer].1.len();
        } else {
            len_del2 += diff[pointer].1.len();
        }

        let absorb = match last_equality {
            Some(eq_len) => {
                eq_len <= len_ins1.max(len_del1) && eq_len <= len_ins2.max(len_del2)
            }
            None => false,
        };
        if absorb {
            if let Some(eq_idx) = equalities.pop() {
                // The equality becomes a deletion followed by an insertion
                let tokens = diff[eq_idx].1.clone();
                diff.insert(eq_idx, (PatchOpType::Del, tokens));
                diff[eq_idx + 1].0 = PatchOpType::Ins;
                // The previous equality needs re-evaluation
                equalities.pop();
                pointer = match equalities.last() {
                    Some(&p) => p + 1,
                    None => 0,
                };
                len_ins1 = 0;
                len_del1 = 0;
                len_ins2 = 0;
                len_del2 = 0;
                last_equality = None;
                changes = true;
                continue;
            }
        }
        pointer += 1;
    }

    if changes {
        cleanup_merge(diff);
    }

    // Extract overlaps between adjacent deletions and insertions
    let mut pointer = 1usize;
    while pointer < diff.len() {
        if diff[pointer - 1].0 == PatchOpType::Del && diff[pointer].0 == PatchOpType::Ins {
            let deletion = diff[pointer - 1].1.clone();
            let insertion = diff[pointer].1.clone();
            let ov1 = overlap(&deletion, &insertion);
            let ov2 = overlap(&insertion, &deletion);
            if ov1 >= ov2 {
                if ov1 > 0 && (ov1 * 2 >= deletion.len() || ov1 * 2 >= insertion.len()) {
                    diff.insert(pointer, (PatchOpType::Eql, insertion[..ov1].to_vec()));
                    diff[pointer - 1].1 = deletion[..deletion.len() - ov1].to_vec();
                    diff[pointer + 1].1 = insertion[ov1..].to_vec();
                    pointer += 1;
                }
            } else if ov2 * 2 >= deletion.len() || ov2 * 2 >= insertion.len() {
                diff.insert(pointer, (PatchOpType::Eql, deletion[..ov2].to_vec()));
                diff[pointer - 1] = (
                    PatchOpType::Ins,
                    insertion[..insertion.len() - ov2].to_vec(),
                );
                diff[pointer + 1] = (PatchOpType::Del, deletion[ov2..].to_vec());
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }

    diff.retain(|(_, tokens)| !tokens.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::myers::{diff, patch_dst, patch_src};

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn merge_factors_common_prefix_and_suffix() {
        let mut p = vec![
            (PatchOpType::Del, chars("abc")),
            (PatchOpType::Ins, chars("abxc")),
        ];
        cleanup_merge(&mut p);
        assert_eq!(
            p,
            vec![
                (PatchOpType::Eql, chars("ab")),
                (PatchOpType::Ins, chars("x")),
                (PatchOpType::Eql, chars("c")),
            ]
        );
    }

    #[test]
    fn merge_joins_runs() {
        let mut p = vec![
            (PatchOpType::Eql, chars("a")),
            (PatchOpType::Eql, chars("b")),
            (PatchOpType::Ins, chars("c")),
            (PatchOpType::Ins, chars("d")),
        ];
        cleanup_merge(&mut p);
        assert_eq!(
            p,
            vec![(PatchOpType::Eql, chars("ab")), (PatchOpType::Ins, chars("cd"))]
        );
    }

    #[test]
    fn merge_slides_edit_left() {
        let mut p = vec![
            (PatchOpType::Eql, chars("a")),
            (PatchOpType::Ins, chars("ba")),
            (PatchOpType::Eql, chars("c")),
        ];
        cleanup_merge(&mut p);
        assert_eq!(
            p,
            vec![(PatchOpType::Ins, chars("ab")), (PatchOpType::Eql, chars("ac"))]
        );
    }

    #[test]
    fn semantic_absorbs_short_equality() {
        let mut p = vec![
            (PatchOpType::Del, chars("ab")),
            (PatchOpType::Eql, chars("c")),
            (PatchOpType::Del, chars("de")),
        ];
        cleanup_semantic(&mut p);
        assert_eq!(
            p,
            vec![(PatchOpType::Del, chars("abcde")), (PatchOpType::Ins, chars("c"))]
        );
    }

    #[test]
    fn semantic_keeps_long_equality() {
        let mut p = vec![
            (PatchOpType::Del, chars("a")),
            (PatchOpType::Eql, chars("bcd")),
            (PatchOpType::Ins, chars("e")),
        ];
        let before = p.clone();
        cleanup_semantic(&mut p);
        assert_eq!(p, before);
    }

    #[test]
    fn semantic_extracts_overlap() {
        let mut p = vec![
            (PatchOpType::Del, chars("abcxxx")),
            (PatchOpType::Ins, chars("xxxdef")),
        ];
        cleanup_semantic(&mut p);
        assert_eq!(
            p,
            vec![
                (PatchOpType::Del, chars("abc")),
                (PatchOpType::Eql, chars("xxx")),
                (PatchOpType::Ins, chars("def")),
            ]
        );
    }

    #[test]
    fn semantic_preserves_both_sides() {
        let src = chars("the cat sat on the mat");
        let dst = chars("the cat sat on the bat");
        let mut p = diff(&src, &dst);
        cleanup_semantic(&mut p);
        assert_eq!(patch_src(&p), src);
        assert_eq!(patch_dst(&p), dst);
    }
}

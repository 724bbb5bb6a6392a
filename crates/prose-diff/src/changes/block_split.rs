use super::Change;
use crate::linearize::{MarkedString, BLOCK_END, LEAF};

/// Split every change at top-level unit boundaries, pair the parts of both
/// sides head to head and trim what the parts of a pair have in common.
pub(super) fn split(changes: Vec<Change>) -> Vec<Change> {
    let mut out = Vec::with_capacity(changes.len());
    for change in changes {
        let deleted = units(&change.deleted);
        let inserted = units(&change.inserted);
        let deleted_end = change.deleted.point_at(change.deleted.end_pos());
        let inserted_end = change.inserted.point_at(change.inserted.end_pos());

        for k in 0..deleted.len().max(inserted.len()) {
            let d = deleted.get(k).unwrap_or(&deleted_end);
            let ins = inserted.get(k).unwrap_or(&inserted_end);
            let (d, ins) = trim(d, ins);
            if d.is_empty() && ins.is_empty() {
                continue;
            }
            let mut part = Change::new(d, ins);
            part.set_accepted(change.is_accepted());
            out.push(part);
        }
    }
    out
}

/// Cut `seq` after every top-level block end and top-level leaf.
fn units(seq: &MarkedString) -> Vec<MarkedString> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, (c, meta)) in seq.iter().enumerate() {
        if meta.depth == 1 && matches!(c, BLOCK_END | LEAF) {
            parts.push(seq.slice(start, i + 1));
            start = i + 1;
        }
    }
    if start < seq.len() {
        parts.push(seq.slice(start, seq.len()));
    }
    parts
}

/// Drop the identical head and tail of a pair: structural sentinels and
/// literal characters alike, as long as descriptors match too.
fn trim(d: &MarkedString, ins: &MarkedString) -> (MarkedString, MarkedString) {
    let same = |i: usize, j: usize| d.slice(i, i + 1).same_content(&ins.slice(j, j + 1));

    let max = d.len().min(ins.len());
    let mut head = 0;
    while head < max && same(head, head) {
        head += 1;
    }
    let mut tail = 0;
    while tail < max - head && same(d.len() - 1 - tail, ins.len() - 1 - tail) {
        tail += 1;
    }
    (
        d.slice(head, d.len() - tail),
        ins.slice(head, ins.len() - tail),
    )
}

#[cfg(test)]
mod tests {
    use crate::changes::extract_changes;
    use crate::model::{Node, Schema};
    use crate::options::{DiffOptions, ExtractMode};

    fn doc(paras: &[&str]) -> Node {
        Schema::basic().fragment(
            paras
                .iter()
                .map(|t| Node::new("paragraph").with_content(vec![Node::text(*t)]))
                .collect(),
        )
    }

    fn split_opts() -> DiffOptions {
        DiffOptions::default().with_extract_mode(ExtractMode::BlockSplit)
    }

    #[test]
    fn multi_block_replacement_is_split_and_trimmed() {
        let schema = Schema::basic();
        let left = doc(&["alpha", "beta"]);
        let right = doc(&["alpha2", "beta2"]);

        let combined = extract_changes(&schema, &left, &right, &DiffOptions::default()).unwrap();
        assert_eq!(combined.len(), 1);

        let split = extract_changes(&schema, &left, &right, &split_opts()).unwrap();
        assert_eq!(split.len(), 2);
        assert!(split[0].is_insertion());
        assert_eq!((split[0].from(), split[0].to()), (6, 6));
        assert_eq!((split[0].ins_from(), split[0].ins_to()), (6, 7));
        assert_eq!(split[0].added_text(), "2");
        assert_eq!(split[1].from(), 12);
        assert_eq!(split[1].ins_from(), 13);
        assert_eq!(split[1].added_text(), "2");
        assert_eq!(split[0].removed_block_length, 0);
        assert_eq!(split[1].added_block_length, 0);
    }

    #[test]
    fn unpaired_parts_become_insertions_at_the_end() {
        let schema = Schema::basic();
        let split = extract_changes(
            &schema,
            &doc(&["one"]),
            &doc(&["uno", "dos"]),
            &split_opts(),
        )
        .unwrap();
        assert_eq!(split.len(), 2);
        assert_eq!(split[0].deleted_text(), "one");
        assert_eq!(split[0].added_text(), "uno");
        assert!(split[1].is_insertion());
        assert_eq!((split[1].from(), split[1].to()), (5, 5));
        assert_eq!(split[1].added_block_length, 1);
        assert_eq!(split[1].added_text(), "dos");
    }

    #[test]
    fn acceptance_is_inherited() {
        let schema = Schema::basic();
        let split =
            extract_changes(&schema, &doc(&["a"]), &doc(&["b"]), &split_opts()).unwrap();
        assert!(split.iter().all(|c| c.is_accepted()));
        assert_eq!(split[0].deleted().text(), "a");
    }
}

use std::ops::Range;

use crate::linearize::{MarkedString, BLOCK_END, BLOCK_START, LEAF};
use crate::options::CutMode;

/// Split `seq` into contiguous, non-empty token ranges covering all of it.
pub(crate) fn tokenize(seq: &MarkedString, mode: CutMode) -> Vec<Range<usize>> {
    match mode {
        CutMode::Char => (0..seq.len()).map(|i| i..i + 1).collect(),
        CutMode::Word => words(seq),
    }
}

fn words(seq: &MarkedString) -> Vec<Range<usize>> {
    let chars = seq.chars();
    let mut tokens = Vec::new();
    let mut start = 0;

    for (i, &c) in chars.iter().enumerate() {
        let meta = seq.meta_at(i);
        match c {
            LEAF if meta.line_break => cut(&mut tokens, &mut start, i + 1),
            LEAF => {
                cut(&mut tokens, &mut start, i);
                cut(&mut tokens, &mut start, i + 1);
            }
            BLOCK_START | BLOCK_END if meta.list => {
                cut(&mut tokens, &mut start, i);
                cut(&mut tokens, &mut start, i + 1);
            }
            BLOCK_END => cut(&mut tokens, &mut start, i + 1),
            c if c.is_whitespace() => {
                if chars.get(i + 1) != Some(&BLOCK_END) {
                    cut(&mut tokens, &mut start, i + 1);
                }
            }
            _ => {}
        }
    }
    cut(&mut tokens, &mut start, chars.len());
    tokens
}

fn cut(tokens: &mut Vec<Range<usize>>, start: &mut usize, end: usize) {
    if end > *start {
        tokens.push(*start..end);
    }
    *start = end;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linearize::linearize;
    use crate::model::{Node, Schema};

    fn tokens_of(doc: &Node, mode: CutMode) -> Vec<String> {
        let schema = Schema::basic();
        let seq = linearize(&schema, doc).unwrap();
        tokenize(&seq, mode)
            .into_iter()
            .map(|r| {
                seq.slice(r.start, r.end)
                    .chars()
                    .iter()
                    .map(|c| match *c {
                        BLOCK_START => '<',
                        BLOCK_END => '>',
                        LEAF => '*',
                        c => c,
                    })
                    .collect()
            })
            .collect()
    }

    fn para(children: Vec<Node>) -> Node {
        Node::new("paragraph").with_content(children)
    }

    #[test]
    fn words_end_after_whitespace_and_blocks() {
        let doc = Schema::basic().fragment(vec![
            para(vec![Node::text("a bb c")]),
            para(vec![Node::text("d")]),
        ]);
        assert_eq!(
            tokens_of(&doc, CutMode::Word),
            vec!["<a ", "bb ", "c>", "<d>"]
        );
    }

    #[test]
    fn trailing_whitespace_sticks_to_block_end() {
        let doc = Schema::basic().fragment(vec![para(vec![Node::text("a b ")])]);
        assert_eq!(tokens_of(&doc, CutMode::Word), vec!["<a ", "b >"]);
    }

    #[test]
    fn leaves_stand_alone_but_line_breaks_stick() {
        let doc = Schema::basic().fragment(vec![para(vec![
            Node::text("ab"),
            Node::new("image"),
            Node::text("cd"),
            Node::new("hard_break"),
            Node::text("e"),
        ])]);
        assert_eq!(
            tokens_of(&doc, CutMode::Word),
            vec!["<ab", "*", "cd*", "e>"]
        );
    }

    #[test]
    fn list_sentinels_are_their_own_tokens() {
        let doc = Schema::basic().fragment(vec![Node::new("bullet_list").with_content(vec![
            Node::new("list_item").with_content(vec![para(vec![Node::text("x y")])]),
        ])]);
        assert_eq!(
            tokens_of(&doc, CutMode::Word),
            vec!["<", "<", "<x ", "y>", ">", ">"]
        );
    }

    #[test]
    fn char_mode_cuts_everything() {
        let doc = Schema::basic().fragment(vec![para(vec![Node::text("ab")])]);
        assert_eq!(tokens_of(&doc, CutMode::Char), vec!["<", "a", "b", ">"]);
    }
}

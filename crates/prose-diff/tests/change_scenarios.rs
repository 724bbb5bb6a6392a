mod common;

use common::{bold, doc, h, li, p, paragraphs, sample_article, schema, text, top_level, ul};
use prose_diff::{
    apply_changes, extract_changes, Assoc, CutMode, DiffError, DiffOptions, ExtractMode, Mapping,
    Node,
};

fn changes(left: &Node, right: &Node) -> Vec<prose_diff::Change> {
    extract_changes(&schema(), left, right, &DiffOptions::default()).unwrap()
}

fn block_balance(left: &Node, right: &Node, opts: &DiffOptions) -> isize {
    extract_changes(&schema(), left, right, opts)
        .unwrap()
        .iter()
        .map(|c| c.added_block_length as isize - c.removed_block_length as isize)
        .sum()
}

// ── Scenarios ─────────────────────────────────────────────────────────────

#[test]
fn pure_text_replacement() {
    let left = paragraphs(&["a b c"]);
    let right = paragraphs(&["a MEH c"]);
    let found = changes(&left, &right);
    assert_eq!(found.len(), 1);
    let c = &found[0];
    assert_eq!((c.from(), c.to()), (3, 5));
    assert_eq!(c.inserted().text(), "MEH ");
    assert_eq!(c.deleted_text(), "b");
    assert_eq!(c.added_text(), "MEH");
    assert_eq!((c.removed_block_length, c.added_block_length), (0, 0));
}

#[test]
fn mark_only_change() {
    let left = doc(vec![p(vec![text("make this loud")])]);
    let right = doc(vec![p(vec![text("make this "), bold("loud")])]);
    let found = changes(&left, &right);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].deleted_text(), "loud");
    assert_eq!(found[0].added_text(), "loud");
    assert_eq!(found[0].from(), found[0].ins_from());
    assert_eq!(apply_changes(&schema(), &left, &found).unwrap(), right);
}

#[test]
fn pure_insertion_at_end() {
    let left = paragraphs(&["first"]);
    let right = paragraphs(&["first", "second"]);
    let found = changes(&left, &right);
    assert_eq!(found.len(), 1);
    let c = &found[0];
    assert!(c.is_insertion());
    assert_eq!((c.from(), c.to()), (7, 7));
    assert_eq!((c.ins_from(), c.ins_to()), (7, 15));
    assert_eq!(c.added_block_length, 1);
    assert_eq!(c.added_text(), "second");
    assert!(c.inserted_slice().content[0].kind == "paragraph");
}

#[test]
fn identical_documents_yield_nothing() {
    let article = sample_article();
    assert!(changes(&article, &article.clone()).is_empty());
    let empty = doc(vec![]);
    assert!(changes(&empty, &empty.clone()).is_empty());
}

#[test]
fn empty_to_content_and_back() {
    let empty = doc(vec![]);
    let full = paragraphs(&["one", "two"]);
    let added = changes(&empty, &full);
    assert_eq!(added.len(), 1);
    assert_eq!(added[0].added_block_length, 2);
    let removed = changes(&full, &empty);
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].removed_block_length, 2);
    assert_eq!(apply_changes(&schema(), &full, &removed).unwrap(), empty);
}

#[test]
fn heading_level_change_is_detected() {
    let left = doc(vec![h(1, vec![text("Title")])]);
    let right = doc(vec![h(2, vec![text("Title")])]);
    let found = changes(&left, &right);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].deleted_slice().content[0].attrs["level"], 1);
    assert_eq!(found[0].inserted_slice().content[0].attrs["level"], 2);
    assert_eq!(apply_changes(&schema(), &left, &found).unwrap(), right);
}

#[test]
fn list_edits_replay() {
    let left = doc(vec![ul(vec![
        li(vec![p(vec![text("milk")])]),
        li(vec![p(vec![text("eggs")])]),
    ])]);
    let right = doc(vec![ul(vec![
        li(vec![p(vec![text("milk")])]),
        li(vec![p(vec![text("bread")])]),
        li(vec![p(vec![text("eggs")])]),
    ])]);
    let found = changes(&left, &right);
    assert!(!found.is_empty());
    assert!(found.iter().all(|c| c.removed_block_length == 0 && c.added_block_length == 0));
    assert_eq!(apply_changes(&schema(), &left, &found).unwrap(), right);
}

// ── Properties on a realistic document ────────────────────────────────────

fn edited_article() -> Node {
    let mut article = sample_article();
    article.content[0] = h(2, vec![text("Release notes")]);
    article.content[1] = p(vec![text("This release "), bold("fixes"), text(" three bugs.")]);
    article.content[2] = ul(vec![
        li(vec![p(vec![text("crash on start")])]),
        li(vec![p(vec![text("slow search")])]),
        li(vec![p(vec![text("typo in menu")])]),
    ]);
    article.content.remove(3);
    article
        .content
        .extend(paragraphs(&["Thanks!", "See you next time."]).content);
    article
}

#[test]
fn replay_turns_original_into_modified() {
    let left = sample_article();
    let right = edited_article();
    for mode in [ExtractMode::Combined, ExtractMode::BlockSplit] {
        for cut in [CutMode::Word, CutMode::Char] {
            let opts = DiffOptions::default()
                .with_extract_mode(mode)
                .with_cut_mode(cut);
            let found = extract_changes(&schema(), &left, &right, &opts).unwrap();
            assert_eq!(
                apply_changes(&schema(), &left, &found).unwrap(),
                right,
                "{mode:?}/{cut:?}"
            );
        }
    }
}

#[test]
fn block_lengths_balance_top_level_counts() {
    let left = sample_article();
    let right = edited_article();
    let expected = top_level(&right) as isize - top_level(&left) as isize;
    assert_eq!(expected, 1);
    assert_eq!(block_balance(&left, &right, &DiffOptions::default()), expected);
    let split = DiffOptions::default().with_extract_mode(ExtractMode::BlockSplit);
    assert_eq!(block_balance(&left, &right, &split), expected);
    assert_eq!(
        block_balance(&right, &left, &DiffOptions::default()),
        -expected
    );
}

#[test]
fn inverted_extraction_replays_on_the_right_document() {
    let left = sample_article();
    let right = edited_article();
    let opts = DiffOptions::default().inverted();
    let found = extract_changes(&schema(), &left, &right, &opts).unwrap();
    assert_eq!(apply_changes(&schema(), &right, &found).unwrap(), left);
}

#[test]
fn changes_are_ordered_and_disjoint() {
    let found = changes(&sample_article(), &edited_article());
    for pair in found.windows(2) {
        assert!(pair[0].to() <= pair[1].from());
        assert!(pair[0].ins_to() <= pair[1].ins_from());
    }
}

#[test]
fn mapping_sends_unchanged_positions_across() {
    let left = paragraphs(&["keep", "old words here", "tail"]);
    let right = paragraphs(&["keep", "new words here", "extra", "tail"]);
    let found = changes(&left, &right);
    let mapping = Mapping::from_changes(&found);
    // Start of "tail": after "<keep>" (6) and "<old words here>" (16).
    assert_eq!(mapping.map(22, Assoc::After), 22 + 7);
    // Inside "keep" nothing moves.
    assert_eq!(mapping.map(2, Assoc::After), 2);
    let deleted = mapping.map_result(8, Assoc::After);
    assert!(deleted.deleted);
}

#[test]
fn reserved_characters_are_an_error() {
    let bad = paragraphs(&["a\u{E000}b"]);
    assert!(matches!(
        extract_changes(&schema(), &bad, &paragraphs(&["x"]), &DiffOptions::default()),
        Err(DiffError::ReservedCharacter { .. })
    ));
}

#[test]
fn options_load_from_json() {
    let opts: DiffOptions = serde_json::from_str(r#"{"cut_mode":"char"}"#).unwrap();
    let found = extract_changes(
        &schema(),
        &paragraphs(&["colour"]),
        &paragraphs(&["color"]),
        &opts,
    )
    .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].deleted_text(), "u");
    assert!(found[0].is_deletion());
}

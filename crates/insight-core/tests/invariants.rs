//! Randomized invariant checks
//!
//! Random edit / insert / erase / modify sequences on a scene, checking after every step that:
//! 1. the index stays sorted by `(left, right)`;
//! 2. every range lies inside the document and no collapsed insight survives a drain;
//! 3. the incrementally maintained formats equal a from-scratch rendering of the index;
//! 4. no insight survives entirely inside text an edit just wrote (its old text is gone).

use insight_core::{
    Document, FormatSpan, Insight, InsightIndex, InsightKind, ParagraphLayout, SceneDocument,
    SceneOptions,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WORDS: &[&str] = &[
    "a", "lorem ", "ipsum\n", "\n", "dolor sit", "—", "你好", "\n\n", "\r", "x\r\n", "\r\n",
];

fn expected_formats(doc: &Document, index: &InsightIndex, paragraph: usize) -> Vec<FormatSpan> {
    let start = doc.paragraph_start(paragraph);
    let end = start + doc.paragraph_len(paragraph);
    let mut spans: Vec<FormatSpan> = index
        .iter()
        .filter_map(|insight| {
            let (left, right) = insight.range();
            let from = left.max(start);
            let to = right.min(end);
            (to > from).then(|| FormatSpan::new(from - start, to - from, insight.format().id))
        })
        .collect();
    spans.sort_by_key(|s| (s.start, s.len, s.format));
    spans
}

fn check(scene: &SceneDocument, step: usize, written: Option<(usize, usize)>) {
    let doc = scene.document();
    let index = scene.index();
    let ranges: Vec<(usize, usize)> = index.iter().map(Insight::range).collect();

    assert!(
        ranges.windows(2).all(|w| w[0] <= w[1]),
        "step {step}: unsorted {ranges:?}"
    );
    for &(left, right) in &ranges {
        assert!(left < right, "step {step}: collapsed insight survived");
        assert!(right <= doc.len_chars(), "step {step}: out of bounds");
    }
    assert_eq!(index.pending_removals().count(), 0, "step {step}");
    if let Some((start, end)) = written {
        for &(left, right) in &ranges {
            assert!(
                !(start <= left && right <= end),
                "step {step}: ({left}, {right}) lies inside rewritten {start}..{end}"
            );
        }
    }

    for paragraph in 0..doc.paragraph_count() {
        let mut actual = doc.formats(paragraph).to_vec();
        actual.sort_by_key(|s| (s.start, s.len, s.format));
        assert_eq!(
            actual,
            expected_formats(doc, index, paragraph),
            "step {step}: paragraph {paragraph}"
        );
    }
}

fn random_insight(rng: &mut StdRng, len: usize) -> Option<Insight> {
    if len < 2 {
        return None;
    }
    let left = rng.gen_range(0..len - 1);
    let right = rng.gen_range(left + 1..=len.min(left + 40));
    let kind = match rng.gen_range(0..4) {
        0 => InsightKind::Note,
        1 => InsightKind::Spelling,
        2 => InsightKind::Grammar,
        _ => InsightKind::Typography,
    };
    Insight::new(kind, left, right, len, "random", vec!["fix".to_string()]).ok()
}

fn run(seed: u64, steps: usize) {
    let mut rng = StdRng::seed_from_u64(seed);
    let text = "The quick brown fox\njumps over\n\nthe lazy dog.\nEnd";
    let mut scene = SceneDocument::new(text, SceneOptions::default());

    for step in 0..steps {
        let len = scene.document().len_chars();
        let mut written = None;
        match rng.gen_range(0..10) {
            0..=2 => {
                if let Some(insight) = random_insight(&mut rng, len) {
                    scene.add_insight(insight);
                }
            }
            3..=4 => {
                let offset = rng.gen_range(0..=len);
                let word = WORDS[rng.gen_range(0..WORDS.len())];
                scene.insert_text(offset, word).unwrap();
                written = Some((offset, offset + word.chars().count()));
            }
            5..=6 if len > 0 => {
                let offset = rng.gen_range(0..len);
                let count = rng.gen_range(1..=(len - offset).min(8));
                scene.remove_text(offset, count).unwrap();
                written = Some((offset, offset));
            }
            7 if len > 0 => {
                let offset = rng.gen_range(0..len);
                let count = rng.gen_range(0..=(len - offset).min(6));
                let word = WORDS[rng.gen_range(0..WORDS.len())];
                scene.replace_text(offset, count, word).unwrap();
                written = Some((offset, offset + word.chars().count()));
            }
            8 if !scene.index().is_empty() => {
                let i = rng.gen_range(0..scene.index().len());
                let handle = scene.index().handle(i).unwrap();
                scene.erase(handle);
            }
            _ if !scene.index().is_empty() => {
                // Run a random context menu action.
                let i = rng.gen_range(0..scene.index().len());
                let items = &scene.index().get(i).unwrap().menu().items;
                let action = items[rng.gen_range(0..items.len())].action.clone();
                scene.trigger(i, action).unwrap();
            }
            _ => {}
        }
        check(&scene, step, written);
    }
}

#[test]
fn test_random_sequences_keep_invariants() {
    for seed in 0..24 {
        run(seed, 250);
    }
}

#[test]
fn test_crlf_edits_keep_formats() {
    let mut scene = SceneDocument::new("ab\rcd\nef\r\ngh", SceneOptions::default());
    let len = scene.document().len_chars();
    scene.add_insight(Insight::spelling(0, 5, len, "a", Vec::new()).unwrap());
    scene.add_insight(Insight::grammar(3, 8, len, "b", Vec::new()).unwrap());
    scene.add_note(10, 12, "c").unwrap();
    check(&scene, 0, None);

    // Join `\r` and `\n` by deleting what sits between them.
    scene.remove_text(3, 2).unwrap();
    assert_eq!(scene.document().text(), "ab\r\nef\r\ngh");
    check(&scene, 1, None);

    // Split the pair again, then merge a typed `\r` with the following `\n`.
    scene.insert_text(3, "zz").unwrap();
    check(&scene, 2, Some((3, 5)));
    scene.insert_text(9, "\r").unwrap();
    check(&scene, 3, Some((9, 10)));
    scene.remove_text(2, 1).unwrap();
    check(&scene, 4, Some((2, 2)));
}

#[test]
fn test_modify_keeps_order_and_formats() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut doc = Document::new("one two three\nfour five six\nseven eight nine\nten");
    let len = doc.len_chars();
    let mut index = InsightIndex::new(&doc);
    for _ in 0..30 {
        if let Some(insight) = random_insight(&mut rng, len) {
            index.insert(&mut doc, insight);
        }
    }

    for _ in 0..200 {
        let i = rng.gen_range(0..index.len());
        let left = rng.gen_range(0..len - 1);
        let right = rng.gen_range(left + 1..=len);
        let handle = index.handle(i).unwrap();
        let handle = index.modify(&mut doc, handle, |insight| {
            insight.set_range(left, right, len).unwrap();
        });
        assert_eq!(index.resolve(handle).range(), (left, right));

        let ranges: Vec<_> = index.iter().map(Insight::range).collect();
        assert!(ranges.windows(2).all(|w| w[0] <= w[1]));
        for paragraph in 0..doc.paragraph_count() {
            let mut actual = doc.formats(paragraph).to_vec();
            actual.sort_by_key(|s| (s.start, s.len, s.format));
            assert_eq!(actual, expected_formats(&doc, &index, paragraph));
        }
    }
}

#[test]
fn test_erase_then_reinsert_restores_content() {
    let mut doc = Document::new("alpha beta gamma\ndelta epsilon");
    let len = doc.len_chars();
    let mut index = InsightIndex::new(&doc);
    for (l, r) in [(0, 5), (6, 10), (6, 10), (11, 16), (17, 22)] {
        index.insert(&mut doc, Insight::spelling(l, r, len, "x", Vec::new()).unwrap());
    }
    let before: Vec<_> = index.iter().map(Insight::range).collect();
    let formats_before: Vec<_> = (0..2).map(|p| expected_formats(&doc, &index, p)).collect();

    let handle = index.find((11, 16)).unwrap();
    let removed = index.resolve(handle).clone();
    index.erase(&mut doc, handle);
    index.insert(&mut doc, removed);

    let after: Vec<_> = index.iter().map(Insight::range).collect();
    assert_eq!(after, before);
    for (p, expected) in formats_before.iter().enumerate() {
        let mut actual = doc.formats(p).to_vec();
        actual.sort_by_key(|s| (s.start, s.len, s.format));
        assert_eq!(&actual, expected);
    }
}

#[test]
fn test_find_after_insert() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut doc = Document::new(&"word ".repeat(40));
    let len = doc.len_chars();
    let mut index = InsightIndex::new(&doc);
    for _ in 0..100 {
        let Some(insight) = random_insight(&mut rng, len) else {
            continue;
        };
        let range = insight.range();
        index.insert(&mut doc, insight);
        let handle = index.find(range).expect("inserted range is findable");
        assert_eq!(index.resolve(handle).range(), range);
    }
}

#[test]
fn test_out_of_order_invalidation_matches_full_pass() {
    let text = "p0 aaaa\np1 bbbb\np2 cccc\np3 dddd\np4 eeee";
    let mut doc = Document::new(text);
    let len = doc.len_chars();
    let mut index = InsightIndex::new(&doc);
    // One insight spanning paragraphs 1..=3 plus short ones around it.
    index.insert(&mut doc, Insight::note(11, 30, len, "long").unwrap());
    index.insert(&mut doc, Insight::spelling(3, 6, len, "", Vec::new()).unwrap());
    index.insert(&mut doc, Insight::spelling(27, 29, len, "", Vec::new()).unwrap());
    index.insert(&mut doc, Insight::spelling(35, 38, len, "", Vec::new()).unwrap());

    index.invalidate(3);
    index.invalidate(1);
    index.rehighlight(&mut doc);
    let partial: Vec<Vec<FormatSpan>> = (0..5).map(|p| doc.formats(p).to_vec()).collect();

    index.invalidate_all();
    index.rehighlight(&mut doc);
    let full: Vec<Vec<FormatSpan>> = (0..5).map(|p| doc.formats(p).to_vec()).collect();

    assert_eq!(partial, full);
    for paragraph in 0..5 {
        let mut actual = full[paragraph].clone();
        actual.sort_by_key(|s| (s.start, s.len, s.format));
        assert_eq!(actual, expected_formats(&doc, &index, paragraph));
    }
}

//! Tests for chunk boundaries, overlap, and reconstruction.

use docqa_rag::{Chunk, Chunker, FixedSizeChunker, RagError, RecursiveChunker, chunk};
use proptest::prelude::*;

fn texts(chunks: &[Chunk]) -> Vec<&str> {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

/// Concatenate each chunk's span up to the next chunk's start, plus the last chunk whole.
fn reconstruct(text: &str, chunks: &[Chunk]) -> String {
    let mut out = String::new();
    for pair in chunks.windows(2) {
        out.push_str(&text[pair[0].start_offset..pair[1].start_offset]);
    }
    if let Some(last) = chunks.last() {
        out.push_str(&last.text);
    }
    out
}

fn shared_chars(text: &str, left: &Chunk, right: &Chunk) -> usize {
    text[right.start_offset..left.end_offset].chars().count()
}

#[test]
fn cat_dog_bird_yields_three_overlapping_chunks() {
    let text = "The cat sat. The dog ran. The bird flew.";
    let chunks = chunk(text, 20, 5).unwrap();

    assert_eq!(texts(&chunks), vec!["The cat sat. ", "sat. The dog ran. ", "ran. The bird flew."]);
    assert_eq!(chunks.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    for c in &chunks {
        assert!(c.char_len() <= 20);
    }
    for pair in chunks.windows(2) {
        assert!(shared_chars(text, &pair[0], &pair[1]) <= 5);
    }
    assert_eq!(reconstruct(text, &chunks), text);
}

#[test]
fn empty_text_yields_no_chunks() {
    assert!(chunk("", 100, 10).unwrap().is_empty());
    assert!(FixedSizeChunker::new(10, 2).unwrap().chunk("").is_empty());
}

#[test]
fn overlap_at_or_above_size_is_invalid() {
    assert!(matches!(chunk("abc", 10, 10), Err(RagError::InvalidConfiguration(_))));
    assert!(matches!(chunk("abc", 10, 11), Err(RagError::InvalidConfiguration(_))));
    assert!(matches!(chunk("abc", 0, 0), Err(RagError::InvalidConfiguration(_))));
    assert!(matches!(FixedSizeChunker::new(5, 5), Err(RagError::InvalidConfiguration(_))));
}

#[test]
fn text_shorter_than_size_is_one_chunk() {
    let chunks = chunk("Short text.", 100, 10).unwrap();
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "Short text.");
    assert_eq!((chunks[0].start_offset, chunks[0].end_offset), (0, 11));
}

#[test]
fn paragraph_break_is_preferred() {
    let text = "para one.\n\npara two is here.";
    let chunks = chunk(text, 20, 0).unwrap();
    assert_eq!(texts(&chunks), vec!["para one.\n\n", "para two is here."]);
}

#[test]
fn sentence_break_is_preferred_over_words() {
    let text = "One two three. Four five six seven.";
    let chunks = chunk(text, 25, 0).unwrap();
    assert_eq!(texts(&chunks), vec!["One two three. ", "Four five six seven."]);
}

#[test]
fn overlap_starts_at_a_word() {
    let text = "one two three four five six";
    let chunks = chunk(text, 14, 8).unwrap();
    assert_eq!(texts(&chunks), vec!["one two three ", "three four ", "four five six"]);
    assert_eq!(reconstruct(text, &chunks), text);
}

#[test]
fn text_without_separators_is_cut_hard() {
    let chunks = chunk("abcdefghij", 4, 1).unwrap();
    assert_eq!(texts(&chunks), vec!["abcd", "defg", "ghij"]);
}

#[test]
fn offsets_are_byte_offsets_on_char_boundaries() {
    let text = "héllo wörld ünïcode ßtraße";
    let chunks = chunk(text, 8, 2).unwrap();
    for c in &chunks {
        assert_eq!(&text[c.start_offset..c.end_offset], c.text);
        assert!(c.char_len() <= 8);
    }
    assert_eq!(reconstruct(text, &chunks), text);
}

#[test]
fn custom_separators_replace_defaults() {
    let chunker = RecursiveChunker::new(12, 0).unwrap().with_separators(["|"]);
    let chunks = chunker.chunk("aaa|bbb ccc|ddd");
    assert_eq!(texts(&chunks), vec!["aaa|bbb ccc|", "ddd"]);
}

#[test]
fn fixed_size_windows_step_by_size_minus_overlap() {
    let chunks = FixedSizeChunker::new(4, 2).unwrap().chunk("abcdefgh");
    assert_eq!(texts(&chunks), vec!["abcd", "cdef", "efgh"]);
    assert_eq!(chunks[1].start_offset, 2);
}

fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z .!?\n]{0,300}",
        "[a-zé ü.\n]{0,200}",
        proptest::collection::vec("[a-z]{1,12}", 0..40).prop_map(|w| w.join(" ")),
    ]
}

fn arb_size_and_overlap() -> impl Strategy<Value = (usize, usize)> {
    (1usize..60).prop_flat_map(|size| (Just(size), 0..size))
}

/// *For any* text and valid (size, overlap), both chunkers produce ordered
/// chunks within the size bound that reconstruct the text exactly.
mod prop_chunk_invariants {
    use super::*;

    fn check(text: &str, chunks: &[Chunk], size: usize, overlap: usize) -> Result<(), TestCaseError> {
        prop_assert_eq!(chunks.is_empty(), text.is_empty());
        for (i, c) in chunks.iter().enumerate() {
            prop_assert_eq!(c.id, i);
            prop_assert_eq!(&text[c.start_offset..c.end_offset], c.text.as_str());
            prop_assert!(c.char_len() <= size, "chunk {} has {} chars", i, c.char_len());
            prop_assert!(!c.text.is_empty());
        }
        if let (Some(first), Some(last)) = (chunks.first(), chunks.last()) {
            prop_assert_eq!(first.start_offset, 0);
            prop_assert_eq!(last.end_offset, text.len());
        }
        for pair in chunks.windows(2) {
            prop_assert!(pair[1].start_offset > pair[0].start_offset);
            prop_assert!(pair[1].start_offset <= pair[0].end_offset);
            prop_assert!(shared_chars(text, &pair[0], &pair[1]) <= overlap);
        }
        prop_assert_eq!(reconstruct(text, chunks), text);
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn recursive_chunker_invariants(text in arb_text(), (size, overlap) in arb_size_and_overlap()) {
            let chunks = RecursiveChunker::new(size, overlap).unwrap().chunk(&text);
            check(&text, &chunks, size, overlap)?;
        }

        #[test]
        fn fixed_size_chunker_invariants(text in arb_text(), (size, overlap) in arb_size_and_overlap()) {
            let chunks = FixedSizeChunker::new(size, overlap).unwrap().chunk(&text);
            check(&text, &chunks, size, overlap)?;
        }

        #[test]
        fn overlap_not_below_size_always_fails(size in 0usize..50, extra in 0usize..50) {
            prop_assert!(matches!(
                chunk("some text", size, size + extra),
                Err(RagError::InvalidConfiguration(_))
            ));
        }
    }
}

// Splitter behaviour over arbitrary text

use course_kb::chunker::{split_text, TextSplitter};
use course_kb::errors::KbError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALPHABET: &[char] = &['a', 'b', 'c', 'x', 'y', 'z', ' ', ' ', '\n', 'é', '日', '.'];

fn random_text(rng: &mut StdRng, max_len: usize) -> String {
    let len = rng.gen_range(0..max_len);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

/// Byte offset of `piece` inside `text`; pieces are always sub-slices
fn offset_in(text: &str, piece: &str) -> usize {
    piece.as_ptr() as usize - text.as_ptr() as usize
}

/// Stitch pieces back together, dropping the overlapping prefix of each
fn reconstruct(text: &str, pieces: &[&str]) -> String {
    let mut out = String::new();
    let mut covered = 0;
    for piece in pieces {
        let start = offset_in(text, piece);
        let end = start + piece.len();
        if start > covered {
            assert!(
                text[covered..start].trim().is_empty(),
                "non-whitespace gap before {:?}",
                piece
            );
        }
        if end > covered {
            out.push_str(&text[start.max(covered)..end]);
            covered = end;
        }
    }
    assert!(text[covered..].trim().is_empty());
    out
}

fn non_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[test]
fn test_reconstructs_non_whitespace_content() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..300 {
        let text = random_text(&mut rng, 400);
        let chunk_size = rng.gen_range(1..60);
        let overlap = rng.gen_range(0..chunk_size);

        let pieces: Vec<&str> = split_text(&text, chunk_size, overlap).unwrap().collect();
        assert_eq!(
            non_whitespace(&reconstruct(&text, &pieces)),
            non_whitespace(&text),
            "size={} overlap={} text={:?}",
            chunk_size,
            overlap,
            text
        );
    }
}

#[test]
fn test_chunks_respect_size_and_are_trimmed() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let text = random_text(&mut rng, 300);
        let chunk_size = rng.gen_range(1..40);
        let overlap = rng.gen_range(0..chunk_size);

        for piece in split_text(&text, chunk_size, overlap).unwrap() {
            assert!(!piece.is_empty());
            assert_eq!(piece, piece.trim());
            assert!(piece.chars().count() <= chunk_size);
        }
    }
}

#[test]
fn test_terminates_within_length_bound() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..200 {
        let text = random_text(&mut rng, 500);
        let len = text.chars().count();
        let chunk_size = rng.gen_range(1..30);
        let overlap = rng.gen_range(0..chunk_size);

        let count = split_text(&text, chunk_size, overlap).unwrap().count();
        assert!(count <= len, "{} chunks for {} chars", count, len);
    }
}

#[test]
fn test_boundary_free_text_steps_by_size_minus_overlap() {
    let text = "x".repeat(103);
    let (chunk_size, overlap) = (10, 3);
    let count = split_text(&text, chunk_size, overlap).unwrap().count();
    // First window covers 10 chars, every further window adds 7
    let expected = 1 + (103 - 10 + 6) / 7;
    assert_eq!(count, expected);
}

#[test]
fn test_collapsing_windows_still_advance() {
    // Newlines right after the cursor make windows shorter than the overlap
    let text = "a\n\n\n\n\nbbbbbbbbbbbbbbbbbbbbbbbbb\n\n\nc";
    let pieces: Vec<&str> = split_text(text, 10, 9).unwrap().collect();
    assert!(!pieces.is_empty());
    assert!(pieces.len() <= text.chars().count());
    assert_eq!(pieces.first(), Some(&"a"));
    assert!(pieces.last().unwrap().ends_with('c'));
}

#[test]
fn test_abcdefghij_example() {
    let pieces: Vec<&str> = split_text("abcdefghij", 4, 2).unwrap().collect();
    assert_eq!(pieces, vec!["abcd", "cdef", "efgh", "ghij"]);
}

#[test]
fn test_newline_boundary_keeps_lines_together() {
    let splitter = TextSplitter::new(31, 5).unwrap();
    let text = "Course: Data Science\nCohort: 7\nDuration: 6 months\nCost: 1000 USD";
    let pieces: Vec<&str> = splitter.split(text).collect();

    assert_eq!(pieces[0], "Course: Data Science\nCohort: 7");
    assert!(pieces.iter().all(|p| p.chars().count() <= 31));
    assert!(pieces.last().unwrap().ends_with("\nCost: 1000 USD"));
}

#[test]
fn test_invalid_configuration_is_rejected() {
    assert!(matches!(
        split_text("text", 0, 0),
        Err(KbError::InvalidSplitConfig {
            chunk_size: 0,
            overlap: 0
        })
    ));
    assert!(matches!(
        split_text("text", 10, 10),
        Err(KbError::InvalidSplitConfig { .. })
    ));
}

#[test]
fn test_default_splitter_keeps_short_blocks_whole() {
    let splitter = TextSplitter::default();
    assert_eq!(splitter.chunk_size(), 1000);
    assert_eq!(splitter.overlap(), 200);

    let block = "Course: UI/UX Design FAQ\nQ: Is it online?\nA: Yes.";
    assert_eq!(splitter.split(block).collect::<Vec<_>>(), vec![block]);
}

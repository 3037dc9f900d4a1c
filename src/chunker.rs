//! Boundary-aware overlapping text splitter.
//!
//! Splits extracted document text into chunks of at most `chunk_size` bytes,
//! preferring to break on paragraph boundaries, then sentence boundaries,
//! then whitespace, and only hard-cutting as a last resort. Adjacent chunks
//! overlap by `overlap` bytes so a thought severed at a boundary still
//! appears whole in one of its neighbors.

/// Sentence-ending sequences checked in order when no paragraph break fits.
const SENTENCE_BREAKS: [&str; 4] = [". ", ".\n", "? ", "! "];

/// Split `text` into overlapping chunks of at most `chunk_size` bytes.
///
/// Empty (or whitespace-only) input yields no chunks. `overlap` must be
/// smaller than `chunk_size`; the config loader enforces this.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < text.len() {
        let window_end = floor_char_boundary(text, (start + chunk_size).min(text.len()));
        let end = if window_end == text.len() {
            window_end
        } else {
            find_break(text, start, window_end)
        };

        let piece = text[start..end].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= text.len() {
            break;
        }

        // Back up by the overlap for the next window, always making progress.
        let mut next = end.saturating_sub(overlap);
        if next <= start {
            next = end;
        }
        while next < text.len() && !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    chunks
}

/// Pick the best break position in `text[start..limit]`.
///
/// Preference order: paragraph break, sentence break, whitespace, hard cut
/// at `limit`.
fn find_break(text: &str, start: usize, limit: usize) -> usize {
    let window = &text[start..limit];

    if let Some(pos) = window.rfind("\n\n") {
        if pos > 0 {
            return start + pos;
        }
    }

    if let Some(pos) = SENTENCE_BREAKS
        .iter()
        .filter_map(|sep| window.rfind(sep))
        .max()
    {
        if pos > 0 {
            // Keep the sentence terminator with the chunk.
            return start + pos + 1;
        }
    }

    if let Some(pos) = window.rfind(|c: char| c.is_whitespace()) {
        if pos > 0 {
            return start + pos;
        }
    }

    limit
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    if i >= s.len() {
        return s.len();
    }
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(split_text("", 300, 30).is_empty());
        assert!(split_text("   \n \n ", 300, 30).is_empty());
    }

    #[test]
    fn short_text_single_chunk() {
        let chunks = split_text("Per diem covers lodging and meals.", 300, 30);
        assert_eq!(chunks, vec!["Per diem covers lodging and meals."]);
    }

    #[test]
    fn chunks_respect_size_bound() {
        let text = "word ".repeat(500);
        for chunk in split_text(&text, 120, 20) {
            assert!(chunk.len() <= 120, "oversized chunk: {}", chunk.len());
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let para_a = "Alpha sentence one. Alpha sentence two.";
        let para_b = "Bravo sentence one. Bravo sentence two.";
        let text = format!("{}\n\n{}", para_a, para_b);
        // Zero overlap so each chunk is exactly one paragraph.
        let chunks = split_text(&text, 60, 0);
        assert_eq!(chunks, vec![para_a, para_b]);
    }

    #[test]
    fn falls_back_to_sentence_boundaries() {
        let text = "First sentence here. Second sentence here. Third sentence here.";
        let chunks = split_text(text, 45, 5);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.ends_with('.') || text.ends_with(chunk.as_str()));
        }
    }

    #[test]
    fn overlap_repeats_boundary_text() {
        let text = "alpha bravo charlie delta echo foxtrot golf hotel india juliet kilo lima";
        let chunks = split_text(text, 30, 12);
        assert!(chunks.len() > 1);
        // With a 12-byte overlap the tail of one chunk reappears in the next.
        for pair in chunks.windows(2) {
            let tail_word = pair[0].split_whitespace().last().unwrap();
            assert!(
                pair[1].contains(tail_word) || text.len() < 30,
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn hard_cut_on_unbroken_text() {
        let text = "x".repeat(1000);
        let chunks = split_text(&text, 100, 10);
        assert!(chunks.len() >= 10);
        for chunk in &chunks {
            assert!(chunk.len() <= 100);
        }
    }

    #[test]
    fn deterministic() {
        let text = "Lorem ipsum dolor sit amet. ".repeat(40);
        assert_eq!(split_text(&text, 150, 25), split_text(&text, 150, 25));
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        let text = "règlement détaillé ".repeat(50);
        let chunks = split_text(&text, 64, 16);
        assert!(!chunks.is_empty());
    }
}

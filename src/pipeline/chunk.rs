//! Chunking: split content into pieces no larger than the translation
//! service's per-call limit.
//!
//! Two flavours share one contract (ordered, every piece `<= max_size`,
//! concatenation reconstructs the input, no trailing empty piece):
//!
//! * [`split_bytes`] cuts raw bytes at fixed offsets.
//! * [`split_text`] cuts UTF-8 text by byte length but backs off to the
//!   previous character boundary, so every chunk is itself valid UTF-8.
//!   For ASCII the two produce identical sizes.

use crate::error::TranslateError;

/// A contiguous slice of extracted document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    /// 0-based position in the document.
    pub index: usize,
    pub text: &'a str,
}

impl TextChunk<'_> {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Split `content` into consecutive slices of at most `max_size` bytes.
pub fn split_bytes(content: &[u8], max_size: usize) -> Result<Vec<&[u8]>, TranslateError> {
    if max_size == 0 {
        return Err(TranslateError::InvalidConfig(
            "Chunk size must be > 0".into(),
        ));
    }
    Ok(content.chunks(max_size).collect())
}

/// Split `text` into consecutive chunks of at most `max_size` bytes without
/// breaking a UTF-8 code point.
pub fn split_text(text: &str, max_size: usize) -> Result<Vec<TextChunk<'_>>, TranslateError> {
    if max_size == 0 {
        return Err(TranslateError::InvalidConfig(
            "Chunk size must be > 0".into(),
        ));
    }

    let mut chunks = Vec::with_capacity(text.len() / max_size + 1);
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_size).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            let width = text[start..].chars().next().map_or(0, char::len_utf8);
            return Err(TranslateError::InvalidConfig(format!(
                "Chunk size {} cannot hold a {}-byte character at offset {}",
                max_size, width, start
            )));
        }

        chunks.push(TextChunk {
            index: chunks.len(),
            text: &text[start..end],
        });
        start = end;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(chunks: &[&[u8]]) -> Vec<usize> {
        chunks.iter().map(|c| c.len()).collect()
    }

    #[test]
    fn bytes_12000_by_5000() {
        let input = vec![b'x'; 12000];
        let chunks = split_bytes(&input, 5000).unwrap();
        assert_eq!(sizes(&chunks), vec![5000, 5000, 2000]);
    }

    #[test]
    fn bytes_exact_multiple_has_no_trailing_empty_chunk() {
        let input = vec![b'x'; 5000];
        let chunks = split_bytes(&input, 5000).unwrap();
        assert_eq!(sizes(&chunks), vec![5000]);

        let input = vec![b'x'; 10000];
        let chunks = split_bytes(&input, 5000).unwrap();
        assert_eq!(sizes(&chunks), vec![5000, 5000]);
    }

    #[test]
    fn bytes_empty_input_yields_nothing() {
        assert!(split_bytes(&[], 5000).unwrap().is_empty());
    }

    #[test]
    fn bytes_zero_max_is_rejected() {
        assert!(matches!(
            split_bytes(b"abc", 0),
            Err(TranslateError::InvalidConfig(_))
        ));
    }

    #[test]
    fn bytes_concatenation_reconstructs_input() {
        let input: Vec<u8> = (0..=255u8).cycle().take(7919).collect();
        for max in [1, 2, 3, 7, 64, 1000, 7918, 7919, 8000] {
            let chunks = split_bytes(&input, max).unwrap();
            assert!(chunks.iter().all(|c| c.len() <= max && !c.is_empty()));
            assert_eq!(chunks.concat(), input, "max={max}");
        }
    }

    #[test]
    fn text_ascii_matches_byte_split() {
        let input = "a".repeat(12000);
        let chunks = split_text(&input, 5000).unwrap();
        let lens: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
        assert_eq!(lens, vec![5000, 5000, 2000]);
        let idx: Vec<usize> = chunks.iter().map(|c| c.index).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn text_exact_multiple() {
        let input = "b".repeat(5000);
        let chunks = split_text(&input, 5000).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 5000);
    }

    #[test]
    fn text_empty_input() {
        assert!(split_text("", 5000).unwrap().is_empty());
    }

    #[test]
    fn text_never_splits_a_code_point() {
        // "é" is 2 bytes, "€" is 3 bytes, "😀" is 4 bytes.
        let input = "héllo wörld € 😀 ".repeat(300);
        for max in [4, 5, 6, 7, 11, 100, 4999] {
            let chunks = split_text(&input, max).unwrap();
            let mut rebuilt = String::new();
            for c in &chunks {
                assert!(c.len() <= max, "chunk of {} > {}", c.len(), max);
                assert!(!c.is_empty());
                rebuilt.push_str(c.text);
            }
            assert_eq!(rebuilt, input, "max={max}");
        }
    }

    #[test]
    fn text_rejects_size_smaller_than_a_character() {
        let err = split_text("😀", 3).unwrap_err();
        assert!(err.to_string().contains("4-byte"));
    }

    #[test]
    fn text_zero_max_is_rejected() {
        assert!(split_text("abc", 0).is_err());
    }
}

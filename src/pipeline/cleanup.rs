//! Cleanup of LLM translation output.
//!
//! Even when told not to, chat models sometimes wrap their answer in a
//! code fence, answer with CRLF line endings, or leak zero-width characters
//! from the source text. These rules undo that without touching leading or
//! trailing whitespace: a chunk may end mid-sentence, and the whitespace at
//! the seam between chunks belongs to the document.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw model answer.
///
/// Rules (applied in order):
/// 1. Strip an outer code fence wrapping the whole answer
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
pub fn clean_translation(input: &str) -> String {
    let s = strip_outer_fence(input);
    let s = normalise_line_endings(&s);
    remove_invisible_chars(&s)
}

// ── Rule 1: Strip outer fence ────────────────────────────────────────────────

static RE_OUTER_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z0-9_-]*\r?\n(.*?)\r?\n```$").expect("static regex")
});

fn strip_outer_fence(input: &str) -> String {
    match RE_OUTER_FENCE.captures(input.trim()) {
        Some(caps) => caps[1].to_string(),
        None => input.to_string(),
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n")
}

// ── Rule 3: Remove invisible characters ──────────────────────────────────────

const INVISIBLE: [char; 6] = [
    '\u{200B}', // zero-width space
    '\u{200C}', // zero-width non-joiner
    '\u{200D}', // zero-width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // BOM
    '\u{00AD}', // soft hyphen
];

fn remove_invisible_chars(input: &str) -> String {
    input.chars().filter(|c| !INVISIBLE.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fence_with_language() {
        assert_eq!(clean_translation("```text\nHallo Welt\n```"), "Hallo Welt");
        assert_eq!(clean_translation("```\nHallo\nWelt\n```\n"), "Hallo\nWelt");
    }

    #[test]
    fn keeps_inner_fences() {
        let input = "Siehe:\n```\ncode\n```\nEnde";
        assert_eq!(clean_translation(input), input);
    }

    #[test]
    fn preserves_seam_whitespace() {
        assert_eq!(clean_translation("  Anfang des Satzes "), "  Anfang des Satzes ");
        assert_eq!(clean_translation("Zeile\n"), "Zeile\n");
    }

    #[test]
    fn normalises_crlf() {
        assert_eq!(clean_translation("a\r\nb"), "a\nb");
    }

    #[test]
    fn removes_invisible() {
        assert_eq!(clean_translation("Wo\u{200B}rt\u{FEFF}"), "Wort");
    }
}

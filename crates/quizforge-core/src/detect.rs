//! Heuristic multiple-choice format detection.
//!
//! Decides whether extracted text already contains MCQ markup, so the
//! pipeline can parse it instead of asking the generator to write
//! questions. Detection is permissive: a false positive only costs a parse
//! attempt, a false negative costs a generator call.

use std::sync::LazyLock;

use regex::RegexSet;

/// Number of leading characters inspected by [`looks_like_mcq`].
pub const DETECTION_SAMPLE_CHARS: usize = 5_000;

static MCQ_MARKERS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        // Q1 or q 2; a dot between Q and the digit does not count here
        r"(?i)\bQ\s*\d",
        r"(?i)Question\s*\d",
        // A) or b. at the start of a line; PDF page breaks arrive as \x0c
        r"(?im)^\s*[A-D][).]",
        r"(?i)\(A\)",
    ])
    .expect("MCQ marker patterns are valid")
});

/// Returns `true` if the first [`DETECTION_SAMPLE_CHARS`] characters of
/// `text` contain recognizable MCQ markup.
pub fn looks_like_mcq(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    MCQ_MARKERS.is_match(detection_sample(text))
}

/// The prefix of `text` the detector looks at, cut on a char boundary.
pub fn detection_sample(text: &str) -> &str {
    match text.char_indices().nth(DETECTION_SAMPLE_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_not_mcq() {
        assert!(!looks_like_mcq(""));
    }

    #[test]
    fn question_number_markers() {
        assert!(looks_like_mcq("Q1: What is 2+2?"));
        assert!(looks_like_mcq("intro\nq 12 which is it"));
        assert!(looks_like_mcq("Question 3 - pick one"));
        assert!(looks_like_mcq("QUESTION7"));
    }

    #[test]
    fn option_line_markers() {
        assert!(looks_like_mcq("Pick one\nA) yes\nB) no"));
        assert!(looks_like_mcq("  c. maybe"));
        assert!(!looks_like_mcq("E) not an option letter"));
    }

    #[test]
    fn option_after_page_break() {
        assert!(looks_like_mcq("Intro\n\x0cA) option"));
        assert!(looks_like_mcq("Intro\n\x0b\tB. option"));
    }

    #[test]
    fn parenthesized_option() {
        assert!(looks_like_mcq("Choose wisely (A) red (B) blue"));
        assert!(looks_like_mcq("inline (a) lowercase"));
    }

    #[test]
    fn prose_is_not_mcq() {
        let prose = "The mitochondria is the powerhouse of the cell.\n\
                     Cells divide through mitosis and meiosis.";
        assert!(!looks_like_mcq(prose));
    }

    #[test]
    fn marker_inside_sample_is_detected() {
        let mut text = "x".repeat(DETECTION_SAMPLE_CHARS - 3);
        text.push_str("(A)");
        assert!(looks_like_mcq(&text));
    }

    #[test]
    fn marker_past_sample_is_ignored() {
        let mut text = "x".repeat(DETECTION_SAMPLE_CHARS);
        text.push_str("(A) Q1 Question 2");
        assert!(!looks_like_mcq(&text));
    }

    #[test]
    fn sample_respects_char_boundaries() {
        let text = "é".repeat(DETECTION_SAMPLE_CHARS + 10);
        assert_eq!(detection_sample(&text).chars().count(), DETECTION_SAMPLE_CHARS);
    }
}

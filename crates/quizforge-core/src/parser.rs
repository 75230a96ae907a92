//! Deterministic MCQ parser.
//!
//! A forward-scanning finite-state machine over the non-blank, trimmed
//! lines of a document. Each question block looks like:
//!
//! ```text
//! Q1: What is 2+2?
//! A) 3
//! B) 4
//! Answer: B
//! ```
//!
//! The scanner moves through three states per block:
//! [`ScanState::SeekQuestion`] skips lines until one opens a question,
//! [`ScanState::CollectOptions`] consumes option lines, and
//! [`ScanState::SeekAnswer`] looks one line ahead for an answer marker.
//! Parsing is total: unparseable input yields an empty vector.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{DraftQuestion, Question};
use crate::normalize::{normalize, NormalizePolicy};

/// Stop consuming option lines after this many.
pub const MAX_OPTIONS: usize = 6;

/// Blocks with fewer options are dropped.
pub const MIN_OPTIONS: usize = 2;

static QUESTION_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Q\.?\s*\d+[:.)]?|Question\s*\d+[:.)]?)")
        .expect("question prefix pattern is valid")
});

static OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Da-d])\s*[).:-]?\s*(.*)").expect("option pattern is valid")
});

static PAREN_OPTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(\s*([A-Da-d])\s*\)\s*(.*)").expect("paren option pattern is valid")
});

static ANSWER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:Answer|Ans|Key)\s*[:-]").expect("answer marker pattern is valid")
});

static ANSWER_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b([A-D])\b").expect("answer letter pattern is valid"));

/// Scanner state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    SeekQuestion,
    CollectOptions,
    SeekAnswer,
}

/// Parse MCQ-formatted text into normalized questions using the default
/// policy (pad with `"N/A"`, default answer `A`).
pub fn parse(text: &str) -> Vec<Question> {
    parse_with_policy(text, &NormalizePolicy::default())
}

/// Parse MCQ-formatted text into normalized questions.
pub fn parse_with_policy(text: &str, policy: &NormalizePolicy) -> Vec<Question> {
    normalize(parse_questions(text), policy)
}

/// Parse MCQ-formatted text into draft questions.
///
/// Every returned draft has at least [`MIN_OPTIONS`] options; the answer is
/// the uppercase letter from the block's answer line, if it had one.
pub fn parse_questions(text: &str) -> Vec<DraftQuestion> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut scanner = Scanner::new(&lines);
    scanner.run();
    scanner.questions
}

struct Scanner<'a> {
    lines: &'a [&'a str],
    pos: usize,
    current: DraftQuestion,
    questions: Vec<DraftQuestion>,
}

impl<'a> Scanner<'a> {
    fn new(lines: &'a [&'a str]) -> Self {
        Self {
            lines,
            pos: 0,
            current: DraftQuestion::default(),
            questions: Vec::new(),
        }
    }

    fn run(&mut self) {
        let mut state = ScanState::SeekQuestion;
        while let Some(next) = self.step(state) {
            state = next;
        }
    }

    /// Advance one transition. `None` means the input is exhausted.
    fn step(&mut self, state: ScanState) -> Option<ScanState> {
        match state {
            ScanState::SeekQuestion => self.seek_question(),
            ScanState::CollectOptions => Some(self.collect_option()),
            ScanState::SeekAnswer => Some(self.seek_answer()),
        }
    }

    fn seek_question(&mut self) -> Option<ScanState> {
        let line = *self.lines.get(self.pos)?;
        self.pos += 1;

        match question_text(line) {
            Some(text) => {
                self.current = DraftQuestion {
                    text,
                    ..Default::default()
                };
                Some(ScanState::CollectOptions)
            }
            None => Some(ScanState::SeekQuestion),
        }
    }

    fn collect_option(&mut self) -> ScanState {
        if self.current.options.len() >= MAX_OPTIONS {
            return ScanState::SeekAnswer;
        }

        let Some(line) = self.lines.get(self.pos) else {
            return ScanState::SeekAnswer;
        };
        // "Answer: B" would otherwise read as option A with text "nswer: B"
        if answer_line(line).is_some() {
            return ScanState::SeekAnswer;
        }

        match option_text(line) {
            Some(option) => {
                self.current.options.push(option);
                self.pos += 1;
                ScanState::CollectOptions
            }
            None => ScanState::SeekAnswer,
        }
    }

    fn seek_answer(&mut self) -> ScanState {
        if let Some(line) = self.lines.get(self.pos) {
            if let Some(rest) = answer_line(line) {
                self.current.answer = answer_letter(rest);
                self.pos += 1;
            }
        }

        let question = std::mem::take(&mut self.current);
        if question.options.len() >= MIN_OPTIONS {
            self.questions.push(question);
        } else {
            tracing::debug!(
                "dropping question with {} option(s): {}",
                question.options.len(),
                question.text
            );
        }
        ScanState::SeekQuestion
    }
}

/// If `line` opens a question, return its text with any number prefix removed.
fn question_text(line: &str) -> Option<String> {
    if let Some(m) = QUESTION_PREFIX.find(line) {
        return Some(line[m.end()..].trim().to_string());
    }
    if line.ends_with('?') {
        return Some(line.to_string());
    }
    None
}

fn option_text(line: &str) -> Option<String> {
    OPTION_LINE
        .captures(line)
        .or_else(|| PAREN_OPTION_LINE.captures(line))
        .map(|caps| caps.get(2).map_or("", |m| m.as_str()).trim().to_string())
}

/// If `line` is an answer line, return the text after the marker.
fn answer_line(line: &str) -> Option<&str> {
    ANSWER_MARKER.find(line).map(|m| &line[m.end()..])
}

fn answer_letter(rest: &str) -> Option<String> {
    ANSWER_LETTER
        .captures(rest)
        .map(|caps| caps[1].to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AnswerKey;

    #[test]
    fn parses_single_question_with_answer() {
        let questions = parse("Q1: What is 2+2?\nA) 3\nB) 4\nAnswer: B\n");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "What is 2+2?");
        assert_eq!(questions[0].options, vec!["3", "4", "N/A", "N/A"]);
        assert_eq!(questions[0].correct_answer, AnswerKey::B);
    }

    #[test]
    fn drops_block_with_single_option() {
        let text = "Q1: Lonely?\nA) only one\n\nQ2: Pair?\nA) one\nB) two\n";
        let questions = parse(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].text, "Pair?");
    }

    #[test]
    fn defaults_answer_when_missing() {
        let questions = parse("Question 4. Capital of France?\nA. Paris\nB. Rome\nC. Madrid\n");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, AnswerKey::A);
        assert_eq!(questions[0].options, vec!["Paris", "Rome", "Madrid", "N/A"]);
    }

    #[test]
    fn question_mark_line_opens_question() {
        let text = "Some preamble text.\nWhich is a mammal?\n(a) Shark\n(b) Whale\nAns - b\n";
        let drafts = parse_questions(text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].text, "Which is a mammal?");
        assert_eq!(drafts[0].options, vec!["Shark", "Whale"]);
        assert_eq!(drafts[0].answer.as_deref(), Some("B"));
    }

    #[test]
    fn answer_letter_ignores_marker_word() {
        let drafts = parse_questions("Q1 Pick?\nA) x\nB) y\nC) z\nAnswer: C\n");
        assert_eq!(drafts[0].answer.as_deref(), Some("C"));
    }

    #[test]
    fn key_marker_and_lowercase_letter() {
        let drafts = parse_questions("Q.2) Pick?\nA: x\nB: y\nKey: d\n");
        assert_eq!(drafts[0].text, "Pick?");
        assert_eq!(drafts[0].answer.as_deref(), Some("D"));
    }

    #[test]
    fn answer_line_without_letter_is_consumed() {
        let text = "Q1: First?\nA) x\nB) y\nAnswer: unknown\nQ2: Second?\nA) x\nB) y\n";
        let drafts = parse_questions(text);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].answer, None);
    }

    #[test]
    fn stops_collecting_after_six_options() {
        let text = "Q1: Many?\nA) 1\nB) 2\nC) 3\nD) 4\na) 5\nb) 6\nc) 7\nAnswer: A\n";
        let drafts = parse_questions(text);
        assert_eq!(drafts[0].options.len(), MAX_OPTIONS);
        // The seventh option line is not an answer line, so the answer is missed.
        assert_eq!(drafts[0].answer, None);
    }

    #[test]
    fn next_question_line_ends_option_collection() {
        let text = "Q1: First?\nA) a\nB) b\nQ2: Second?\nA) c\nB) d\nAnswer: A\n";
        let drafts = parse_questions(text);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].answer, None);
        assert_eq!(drafts[1].answer.as_deref(), Some("A"));
    }

    #[test]
    fn handles_crlf_and_indentation() {
        let text = "  Q1: Spaced?\r\n    A) one\r\n\r\n    B) two\r\n  Answer - B\r\n";
        let questions = parse(text);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options[..2], ["one", "two"]);
        assert_eq!(questions[0].correct_answer, AnswerKey::B);
    }

    #[test]
    fn empty_and_prose_input_yield_nothing() {
        assert!(parse("").is_empty());
        assert!(parse("Just some prose.\nNothing to see here.").is_empty());
    }

    #[test]
    fn custom_policy_changes_padding() {
        let policy = NormalizePolicy {
            placeholder: "-".into(),
            default_answer: AnswerKey::D,
        };
        let questions = parse_with_policy("Q1: Which?\nA) x\nB) y\n", &policy);
        assert_eq!(questions[0].options, vec!["x", "y", "-", "-"]);
        assert_eq!(questions[0].correct_answer, AnswerKey::D);
    }
}

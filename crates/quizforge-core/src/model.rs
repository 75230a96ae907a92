//! Core data model types for quizforge.
//!
//! These are the fundamental types that the whole pipeline uses to
//! represent documents, questions, quizzes, submissions, and scores.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Number of option slots every normalized question carries.
pub const OPTION_COUNT: usize = 4;

/// Placeholder used to pad questions with fewer than four options.
pub const DEFAULT_PLACEHOLDER: &str = "N/A";

/// One of the four canonical answer letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnswerKey {
    #[default]
    A,
    B,
    C,
    D,
}

impl AnswerKey {
    /// All keys in option order.
    pub const ALL: [AnswerKey; OPTION_COUNT] =
        [AnswerKey::A, AnswerKey::B, AnswerKey::C, AnswerKey::D];

    /// Map a single character (any case) to a key.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(AnswerKey::A),
            'B' => Some(AnswerKey::B),
            'C' => Some(AnswerKey::C),
            'D' => Some(AnswerKey::D),
            _ => None,
        }
    }

    /// Map a zero-based option index to a key.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Zero-based option index of this key.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AnswerKey::A => "A",
            AnswerKey::B => "B",
            AnswerKey::C => "C",
            AnswerKey::D => "D",
        }
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                AnswerKey::from_char(c).ok_or_else(|| format!("unknown answer key: {trimmed}"))
            }
            _ => Err(format!("unknown answer key: {trimmed}")),
        }
    }
}

/// Declared or inferred kind of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Pdf,
    PlainText,
    Unknown,
}

impl MediaKind {
    /// Infer the kind from the leading bytes, falling back to a file name.
    pub fn infer(bytes: &[u8], file_name: Option<&str>) -> Self {
        if bytes.starts_with(b"%PDF-") {
            return MediaKind::Pdf;
        }
        let ext = file_name
            .and_then(|n| n.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => MediaKind::Pdf,
            Some("txt" | "md" | "text" | "csv") => MediaKind::PlainText,
            _ => MediaKind::Unknown,
        }
    }
}

/// Raw uploaded bytes. Lives only for the duration of one pipeline call.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
    /// Original file name, used as the default quiz title.
    pub file_name: Option<String>,
}

impl Document {
    pub fn new(bytes: Vec<u8>, file_name: Option<String>) -> Self {
        let kind = MediaKind::infer(&bytes, file_name.as_deref());
        Self {
            bytes,
            kind,
            file_name,
        }
    }

    /// Read a file into a document named after its file name.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(Self::new(bytes, file_name))
    }

    /// Build a plain-text document (useful for testing).
    pub fn from_text(text: &str) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
            kind: MediaKind::PlainText,
            file_name: None,
        }
    }
}

/// A question as produced by either parsing path, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftQuestion {
    pub text: String,
    pub options: Vec<String>,
    /// Raw answer value, if the source carried one.
    pub answer: Option<String>,
}

/// A normalized multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// The question prompt.
    #[serde(rename = "question")]
    pub text: String,
    /// Exactly four options after normalization.
    pub options: Vec<String>,
    /// The correct option letter.
    #[serde(rename = "correctAnswer")]
    pub correct_answer: AnswerKey,
}

/// A titled, ordered sequence of questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Which path produced a quiz's questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionSource {
    /// Parsed deterministically from MCQ-formatted text.
    Parsed,
    /// Produced by the generative text service.
    Generated,
}

impl fmt::Display for QuestionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionSource::Parsed => write!(f, "parsed"),
            QuestionSource::Generated => write!(f, "generated"),
        }
    }
}

/// Opaque identifier assigned by a quiz store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizId(pub String);

impl QuizId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QuizId {
    fn from(s: &str) -> Self {
        QuizId(s.to_string())
    }
}

/// A quiz as persisted by a store, with store-assigned identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredQuiz {
    pub id: QuizId,
    pub created_at: DateTime<Utc>,
    pub source: QuestionSource,
    pub quiz: Quiz,
}

/// A learner's answers, indexed parallel to the quiz's questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub answers: Vec<Option<String>>,
}

impl Submission {
    pub fn new(answers: Vec<Option<String>>) -> Self {
        Self { answers }
    }

    /// Parse a comma-separated answer list; empty slots are absent answers.
    pub fn from_csv(s: &str) -> Self {
        let answers = s
            .split(',')
            .map(|a| {
                let a = a.trim();
                (!a.is_empty()).then(|| a.to_string())
            })
            .collect();
        Self { answers }
    }
}

/// The outcome of scoring a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: u32,
    pub total: u32,
}

impl ScoreResult {
    /// Score as a fraction of total in `[0.0, 1.0]`; zero for empty quizzes.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.score as f64 / self.total as f64
        }
    }
}

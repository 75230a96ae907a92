//! Schema normalization.
//!
//! Whatever path produced a question, the stored form always has exactly
//! [`OPTION_COUNT`] options and one answer letter A–D. Normalization is
//! idempotent.

use serde::{Deserialize, Serialize};

use crate::model::{AnswerKey, DraftQuestion, Question, DEFAULT_PLACEHOLDER, OPTION_COUNT};

/// How missing options and answers are filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizePolicy {
    /// Text used for padded option slots.
    pub placeholder: String,
    /// Answer assigned when the source has none, or one that is not A–D.
    ///
    /// Defaults to `A`. This can mark a wrong option as correct; it is
    /// configurable rather than removed.
    pub default_answer: AnswerKey,
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            default_answer: AnswerKey::A,
        }
    }
}

/// Normalize draft questions into the stored schema.
pub fn normalize(drafts: Vec<DraftQuestion>, policy: &NormalizePolicy) -> Vec<Question> {
    drafts
        .into_iter()
        .map(|d| normalize_question(d, policy))
        .collect()
}

/// Re-normalize already-built questions. A no-op for normalized input.
pub fn normalize_questions(questions: Vec<Question>, policy: &NormalizePolicy) -> Vec<Question> {
    questions
        .into_iter()
        .map(|q| Question {
            text: q.text.trim().to_string(),
            options: fit_options(q.options, policy),
            correct_answer: q.correct_answer,
        })
        .collect()
}

/// Normalize a single draft question.
pub fn normalize_question(draft: DraftQuestion, policy: &NormalizePolicy) -> Question {
    let correct_answer = draft
        .answer
        .as_deref()
        .and_then(resolve_answer)
        .unwrap_or(policy.default_answer);

    Question {
        text: draft.text.trim().to_string(),
        options: fit_options(draft.options, policy),
        correct_answer,
    }
}

/// Interpret a raw answer value as a letter.
///
/// Accepts a lone letter (`"b"`), or a letter followed by a delimiter
/// (`"C)"`, `"d. Paris"`). Anything else is unresolved.
pub fn resolve_answer(raw: &str) -> Option<AnswerKey> {
    let mut chars = raw.trim().chars();
    let key = AnswerKey::from_char(chars.next()?)?;
    match chars.next() {
        None => Some(key),
        Some(c) if !c.is_alphanumeric() => Some(key),
        Some(_) => None,
    }
}

fn fit_options(options: Vec<String>, policy: &NormalizePolicy) -> Vec<String> {
    let mut options: Vec<String> = options
        .into_iter()
        .take(OPTION_COUNT)
        .map(|o| o.trim().to_string())
        .collect();
    while options.len() < OPTION_COUNT {
        options.push(policy.placeholder.clone());
    }
    options
}

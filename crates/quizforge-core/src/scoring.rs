//! Submission scoring.

use crate::model::{Quiz, ScoreResult, Submission};

/// Score a submission against a quiz's answer keys.
///
/// Answers are compared trimmed and case-insensitively. A missing or blank
/// answer never matches. `total` is always the number of questions.
pub fn score(quiz: &Quiz, submission: &Submission) -> ScoreResult {
    let score = quiz
        .questions
        .iter()
        .enumerate()
        .filter(|(i, question)| {
            let answer = submission
                .answers
                .get(*i)
                .and_then(|a| a.as_deref())
                .unwrap_or("")
                .trim();
            !answer.is_empty() && answer.eq_ignore_ascii_case(question.correct_answer.as_str())
        })
        .count() as u32;

    ScoreResult {
        score,
        total: quiz.questions.len() as u32,
    }
}

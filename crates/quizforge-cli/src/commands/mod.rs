//! Subcommand implementations.

pub mod init;
pub mod inspect;
pub mod list;
pub mod list_models;
pub mod score;
pub mod show;
pub mod upload;

use comfy_table::{Cell, Table};

use quizforge_core::model::Question;
use quizforge_core::store::JsonDirStore;
use quizforge_providers::QuizforgeConfig;

pub(crate) fn open_store(config: &QuizforgeConfig) -> JsonDirStore {
    JsonDirStore::new(config.store_dir.clone())
}

/// Shorten `s` to at most `max` chars for table cells.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

/// Render questions as a table, one row per question.
pub(crate) fn question_table(questions: &[Question]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Question", "A", "B", "C", "D", "Answer"]);

    for (i, question) in questions.iter().enumerate() {
        let mut row = vec![
            Cell::new(i + 1),
            Cell::new(truncate(&question.text, 60)),
        ];
        row.extend(
            question
                .options
                .iter()
                .map(|option| Cell::new(truncate(option, 24))),
        );
        row.push(Cell::new(question.correct_answer));
        table.add_row(row);
    }

    table
}

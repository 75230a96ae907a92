//! The `quizforge list` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizforge_core::traits::QuizStore;
use quizforge_providers::load_config_from;

use super::{open_store, truncate};

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = open_store(&config);
    let records = store.list().await?;

    if records.is_empty() {
        println!(
            "No quizzes stored in {}. Run `quizforge upload <file>` to create one.",
            store.dir().display()
        );
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Id", "Title", "Questions", "Source", "Created"]);
    for record in &records {
        table.add_row(vec![
            Cell::new(&record.id),
            Cell::new(truncate(&record.quiz.title, 40)),
            Cell::new(record.quiz.questions.len()),
            Cell::new(record.source),
            Cell::new(record.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }

    println!("{table}");
    println!("{} quiz(zes)", records.len());
    Ok(())
}

//! The `quizforge show` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::error::QuizError;
use quizforge_core::model::QuizId;
use quizforge_core::traits::QuizStore;
use quizforge_providers::load_config_from;

use super::{open_store, question_table};

pub async fn execute(id: String, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = open_store(&config);

    let id = QuizId(id);
    let stored = store
        .load(&id)
        .await?
        .ok_or_else(|| QuizError::NotFound(id.to_string()))?;

    println!("Quiz: {}", stored.quiz.title);
    println!("Id: {}", stored.id);
    println!("Source: {}", stored.source);
    println!("Created: {}", stored.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Questions: {}", stored.quiz.questions.len());

    if !stored.quiz.questions.is_empty() {
        println!("\n{}", question_table(&stored.quiz.questions));
    }

    Ok(())
}

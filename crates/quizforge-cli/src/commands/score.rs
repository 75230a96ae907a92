//! The `quizforge score` command.

use std::path::PathBuf;

use anyhow::Result;

use quizforge_core::model::{QuizId, Submission};
use quizforge_core::notify::LogNotifier;
use quizforge_core::pipeline::submit;
use quizforge_providers::load_config_from;

use super::open_store;

pub async fn execute(
    id: String,
    answers: String,
    email: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = open_store(&config);

    let submission = Submission::from_csv(&answers);
    let result = submit(
        &store,
        &LogNotifier,
        &QuizId(id),
        &submission,
        email.as_deref(),
    )
    .await?;

    println!(
        "Score: {}/{} ({:.1}%)",
        result.score,
        result.total,
        result.percentage() * 100.0
    );
    Ok(())
}

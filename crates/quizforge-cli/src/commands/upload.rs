//! The `quizforge upload` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use quizforge_core::error::QuizError;
use quizforge_core::model::{Document, StoredQuiz};
use quizforge_core::pipeline::{ProgressReporter, QuizPipeline, Upload};
use quizforge_core::traits::TextGenerator;
use quizforge_providers::{create_default_provider, load_config_from};

use super::open_store;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_upload_start(&self, name: &str) {
        eprintln!("  Processing: {name}");
    }

    fn on_upload_complete(&self, name: &str, stored: &StoredQuiz) {
        println!(
            "Stored {}: '{}' from {name} ({} questions, {})",
            stored.id,
            stored.quiz.title,
            stored.quiz.questions.len(),
            stored.source,
        );
    }

    fn on_upload_error(&self, name: &str, error: &QuizError) {
        let mut message = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            message.push_str(&format!(": {cause}"));
            source = cause.source();
        }
        eprintln!("  ERROR: {name}: {message}");
    }

    fn on_batch_complete(&self, total: usize, stored: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {stored}/{total} stored, {failed} failed ({:.1}s)",
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    files: Vec<PathBuf>,
    title: Option<String>,
    parallelism: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    if let Some(p) = parallelism {
        anyhow::ensure!(p >= 1, "parallelism must be at least 1");
    }
    anyhow::ensure!(
        title.is_none() || files.len() == 1,
        "--title can only be used with a single file"
    );

    let config = load_config_from(config_path.as_deref())?;
    let mut pipeline_config = config.pipeline_config()?;
    if let Some(p) = parallelism {
        pipeline_config.parallelism = p;
    }

    let uploads = files
        .iter()
        .map(|path| {
            Ok(Upload {
                document: Document::from_path(path)?,
                title: title.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let generator: Arc<dyn TextGenerator> = Arc::from(create_default_provider(&config)?);
    let pipeline = QuizPipeline::new(generator, pipeline_config);
    let store = open_store(&config);

    eprintln!(
        "quizforge v{}: processing {} document(s) into {}",
        env!("CARGO_PKG_VERSION"),
        uploads.len(),
        store.dir().display()
    );

    let results = pipeline
        .upload_batch(&store, uploads, &ConsoleReporter)
        .await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    anyhow::ensure!(
        failed == 0,
        "{failed} of {} upload(s) failed",
        results.len()
    );

    Ok(())
}

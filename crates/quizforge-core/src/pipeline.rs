//! Document-to-quiz pipeline orchestrator.
//!
//! Runs extraction, detection, one of two question strategies, and
//! normalization for each upload. Collaborators (generator, store,
//! notifier) are injected; the pipeline owns no global state, so
//! independent uploads can run concurrently.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use crate::detect::looks_like_mcq;
use crate::error::QuizError;
use crate::extract::extract_text;
use crate::generate::{generate_questions, GenerationConfig};
use crate::model::{
    Document, DraftQuestion, QuestionSource, Quiz, QuizId, ScoreResult, StoredQuiz, Submission,
};
use crate::normalize::{normalize, NormalizePolicy};
use crate::parser::parse_questions;
use crate::scoring;
use crate::traits::{Notifier, QuizStore, ScoreNotice, TextGenerator};

/// Title used when an upload has neither a declared title nor a file name.
pub const UNTITLED: &str = "Untitled quiz";

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub generation: GenerationConfig,
    pub policy: NormalizePolicy,
    /// Maximum concurrent uploads in a batch.
    pub parallelism: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            policy: NormalizePolicy::default(),
            parallelism: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Question strategies
// ---------------------------------------------------------------------------

/// Produces draft questions from extracted text.
#[async_trait]
pub trait QuestionStrategy: Send + Sync {
    fn source(&self) -> QuestionSource;

    async fn produce(&self, text: &str) -> Vec<DraftQuestion>;
}

/// Deterministic parsing of MCQ-formatted text.
pub struct ParsedStrategy;

#[async_trait]
impl QuestionStrategy for ParsedStrategy {
    fn source(&self) -> QuestionSource {
        QuestionSource::Parsed
    }

    async fn produce(&self, text: &str) -> Vec<DraftQuestion> {
        parse_questions(text)
    }
}

/// Generation through the external text service.
pub struct GeneratedStrategy {
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl GeneratedStrategy {
    pub fn new(generator: Arc<dyn TextGenerator>, config: GenerationConfig) -> Self {
        Self { generator, config }
    }
}

#[async_trait]
impl QuestionStrategy for GeneratedStrategy {
    fn source(&self) -> QuestionSource {
        QuestionSource::Generated
    }

    async fn produce(&self, text: &str) -> Vec<DraftQuestion> {
        generate_questions(self.generator.as_ref(), text, &self.config).await
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A quiz built from one document, not yet persisted.
#[derive(Debug, Clone)]
pub struct QuizDraft {
    pub quiz: Quiz,
    pub source: QuestionSource,
    /// Whether the detector saw MCQ markup.
    pub detected_mcq: bool,
}

/// One document in a batch upload.
#[derive(Debug, Clone)]
pub struct Upload {
    pub document: Document,
    pub title: Option<String>,
}

/// Progress reporting for batch uploads.
pub trait ProgressReporter: Send + Sync {
    fn on_upload_start(&self, name: &str);
    fn on_upload_complete(&self, name: &str, stored: &StoredQuiz);
    fn on_upload_error(&self, name: &str, error: &QuizError);
    fn on_batch_complete(&self, total: usize, stored: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_upload_start(&self, _: &str) {}
    fn on_upload_complete(&self, _: &str, _: &StoredQuiz) {}
    fn on_upload_error(&self, _: &str, _: &QuizError) {}
    fn on_batch_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The document-to-quiz pipeline.
pub struct QuizPipeline {
    parsed: ParsedStrategy,
    generated: GeneratedStrategy,
    config: PipelineConfig,
}

impl QuizPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>, config: PipelineConfig) -> Self {
        Self {
            parsed: ParsedStrategy,
            generated: GeneratedStrategy::new(generator, config.generation.clone()),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build a quiz from a document. Never fails; a document nothing can be
    /// made of yields a quiz with zero questions.
    pub async fn build_quiz(&self, document: &Document, title: Option<&str>) -> QuizDraft {
        let text = extract_off_runtime(document).await;
        let title = resolve_title(title, document.file_name.as_deref());
        tracing::debug!("extracted {} chars for '{title}'", text.len());

        let (draft, source, detected_mcq) = self.questions_from_text(&text).await;
        let questions = normalize(draft, &self.config.policy);
        tracing::info!(
            "built '{title}': {} question(s), source {source}",
            questions.len()
        );

        QuizDraft {
            quiz: Quiz { title, questions },
            source,
            detected_mcq,
        }
    }

    /// Select a strategy for `text` and run it.
    ///
    /// Text without MCQ markup goes straight to the generator and is never
    /// parsed. Text with markup is parsed; if parsing finds nothing, the
    /// generator is used as a fallback.
    async fn questions_from_text(&self, text: &str) -> (Vec<DraftQuestion>, QuestionSource, bool) {
        let detected = looks_like_mcq(text);

        if detected {
            let drafts = self.parsed.produce(text).await;
            if !drafts.is_empty() {
                return (drafts, self.parsed.source(), true);
            }
            tracing::info!("MCQ markup detected but no questions parsed, generating instead");
        } else {
            tracing::info!("no MCQ markup detected, generating questions");
        }

        let drafts = self.generated.produce(text).await;
        (drafts, self.generated.source(), detected)
    }

    /// Build a quiz and persist it.
    pub async fn upload(
        &self,
        store: &dyn QuizStore,
        document: &Document,
        title: Option<&str>,
    ) -> Result<StoredQuiz, QuizError> {
        let draft = self.build_quiz(document, title).await;
        store
            .save(&draft.quiz, draft.source)
            .await
            .map_err(QuizError::UploadFailed)
    }

    /// Upload several documents concurrently. Results are in input order.
    pub async fn upload_batch(
        &self,
        store: &dyn QuizStore,
        uploads: Vec<Upload>,
        progress: &dyn ProgressReporter,
    ) -> Vec<Result<StoredQuiz, QuizError>> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let total = uploads.len();

        let mut futures = FuturesUnordered::new();
        for (index, upload) in uploads.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            futures.push(async move {
                let name = upload_name(&upload);
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let err = QuizError::UploadFailed(anyhow::anyhow!("semaphore closed"));
                        return (index, name, Err(err));
                    }
                };
                progress.on_upload_start(&name);
                let result = self
                    .upload(store, &upload.document, upload.title.as_deref())
                    .await;
                (index, name, result)
            });
        }

        let mut results: Vec<Option<Result<StoredQuiz, QuizError>>> =
            (0..total).map(|_| None).collect();
        let mut stored = 0usize;
        let mut failed = 0usize;

        while let Some((index, name, result)) = futures.next().await {
            match &result {
                Ok(record) => {
                    progress.on_upload_complete(&name, record);
                    stored += 1;
                }
                Err(e) => {
                    tracing::error!("upload failed for {name}: {e:#}");
                    progress.on_upload_error(&name, e);
                    failed += 1;
                }
            }
            results[index] = Some(result);
        }

        progress.on_batch_complete(total, stored, failed, start.elapsed());

        results.into_iter().flatten().collect()
    }
}

/// Resolve a stored quiz, score a submission, and notify the learner.
///
/// Notification failures are logged and do not affect the result.
pub async fn submit(
    store: &dyn QuizStore,
    notifier: &dyn Notifier,
    id: &QuizId,
    submission: &Submission,
    recipient: Option<&str>,
) -> Result<ScoreResult, QuizError> {
    let stored = store
        .load(id)
        .await
        .map_err(QuizError::Store)?
        .ok_or_else(|| QuizError::NotFound(id.to_string()))?;

    let result = scoring::score(&stored.quiz, submission);

    if let Some(recipient) = recipient {
        let notice = ScoreNotice {
            recipient: recipient.to_string(),
            quiz_title: stored.quiz.title.clone(),
            result,
        };
        if let Err(e) = notifier.notify(&notice).await {
            tracing::error!("failed to notify {recipient}: {e:#}");
        }
    }

    Ok(result)
}

fn resolve_title(declared: Option<&str>, file_name: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or(file_name)
        .unwrap_or(UNTITLED)
        .to_string()
}

fn upload_name(upload: &Upload) -> String {
    resolve_title(upload.title.as_deref(), upload.document.file_name.as_deref())
}

/// PDF decoding is CPU-bound; keep it off the async workers.
async fn extract_off_runtime(document: &Document) -> String {
    let document = document.clone();
    match tokio::task::spawn_blocking(move || extract_text(&document)).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("text extraction task failed: {e}");
            String::new()
        }
    }
}

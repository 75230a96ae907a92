//! Core trait definitions for the pipeline's external collaborators.
//!
//! The generative text service is implemented by `quizforge-providers`;
//! stores and notifiers live in this crate. All of them are injected into
//! [`crate::pipeline::QuizPipeline`] by the process bootstrap.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::model::{QuestionSource, Quiz, QuizId, ScoreResult, StoredQuiz};

// ---------------------------------------------------------------------------
// Generative text service
// ---------------------------------------------------------------------------

/// Trait for generative text backends.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable provider name (e.g. "openai").
    fn name(&self) -> &str;

    /// Complete a prompt. The response text is free-form and untrusted.
    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse>;

    /// List available models for this provider.
    fn available_models(&self) -> Vec<ModelInfo>;
}

/// Request to complete a prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "gpt-4o-mini").
    pub model: String,
    /// The full prompt.
    pub prompt: String,
    /// Optional system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Response from a generative text service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The raw response content.
    pub content: String,
    /// Model that actually generated the response.
    pub model: String,
    /// Token usage.
    pub token_usage: TokenUsage,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

/// Token accounting reported by the service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Information about an available model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub id: String,
    /// Human-readable model name.
    pub name: String,
    /// Provider name.
    pub provider: String,
    /// Maximum context window size in tokens.
    pub max_context: u32,
}

// ---------------------------------------------------------------------------
// Quiz storage
// ---------------------------------------------------------------------------

/// Persistent storage for normalized quizzes.
///
/// Stores assign identity. Title and questions must round-trip unchanged.
#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Persist a quiz and return the stored record.
    async fn save(&self, quiz: &Quiz, source: QuestionSource) -> anyhow::Result<StoredQuiz>;

    /// Resolve an id back to a quiz. `Ok(None)` if there is no such quiz.
    async fn load(&self, id: &QuizId) -> anyhow::Result<Option<StoredQuiz>>;

    /// All stored quizzes, oldest first.
    async fn list(&self) -> anyhow::Result<Vec<StoredQuiz>>;

    /// Remove a quiz. Returns `false` if it did not exist.
    async fn delete(&self, id: &QuizId) -> anyhow::Result<bool>;
}

// ---------------------------------------------------------------------------
// Result notification
// ---------------------------------------------------------------------------

/// A score to deliver to a learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreNotice {
    pub recipient: String,
    pub quiz_title: String,
    pub result: ScoreResult,
}

impl ScoreNotice {
    pub fn subject(&self) -> String {
        format!("Your Quiz Score - {}", self.quiz_title)
    }

    pub fn body(&self) -> String {
        format!("Your score: {}/{}", self.result.score, self.result.total)
    }
}

/// Delivers score notices. Delivery failures never affect scoring.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &ScoreNotice) -> anyhow::Result<()>;
}

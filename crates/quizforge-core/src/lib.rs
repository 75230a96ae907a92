//! quizforge-core: Document-to-quiz pipeline and scoring.
//!
//! This crate defines the quiz data model, the extraction → detection →
//! parse-or-generate → normalization pipeline, submission scoring, and the
//! traits for the external collaborators the pipeline talks to.

pub mod detect;
pub mod error;
pub mod extract;
pub mod generate;
pub mod model;
pub mod normalize;
pub mod notify;
pub mod parser;
pub mod pipeline;
pub mod scoring;
pub mod store;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{ProviderError, QuizError};
pub use model::{AnswerKey, Document, Question, Quiz, QuizId, ScoreResult, Submission};
pub use pipeline::{PipelineConfig, QuizPipeline};

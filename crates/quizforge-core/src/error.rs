//! Error types.
//!
//! `ProviderError` represents failures when talking to a generative text
//! service. It lives in `quizforge-core` so the pipeline can downcast and
//! classify errors for retry decisions without string matching.
//!
//! `QuizError` covers the collaborator failures the pipeline surfaces to its
//! caller. Malformed input never produces an error; see the pipeline docs.

use thiserror::Error;

/// Errors that can occur when interacting with a generative text service.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Authentication failed (invalid API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested model was not found.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),
}

impl ProviderError {
    /// Returns `true` if this error is permanent and should not be retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ProviderError::AuthenticationFailed(_) | ProviderError::ModelNotFound(_)
        )
    }

    /// Returns the retry-after delay in milliseconds, if applicable.
    pub fn retry_after_ms(&self) -> Option<u64> {
        match self {
            ProviderError::RateLimited { retry_after_ms } => Some(*retry_after_ms),
            _ => None,
        }
    }
}

/// Errors surfaced by the upload and submit flows.
#[derive(Debug, Error)]
pub enum QuizError {
    /// Persisting a freshly built quiz failed. The cause is not inspected.
    #[error("upload failed")]
    UploadFailed(#[source] anyhow::Error),

    /// No quiz exists under the given id.
    #[error("quiz not found: {0}")]
    NotFound(String),

    /// The store failed while resolving or listing quizzes.
    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permanent_errors() {
        assert!(ProviderError::AuthenticationFailed("bad key".into()).is_permanent());
        assert!(ProviderError::ModelNotFound("gpt-0".into()).is_permanent());
        assert!(!ProviderError::Timeout(30).is_permanent());
        assert!(!ProviderError::RateLimited { retry_after_ms: 10 }.is_permanent());
    }

    #[test]
    fn retry_after_only_for_rate_limits() {
        assert_eq!(
            ProviderError::RateLimited {
                retry_after_ms: 2500
            }
            .retry_after_ms(),
            Some(2500)
        );
        assert_eq!(ProviderError::NetworkError("reset".into()).retry_after_ms(), None);
    }

    #[test]
    fn upload_failed_hides_cause_in_message() {
        let err = QuizError::UploadFailed(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "upload failed");
        assert!(std::error::Error::source(&err).is_some());
    }
}

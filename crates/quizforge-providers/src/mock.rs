//! Mock provider for offline runs and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use quizforge_core::traits::{
    GenerateRequest, GenerateResponse, ModelInfo, TextGenerator, TokenUsage,
};

/// Canned answer used when nothing else is configured.
const DEFAULT_RESPONSE: &str = r#"[{"question":"Placeholder question?","options":["Yes","No"],"correct":"A"}]"#;

/// A generator that answers from a fixed table instead of calling a service.
///
/// Responses are picked by prompt substring, so a test can key them on a
/// phrase from the document text embedded in the prompt.
pub struct MockProvider {
    /// Map of prompt substring → response body.
    responses: HashMap<String, String>,
    /// Default response if no prompt matches.
    default_response: String,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl MockProvider {
    /// Create a new mock provider with the given prompt→response mappings.
    pub fn new(responses: HashMap<String, String>) -> Self {
        Self {
            responses,
            default_response: DEFAULT_RESPONSE.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock that always returns the same response.
    pub fn with_fixed_response(response: &str) -> Self {
        Self {
            responses: HashMap::new(),
            default_response: response.to_string(),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl TextGenerator for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        let content = self
            .responses
            .iter()
            .find(|(key, _)| request.prompt.contains(key.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_response.clone());

        // Rough estimate
        let prompt_tokens = (request.prompt.len() / 4) as u32;
        let completion_tokens = (content.len() / 4) as u32;

        Ok(GenerateResponse {
            content,
            model: request.model.clone(),
            token_usage: TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            latency_ms: 1,
        })
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![ModelInfo {
            id: "mock-model".into(),
            name: "Mock Model".into(),
            provider: "mock".into(),
            max_context: 100_000,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quizforge_core::generate::{generate_questions, GenerationConfig};

    fn request(prompt: &str) -> GenerateRequest {
        GenerateRequest {
            model: "mock".into(),
            prompt: prompt.into(),
            system_prompt: None,
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_response() {
        let provider = MockProvider::with_fixed_response("[]");
        let response = provider.generate(&request("anything")).await.unwrap();
        assert_eq!(response.content, "[]");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.last_request().unwrap().prompt, "anything");
    }

    #[tokio::test]
    async fn prompt_matching() {
        let mut responses = HashMap::new();
        responses.insert(
            "photosynthesis".to_string(),
            r#"[{"question":"What do plants absorb?","options":["CO2","N2"],"correct":"A"}]"#
                .to_string(),
        );
        responses.insert(
            "volcano".to_string(),
            r#"[{"q":"What erupts?","opts":["Lava","Ice"],"correct_option":0}]"#.to_string(),
        );

        let provider = MockProvider::new(responses);

        let resp = provider
            .generate(&request("Notes about photosynthesis"))
            .await
            .unwrap();
        assert!(resp.content.contains("plants"));

        let resp = provider
            .generate(&request("A volcano essay"))
            .await
            .unwrap();
        assert!(resp.content.contains("Lava"));

        let resp = provider.generate(&request("unrelated")).await.unwrap();
        assert_eq!(resp.content, DEFAULT_RESPONSE);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn drives_question_generation() {
        let provider = MockProvider::with_fixed_response(
            "Sure! [{\"question\":\"Capital of France?\",\"options\":[\"Paris\",\"Rome\",\"Oslo\"],\"correctAnswer\":\"A\"}] Enjoy.",
        );
        let drafts = generate_questions(
            &provider,
            "France is a country in Europe.",
            &GenerationConfig::default(),
        )
        .await;
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].text, "Capital of France?");
        assert_eq!(drafts[0].options.len(), 3);
        assert!(provider
            .last_request()
            .unwrap()
            .prompt
            .contains("France is a country"));
    }
}

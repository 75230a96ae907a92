//! Question generation through an external generative text service.
//!
//! Used when the detector finds no MCQ markup. The service is asked for a
//! strict JSON array, but its output is treated as untrusted: the array is
//! located inside whatever text comes back, parsed as an untyped
//! [`serde_json::Value`], and each record is validated field by field.
//! Every failure mode ends in an empty result, never an error.

use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::ProviderError;
use crate::model::{AnswerKey, DraftQuestion};
use crate::traits::{GenerateRequest, GenerateResponse, TextGenerator};

pub const DEFAULT_QUESTION_COUNT: u32 = 10;
pub const DEFAULT_MAX_TOKENS: u32 = 1200;
pub const DEFAULT_TEMPERATURE: f64 = 0.1;

/// Upper bound on any single wait between attempts, including a server's
/// `Retry-After`.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

const TEXT_KEYS: &[&str] = &["question", "q"];
const OPTION_KEYS: &[&str] = &["options", "opts"];
const ANSWER_KEYS: &[&str] = &["correct", "correct_option", "correctAnswer"];

/// Settings for one generation call.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// Model identifier passed to the service.
    pub model: String,
    /// Number of questions to ask for.
    pub question_count: u32,
    /// Output budget.
    pub max_tokens: u32,
    pub temperature: f64,
    /// Upper bound on a single service call.
    pub timeout: Duration,
    /// Retries on transient service errors.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each attempt.
    pub retry_delay: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            question_count: DEFAULT_QUESTION_COUNT,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(60),
            max_retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Build the instruction sent to the service, with `text` embedded verbatim.
pub fn build_prompt(text: &str, count: u32) -> String {
    format!(
        "You are an AI quiz generator. From the text below, create exactly {count} \
         multiple-choice questions with 4 options (A,B,C,D). Mark the correct option. \
         Return a valid JSON array of objects: \
         {{ \"question\": \"...\", \"options\": [\"...\",\"...\",\"...\",\"...\"], \"correct\": \"A\" }} \
         Only return JSON.\n\nText:\n\"\"\"{text}\n\"\"\""
    )
}

/// Ask the service for questions about `text`.
///
/// Service errors, timeouts, and malformed output all yield an empty vector.
pub async fn generate_questions(
    generator: &dyn TextGenerator,
    text: &str,
    config: &GenerationConfig,
) -> Vec<DraftQuestion> {
    let request = GenerateRequest {
        model: config.model.clone(),
        prompt: build_prompt(text, config.question_count),
        system_prompt: None,
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };

    match call_with_retry(generator, &request, config).await {
        Ok(response) => {
            tracing::debug!(
                model = %response.model,
                latency_ms = response.latency_ms,
                completion_tokens = response.token_usage.completion_tokens,
                "generator responded"
            );
            parse_generated(&response.content)
        }
        Err(e) => {
            tracing::error!("question generation via {} failed: {e:#}", generator.name());
            Vec::new()
        }
    }
}

/// Call the service with a per-call timeout, retrying transient errors with
/// exponential backoff.
async fn call_with_retry(
    generator: &dyn TextGenerator,
    request: &GenerateRequest,
    config: &GenerationConfig,
) -> anyhow::Result<GenerateResponse> {
    let mut last_error = None;
    let mut retry_delay = config.retry_delay;

    for retry in 0..=config.max_retries {
        if retry > 0 {
            tokio::time::sleep(retry_delay).await;
            retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
        }

        let outcome = match tokio::time::timeout(config.timeout, generator.generate(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(config.timeout.as_secs()).into()),
        };

        match outcome {
            Ok(response) => return Ok(response),
            Err(e) => {
                if let Some(provider_err) = e.downcast_ref::<ProviderError>() {
                    if provider_err.is_permanent() {
                        return Err(e);
                    }
                    if let Some(ms) = provider_err.retry_after_ms() {
                        retry_delay = Duration::from_millis(ms).min(MAX_RETRY_DELAY);
                    }
                }
                tracing::warn!(
                    "generator attempt {}/{} failed: {e}",
                    retry + 1,
                    config.max_retries + 1
                );
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error")))
}

/// Parse a service response into draft questions.
///
/// The payload starts at the first `[` that opens a JSON array of records;
/// leading commentary and trailing text (e.g. a closing code fence) are
/// ignored. A response with no such array yields an empty vector.
pub fn parse_generated(raw: &str) -> Vec<DraftQuestion> {
    let Some(records) = locate_array(raw) else {
        tracing::warn!(
            "generator response contains no JSON array ({} chars)",
            raw.len()
        );
        return Vec::new();
    };

    records
        .iter()
        .filter_map(|record| match record {
            Value::Object(fields) => map_record(fields),
            other => {
                tracing::debug!("skipping non-object record: {other}");
                None
            }
        })
        .collect()
}

fn locate_array(raw: &str) -> Option<Vec<Value>> {
    let mut first_error = None;

    for (idx, _) in raw.match_indices('[') {
        let mut stream = serde_json::Deserializer::from_str(&raw[idx..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Array(items))) if items.iter().any(Value::is_object) => {
                return Some(items);
            }
            Some(Err(e)) if first_error.is_none() => first_error = Some(e),
            _ => {}
        }
    }

    if let Some(e) = first_error {
        tracing::warn!("failed to parse generator output as JSON: {e}");
    }
    None
}

fn map_record(fields: &Map<String, Value>) -> Option<DraftQuestion> {
    let text = first_field(fields, TEXT_KEYS)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let options: Vec<String> = match first_field(fields, OPTION_KEYS) {
        Some(Value::Array(items)) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        _ => Vec::new(),
    };

    if text.is_empty() || options.is_empty() {
        tracing::debug!("skipping generated record missing question text or options");
        return None;
    }

    let answer = first_field(fields, ANSWER_KEYS).and_then(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n
            .as_u64()
            .and_then(|i| AnswerKey::from_index(i as usize))
            .map(|k| k.to_string()),
        _ => None,
    });

    Some(DraftQuestion {
        text,
        options,
        answer,
    })
}

/// First synonym present with a non-null, non-empty value.
fn first_field<'a>(fields: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| fields.get(*k))
        .find(|v| !v.is_null() && !matches!(v.as_str(), Some("")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedGenerator;

    #[test]
    fn prompt_requests_record_shape_and_embeds_text() {
        let prompt = build_prompt("Photosynthesis converts light.", 5);
        assert!(prompt.contains("create exactly 5 multiple-choice questions"));
        assert!(prompt.contains("\"correct\": \"A\""));
        assert!(prompt.contains("Only return JSON"));
        assert!(prompt.ends_with("\"\"\"Photosynthesis converts light.\n\"\"\""));
    }

    #[test]
    fn parses_clean_array() {
        let raw = r#"[{"question":"2+2?","options":["3","4","5","6"],"correct":"B"}]"#;
        let drafts = parse_generated(raw);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].text, "2+2?");
        assert_eq!(drafts[0].options, vec!["3", "4", "5", "6"]);
        assert_eq!(drafts[0].answer.as_deref(), Some("B"));
    }

    #[test]
    fn tolerates_leading_prose_and_code_fence() {
        let raw = "Sure! Here are your questions:\n```json\n\
                   [{\"question\":\"Sky colour?\",\"options\":[\"Blue\",\"Red\"],\"correct\":\"A\"}]\n```";
        let drafts = parse_generated(raw);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].text, "Sky colour?");
    }

    #[test]
    fn no_bracket_yields_empty() {
        assert!(parse_generated("I cannot help with that.").is_empty());
        assert!(parse_generated("").is_empty());
    }

    #[test]
    fn malformed_json_yields_empty() {
        assert!(parse_generated("[{\"question\": \"broken\", ").is_empty());
        assert!(parse_generated("[1, 2, 3]").is_empty());
    }

    #[test]
    fn skips_bracketed_prose_before_payload() {
        let raw = "Here are [2] questions: [{\"q\":\"One?\",\"opts\":[\"a\",\"b\"]}]";
        let drafts = parse_generated(raw);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].text, "One?");
    }

    #[test]
    fn maps_field_synonyms() {
        let raw = r#"[
            {"q": "Short key?", "opts": ["x", "y"], "correct_option": "c"},
            {"question": "Camel?", "options": ["1", 2, true], "correctAnswer": "D"},
            {"question": "Index?", "options": ["a", "b", "c"], "correct": 2}
        ]"#;
        let drafts = parse_generated(raw);
        assert_eq!(drafts.len(), 3);
        assert_eq!(drafts[0].text, "Short key?");
        assert_eq!(drafts[0].answer.as_deref(), Some("c"));
        assert_eq!(drafts[1].options, vec!["1", "2", "true"]);
        assert_eq!(drafts[1].answer.as_deref(), Some("D"));
        assert_eq!(drafts[2].answer.as_deref(), Some("C"));
    }

    #[test]
    fn missing_answer_is_none_and_incomplete_records_are_skipped() {
        let raw = r#"[
            {"question": "No answer?", "options": ["a", "b"]},
            {"question": "", "options": ["a", "b"]},
            {"question": "No options?"},
            "just a string"
        ]"#;
        let drafts = parse_generated(raw);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].answer, None);
    }

    #[tokio::test]
    async fn generate_returns_parsed_questions() {
        let generator = ScriptedGenerator::fixed(
            r#"[{"question":"Q?","options":["a","b","c","d"],"correct":"C"}]"#,
        );
        let config = GenerationConfig {
            question_count: 3,
            ..Default::default()
        };
        let drafts = generate_questions(&generator, "source text", &config).await;
        assert_eq!(drafts.len(), 1);

        let request = generator.last_request().unwrap();
        assert!(request.prompt.contains("create exactly 3"));
        assert!(request.prompt.contains("source text"));
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[tokio::test]
    async fn permanent_error_is_not_retried() {
        let generator =
            ScriptedGenerator::failing(|| ProviderError::AuthenticationFailed("bad".into()));
        let config = GenerationConfig {
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let drafts = generate_questions(&generator, "text", &config).await;
        assert!(drafts.is_empty());
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn transient_error_is_retried_then_gives_up() {
        let generator = ScriptedGenerator::failing(|| ProviderError::NetworkError("reset".into()));
        let config = GenerationConfig {
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
            ..Default::default()
        };
        let drafts = generate_questions(&generator, "text", &config).await;
        assert!(drafts.is_empty());
        assert_eq!(generator.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_after_is_capped() {
        let generator = ScriptedGenerator::failing(|| ProviderError::RateLimited {
            retry_after_ms: 3_600_000,
        });
        let config = GenerationConfig {
            max_retries: 2,
            ..Default::default()
        };

        let start = tokio::time::Instant::now();
        let drafts = generate_questions(&generator, "text", &config).await;
        let elapsed = start.elapsed();

        assert!(drafts.is_empty());
        assert_eq!(generator.call_count(), 3);
        assert!(elapsed >= MAX_RETRY_DELAY * 2, "waited {elapsed:?}");
        assert!(elapsed <= MAX_RETRY_DELAY * 2 + Duration::from_secs(1), "waited {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn short_retry_after_overrides_backoff() {
        let generator = ScriptedGenerator::failing(|| ProviderError::RateLimited {
            retry_after_ms: 2_000,
        });
        let config = GenerationConfig {
            max_retries: 1,
            retry_delay: Duration::from_millis(10),
            ..Default::default()
        };

        let start = tokio::time::Instant::now();
        generate_questions(&generator, "text", &config).await;
        let elapsed = start.elapsed();

        assert_eq!(generator.call_count(), 2);
        assert!(elapsed >= Duration::from_secs(2), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(3), "waited {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn hung_generator_times_out() {
        let generator = ScriptedGenerator::hanging();
        let config = GenerationConfig {
            timeout: Duration::from_secs(5),
            max_retries: 0,
            ..Default::default()
        };
        let drafts = generate_questions(&generator, "text", &config).await;
        assert!(drafts.is_empty());
        assert_eq!(generator.call_count(), 1);
    }
}

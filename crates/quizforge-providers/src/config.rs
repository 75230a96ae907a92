//! Configuration file and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use quizforge_core::error::ProviderError;
use quizforge_core::generate::{
    GenerationConfig, DEFAULT_MAX_TOKENS, DEFAULT_QUESTION_COUNT, DEFAULT_TEMPERATURE,
};
use quizforge_core::model::{AnswerKey, DEFAULT_PLACEHOLDER};
use quizforge_core::normalize::NormalizePolicy;
use quizforge_core::traits::{GenerateRequest, GenerateResponse, ModelInfo, TextGenerator};
use quizforge_core::PipelineConfig;

use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;

/// File name looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "quizforge.toml";

/// Configuration for a single text generation provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
    /// Offline provider that always answers with `response`.
    Mock {
        #[serde(default)]
        response: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response_len", &response.len())
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Top-level quizforge configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizforgeConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Provider used for question generation.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Model passed to the generation provider.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Questions requested per generated quiz.
    #[serde(default = "default_question_count")]
    pub question_count: u32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Upper bound on one generation call, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,
    /// Max retries on transient provider errors.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Answer letter used when a question has no usable answer.
    #[serde(default = "default_answer")]
    pub default_answer: String,
    /// Text for padded option slots.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Max concurrent uploads in a batch.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Directory holding stored quizzes.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_question_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}
fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}
fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}
fn default_generation_timeout() -> u64 {
    60
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    500
}
fn default_answer() -> String {
    "A".to_string()
}
fn default_placeholder() -> String {
    DEFAULT_PLACEHOLDER.to_string()
}
fn default_parallelism() -> usize {
    4
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("./quizforge-data")
}

impl Default for QuizforgeConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            question_count: default_question_count(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            generation_timeout_secs: default_generation_timeout(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            default_answer: default_answer(),
            placeholder: default_placeholder(),
            parallelism: default_parallelism(),
            store_dir: default_store_dir(),
        }
    }
}

impl QuizforgeConfig {
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: self.default_model.clone(),
            question_count: self.question_count,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: Duration::from_secs(self.generation_timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    pub fn normalize_policy(&self) -> Result<NormalizePolicy> {
        let default_answer = self
            .default_answer
            .parse::<AnswerKey>()
            .map_err(anyhow::Error::msg)
            .context("invalid default_answer in config")?;
        Ok(NormalizePolicy {
            placeholder: self.placeholder.clone(),
            default_answer,
        })
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            generation: self.generation_config(),
            policy: self.normalize_policy()?,
            parallelism: self.parallelism.max(1),
        })
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `quizforge.toml` in the current directory
/// 2. `~/.config/quizforge/config.toml`
///
/// `QUIZFORGE_OPENAI_KEY` overrides the OpenAI key.
pub fn load_config() -> Result<QuizforgeConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<QuizforgeConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(&path)?
        }
        None => QuizforgeConfig::default(),
    };

    if let Ok(key) = std::env::var("QUIZFORGE_OPENAI_KEY") {
        apply_openai_key(&mut config, key);
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn parse_config(path: &Path) -> Result<QuizforgeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<QuizforgeConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_openai_key(config: &mut QuizforgeConfig, key: String) {
    let entry = config
        .providers
        .entry("openai".into())
        .or_insert(ProviderConfig::OpenAI {
            api_key: String::new(),
            base_url: None,
            org_id: None,
        });
    if let ProviderConfig::OpenAI { api_key, .. } = entry {
        *api_key = key;
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("quizforge"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn TextGenerator>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Ok(Box::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
        )?)),
        ProviderConfig::Ollama { base_url } => Ok(Box::new(OllamaProvider::new(base_url)?)),
        ProviderConfig::Mock { response } => Ok(Box::new(MockProvider::with_fixed_response(
            response,
        ))),
    }
}

/// Create the generator named by `default_provider`.
///
/// With no providers configured at all, returns a generator whose every call
/// fails permanently, so documents that already contain questions can still
/// be processed offline.
pub fn create_default_provider(config: &QuizforgeConfig) -> Result<Box<dyn TextGenerator>> {
    match config.providers.get(&config.default_provider) {
        Some(provider) => create_provider(provider),
        None if config.providers.is_empty() => {
            tracing::warn!("no providers configured; question generation is disabled");
            Ok(Box::new(UnconfiguredProvider))
        }
        None => anyhow::bail!(
            "default provider '{}' is not configured (available: {})",
            config.default_provider,
            sorted_names(&config.providers).join(", ")
        ),
    }
}

fn sorted_names(providers: &HashMap<String, ProviderConfig>) -> Vec<&str> {
    let mut names: Vec<&str> = providers.keys().map(String::as_str).collect();
    names.sort_unstable();
    names
}

struct UnconfiguredProvider;

#[async_trait]
impl TextGenerator for UnconfiguredProvider {
    fn name(&self) -> &str {
        "none"
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<GenerateResponse> {
        Err(ProviderError::AuthenticationFailed(format!(
            "no provider configured; add one to {CONFIG_FILE_NAME} or set QUIZFORGE_OPENAI_KEY"
        ))
        .into())
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_QUIZFORGE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_QUIZFORGE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_QUIZFORGE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("unterminated ${"), "unterminated ${");
        std::env::remove_var("_QUIZFORGE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = QuizforgeConfig::default();
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.question_count, 10);
        assert_eq!(config.max_tokens, 1200);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.store_dir, PathBuf::from("./quizforge-data"));
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
default_provider = "local"
default_model = "llama3.1:8b"
question_count = 5
default_answer = "c"

[providers.openai]
type = "openai"
api_key = "sk-openai"

[providers.local]
type = "ollama"
base_url = "http://localhost:11434"

[providers.offline]
type = "mock"
response = "[]"
"#;
        let config: QuizforgeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert!(matches!(
            config.providers.get("local"),
            Some(ProviderConfig::Ollama { .. })
        ));
        assert_eq!(config.temperature, 0.1);

        let pipeline = config.pipeline_config().unwrap();
        assert_eq!(pipeline.generation.model, "llama3.1:8b");
        assert_eq!(pipeline.generation.question_count, 5);
        assert_eq!(pipeline.generation.timeout, Duration::from_secs(60));
        assert_eq!(pipeline.policy.default_answer, AnswerKey::C);
        assert_eq!(pipeline.policy.placeholder, "N/A");
    }

    #[test]
    fn invalid_default_answer_is_rejected() {
        let config = QuizforgeConfig {
            default_answer: "E".into(),
            ..Default::default()
        };
        let err = config.pipeline_config().unwrap_err();
        assert!(format!("{err:#}").contains("default_answer"));
    }

    #[test]
    fn debug_masks_api_key() {
        let provider = ProviderConfig::OpenAI {
            api_key: "sk-secret".into(),
            base_url: None,
            org_id: None,
        };
        let rendered = format!("{provider:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("***"));
    }

    #[test]
    fn load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "store_dir = \"/tmp/quizzes\"\n[providers.openai]\ntype = \"openai\"\napi_key = \"${_QUIZFORGE_LOAD_KEY}\"\n",
        )
        .unwrap();
        std::env::set_var("_QUIZFORGE_LOAD_KEY", "sk-from-env");

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.store_dir, PathBuf::from("/tmp/quizzes"));
        match config.providers.get("openai") {
            Some(ProviderConfig::OpenAI { api_key, .. }) => {
                // QUIZFORGE_OPENAI_KEY may be set in the environment running tests.
                if std::env::var("QUIZFORGE_OPENAI_KEY").is_err() {
                    assert_eq!(api_key, "sk-from-env");
                }
            }
            other => panic!("unexpected provider: {other:?}"),
        }
        std::env::remove_var("_QUIZFORGE_LOAD_KEY");
    }

    #[test]
    fn missing_explicit_path_fails() {
        let err = load_config_from(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn openai_key_override_inserts_provider() {
        let mut config = QuizforgeConfig::default();
        apply_openai_key(&mut config, "sk-override".into());
        assert!(matches!(
            config.providers.get("openai"),
            Some(ProviderConfig::OpenAI { api_key, .. }) if api_key == "sk-override"
        ));
    }

    #[tokio::test]
    async fn unconfigured_generator_fails_permanently() {
        let generator = create_default_provider(&QuizforgeConfig::default()).unwrap();
        let request = GenerateRequest {
            model: "gpt-4o-mini".into(),
            prompt: "anything".into(),
            system_prompt: None,
            max_tokens: 10,
            temperature: 0.0,
        };
        let err = generator.generate(&request).await.unwrap_err();
        assert!(err
            .downcast_ref::<ProviderError>()
            .is_some_and(ProviderError::is_permanent));
    }

    #[test]
    fn unknown_default_provider_is_an_error() {
        let mut config = QuizforgeConfig::default();
        config.default_provider = "missing".into();
        config
            .providers
            .insert("offline".into(), ProviderConfig::Mock { response: "[]".into() });
        let err = create_default_provider(&config).err().unwrap();
        assert!(err.to_string().contains("offline"));
    }
}

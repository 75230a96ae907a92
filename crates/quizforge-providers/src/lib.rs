//! quizforge-providers: text generation backends and configuration.
//!
//! Implements the `TextGenerator` trait for OpenAI-compatible services and
//! Ollama, plus an offline mock, and loads `quizforge.toml`.

pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;

pub use config::{
    create_default_provider, create_provider, load_config, load_config_from, ProviderConfig,
    QuizforgeConfig, CONFIG_FILE_NAME,
};
pub use quizforge_core::ProviderError;

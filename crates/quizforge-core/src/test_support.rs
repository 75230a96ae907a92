//! In-crate test doubles for the generator seam.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::traits::{GenerateRequest, GenerateResponse, ModelInfo, TextGenerator, TokenUsage};

enum Behavior {
    Respond(String),
    Fail(fn() -> ProviderError),
    Hang,
}

/// A generator that replays one scripted behavior and records calls.
pub struct ScriptedGenerator {
    behavior: Behavior,
    call_count: AtomicU32,
    last_request: Mutex<Option<GenerateRequest>>,
}

impl ScriptedGenerator {
    fn with(behavior: Behavior) -> Self {
        Self {
            behavior,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn fixed(content: &str) -> Self {
        Self::with(Behavior::Respond(content.to_string()))
    }

    pub fn failing(error: fn() -> ProviderError) -> Self {
        Self::with(Behavior::Fail(error))
    }

    pub fn hanging() -> Self {
        Self::with(Behavior::Hang)
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    pub fn last_request(&self) -> Option<GenerateRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<GenerateResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.behavior {
            Behavior::Respond(content) => Ok(GenerateResponse {
                content: content.clone(),
                model: request.model.clone(),
                token_usage: TokenUsage::default(),
                latency_ms: 1,
            }),
            Behavior::Fail(error) => Err(error().into()),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending future never resolves")
            }
        }
    }

    fn available_models(&self) -> Vec<ModelInfo> {
        Vec::new()
    }
}

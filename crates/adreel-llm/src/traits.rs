//! Collaborator traits for text generation and embeddings.

use async_trait::async_trait;

use crate::error::LlmResult;

/// One text-generation request.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Optional system message
    pub system: Option<String>,
    /// User prompt
    pub prompt: String,
    /// Ask the service to constrain output to a JSON object
    pub json_output: bool,
    /// Overrides the client's default temperature
    pub temperature: Option<f32>,
    /// Overrides the client's default token cap
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_output = true;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String>;
}

/// Texts in, one vector per text out (same order).
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, inputs: &[String]) -> LlmResult<Vec<Vec<f32>>>;
}

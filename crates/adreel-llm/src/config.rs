//! Client configuration.

use std::time::Duration;

/// Default OpenAI-compatible endpoint (Groq).
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default model fallback order.
pub const DEFAULT_LLM_MODELS: [&str; 2] = ["llama-3.3-70b-versatile", "mistral-saba-24b"];

/// Default embedding endpoint.
pub const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Configuration for the chat-completions client.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Bearer token
    pub api_key: String,
    /// Base URL, without the `/chat/completions` suffix
    pub base_url: String,
    /// Models tried in order until one succeeds
    pub models: Vec<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Max retries per model
    pub max_retries: u32,
    /// Sampling temperature when a request does not set one
    pub temperature: f32,
    /// Completion token cap when a request does not set one
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            models: DEFAULT_LLM_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
            temperature: 0.7,
            max_tokens: 800,
        }
    }
}

impl LlmConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .unwrap_or_default(),
            base_url: std::env::var("LLM_BASE_URL").unwrap_or(defaults.base_url),
            models: std::env::var("LLM_MODELS")
                .ok()
                .map(|s| parse_model_list(&s))
                .filter(|models| !models.is_empty())
                .unwrap_or(defaults.models),
            timeout: Duration::from_secs(
                std::env::var("LLM_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            max_retries: std::env::var("LLM_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            max_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_tokens),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Full chat-completions URL.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Configuration for the embeddings client.
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_EMBEDDING_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
        }
    }
}

impl EmbeddingConfig {
    /// Create config from environment variables.
    ///
    /// The API key falls back to the text-generation key when unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("EMBEDDING_API_KEY")
                .or_else(|_| std::env::var("LLM_API_KEY"))
                .or_else(|_| std::env::var("GROQ_API_KEY"))
                .unwrap_or_default(),
            base_url: std::env::var("EMBEDDING_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("EMBEDDING_MODEL").unwrap_or(defaults.model),
            timeout: Duration::from_secs(
                std::env::var("EMBEDDING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("EMBEDDING_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_retries),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Full embeddings URL.
    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

/// Split a comma-separated model list, dropping blanks.
fn parse_model_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

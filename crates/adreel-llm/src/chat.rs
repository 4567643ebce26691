//! OpenAI-compatible chat-completions client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::error::{LlmError, LlmResult};
use crate::parse::strip_code_fences;
use crate::traits::{GenerationRequest, TextGenerator};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions client with a model fallback list.
pub struct ChatClient {
    http: Client,
    config: LlmConfig,
}

impl ChatClient {
    /// Create a new client.
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::not_configured("LLM_API_KEY / GROQ_API_KEY not set"));
        }
        if config.models.is_empty() {
            return Err(LlmError::not_configured("no LLM models configured"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> LlmResult<Self> {
        Self::new(LlmConfig::from_env())
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Run the request against each configured model until one answers.
    pub async fn complete(&self, request: &GenerationRequest) -> LlmResult<String> {
        let mut last_error = None;

        for model in &self.config.models {
            debug!(model = %model, "Attempting chat completion");
            match self.with_retry(|| self.call_model(model, request)).await {
                Ok(text) => {
                    info!(model = %model, chars = text.len(), "Chat completion succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!(model = %model, error = %e, "Chat completion failed");
                    last_error = Some(e);
                }
            }
        }

        Err(LlmError::AllModelsFailed(
            last_error.map(|e| e.to_string()).unwrap_or_default(),
        ))
    }

    async fn call_model(&self, model: &str, request: &GenerationRequest) -> LlmResult<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatRequest {
            model,
            messages,
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            response_format: request.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::from_status(status, &text));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::invalid_response("No content in chat response"))?;

        let text = strip_code_fences(&content);
        if text.is_empty() {
            return Err(LlmError::invalid_response("Empty chat response"));
        }
        Ok(text.to_string())
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> LlmResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = LlmResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "LLM request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String> {
        self.complete(request).await
    }
}

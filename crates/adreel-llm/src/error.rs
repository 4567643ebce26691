//! LLM client error types.

use reqwest::StatusCode;
use thiserror::Error;

pub type LlmResult<T> = Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM client not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("LLM service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("All models failed: {0}")]
    AllModelsFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let msg = format!("LLM service returned {}: {}", status, truncate(body, 500));
        if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited(msg)
        } else if status.is_server_error() {
            Self::ServiceUnavailable(msg)
        } else {
            Self::RequestFailed(msg)
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::ServiceUnavailable(_) | LlmError::RateLimited(_) | LlmError::Network(_)
        )
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Stock client error types.

use reqwest::StatusCode;
use thiserror::Error;

pub type StockResult<T> = Result<T, StockError>;

#[derive(Debug, Error)]
pub enum StockError {
    #[error("Stock client not configured: {0}")]
    NotConfigured(String),

    #[error("Stock provider unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Rate limited by stock provider")]
    RateLimited,

    #[error("Search failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StockError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else if status.is_server_error() {
            Self::ServiceUnavailable(format!("provider returned {}", status))
        } else {
            let body: String = body.chars().take(200).collect();
            Self::RequestFailed(format!("provider returned {}: {}", status, body))
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StockError::ServiceUnavailable(_) | StockError::RateLimited | StockError::Network(_)
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StockError::NotConfigured(_) => "not_configured",
            StockError::ServiceUnavailable(_) => "unavailable",
            StockError::RateLimited => "rate_limited",
            StockError::RequestFailed(_) => "failed",
            StockError::Network(_) => "network",
            StockError::Json(_) => "decode",
        }
    }
}

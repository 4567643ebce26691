//! Stock client configuration.

use std::time::Duration;

pub const DEFAULT_PIXABAY_BASE_URL: &str = "https://pixabay.com/api/videos/";

/// Page size the provider accepts.
pub const MIN_PER_PAGE: u32 = 3;
pub const MAX_PER_PAGE: u32 = 200;

#[derive(Debug, Clone)]
pub struct StockClientConfig {
    pub api_key: String,
    /// Videos search endpoint
    pub base_url: String,
    /// Results requested per term
    pub per_page: u32,
    pub timeout: Duration,
    pub max_retries: u32,
}

impl Default for StockClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_PIXABAY_BASE_URL.to_string(),
            per_page: 20,
            timeout: Duration::from_secs(30),
            max_retries: 1,
        }
    }
}

impl StockClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: std::env::var("PIXABAY_API_KEY").unwrap_or_default(),
            base_url: std::env::var("PIXABAY_BASE_URL").unwrap_or(defaults.base_url),
            per_page: std::env::var("PIXABAY_PER_PAGE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.per_page)
                .clamp(MIN_PER_PAGE, MAX_PER_PAGE),
            timeout: Duration::from_secs(
                std::env::var("PIXABAY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_retries: std::env::var("PIXABAY_MAX_RETRIES")
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

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = StockClientConfig::default();
        assert_eq!(config.per_page, 20);
        assert_eq!(config.base_url, "https://pixabay.com/api/videos/");
    }

    #[test]
    fn test_per_page_is_clamped() {
        assert_eq!(StockClientConfig::default().with_per_page(1).per_page, 3);
        assert_eq!(StockClientConfig::default().with_per_page(500).per_page, 200);
    }
}

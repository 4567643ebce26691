//! Pixabay videos search client.

use std::time::Duration;

use adreel_models::Asset;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::StockClientConfig;
use crate::error::{StockError, StockResult};
use crate::schema::SearchResponse;

/// Longest query the provider accepts.
pub const MAX_QUERY_CHARS: usize = 100;

/// Keyword search over a stock-footage catalogue.
#[async_trait]
pub trait AssetSearch: Send + Sync {
    /// Search for one term. Results keep provider order.
    async fn search(&self, term: &str) -> StockResult<Vec<Asset>>;
}

/// Client for the Pixabay videos API.
pub struct PixabayClient {
    http: Client,
    config: StockClientConfig,
}

impl PixabayClient {
    pub fn new(config: StockClientConfig) -> StockResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(StockError::NotConfigured("PIXABAY_API_KEY not set".to_string()));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(StockError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> StockResult<Self> {
        Self::new(StockClientConfig::from_env())
    }

    async fn fetch(&self, query: &str) -> StockResult<Vec<Asset>> {
        let per_page = self.config.per_page.to_string();
        let response = self
            .http
            .get(&self.config.base_url)
            .query(&[
                ("key", self.config.api_key.as_str()),
                ("q", query),
                ("per_page", per_page.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StockError::from_status(status, &body));
        }

        let body: SearchResponse = response.json().await?;
        debug!(total_hits = body.total_hits, returned = body.hits.len(), "Search page received");
        Ok(body.into_assets())
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> StockResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = StockResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                    warn!(
                        "Stock search failed (attempt {}), retrying in {:?}: {}",
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
impl AssetSearch for PixabayClient {
    async fn search(&self, term: &str) -> StockResult<Vec<Asset>> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }
        let query = clip_query(term);

        let result = self.with_retry(|| self.fetch(query)).await;
        let status = match &result {
            Ok(assets) if assets.is_empty() => "empty",
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::counter!("adreel_search_requests_total", "status" => status).increment(1);

        result
    }
}

fn clip_query(term: &str) -> &str {
    match term.char_indices().nth(MAX_QUERY_CHARS) {
        Some((idx, _)) => term[..idx].trim_end(),
        None => term,
    }
}

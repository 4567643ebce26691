//! Concurrent multi-term search.

use adreel_models::Asset;
use adreel_stock::AssetSearch;
use futures::future::join_all;
use tracing::{debug, warn};

/// Results of one search term.
#[derive(Debug, Clone, PartialEq)]
pub struct TermHits {
    pub term: String,
    pub assets: Vec<Asset>,
}

/// Search every term concurrently.
///
/// Output is in term order regardless of completion order. A failed term
/// yields an empty hit list and never affects the others.
pub async fn search_many(search: &dyn AssetSearch, terms: &[String]) -> Vec<TermHits> {
    let futures = terms.iter().map(|term| async move {
        let assets = match search.search(term).await {
            Ok(assets) => {
                debug!(term = %term, hits = assets.len(), "Search completed");
                assets
            }
            Err(e) => {
                warn!(term = %term, error = %e, "Search failed, treating as no results");
                Vec::new()
            }
        };
        TermHits {
            term: term.clone(),
            assets,
        }
    });

    join_all(futures).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use adreel_stock::{StockError, StockResult};
    use async_trait::async_trait;
    use std::time::Duration;

    /// Slower for earlier terms so completion order is reversed.
    struct Staggered;

    #[async_trait]
    impl AssetSearch for Staggered {
        async fn search(&self, term: &str) -> StockResult<Vec<Asset>> {
            match term {
                "slow" => {
                    tokio::time::sleep(Duration::from_millis(30)).await;
                    Ok(vec![Asset::new(1, "slow")])
                }
                "broken" => Err(StockError::RateLimited),
                _ => Ok(vec![Asset::new(2, "fast"), Asset::new(3, "fast")]),
            }
        }
    }

    #[tokio::test]
    async fn test_results_follow_term_order_and_isolate_failures() {
        let terms = vec!["slow".to_string(), "broken".to_string(), "fast".to_string()];
        let hits = search_many(&Staggered, &terms).await;

        assert_eq!(
            hits.iter().map(|h| h.term.as_str()).collect::<Vec<_>>(),
            vec!["slow", "broken", "fast"]
        );
        assert_eq!(hits[0].assets[0].id, 1);
        assert!(hits[1].assets.is_empty());
        assert_eq!(hits[2].assets.len(), 2);
    }

    #[tokio::test]
    async fn test_no_terms() {
        assert!(search_many(&Staggered, &[]).await.is_empty());
    }
}

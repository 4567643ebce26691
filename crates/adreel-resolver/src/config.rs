//! Resolver configuration.

use std::fmt;
use std::str::FromStr;

/// How the best candidate of a pool is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankingStrategy {
    /// A text-generation model picks an index from the candidate window
    #[default]
    Model,
    /// Highest cosine similarity between description and tag embeddings
    Embedding,
}

impl FromStr for RankingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "model" | "llm" => Ok(RankingStrategy::Model),
            "embedding" | "embeddings" => Ok(RankingStrategy::Embedding),
            other => Err(format!("unknown ranking strategy '{}'", other)),
        }
    }
}

impl fmt::Display for RankingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankingStrategy::Model => f.write_str("model"),
            RankingStrategy::Embedding => f.write_str("embedding"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Search terms per scene
    pub max_terms: usize,
    /// Candidates shown to the ranker
    pub candidate_window: usize,
    /// Scenes resolved at the same time
    pub max_scene_parallel: usize,
    pub ranking: RankingStrategy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_terms: 3,
            candidate_window: 10,
            max_scene_parallel: 4,
            ranking: RankingStrategy::Model,
        }
    }
}

impl ResolverConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_terms: std::env::var("RESOLVER_MAX_TERMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_terms)
                .max(1),
            candidate_window: std::env::var("RESOLVER_CANDIDATE_WINDOW")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.candidate_window)
                .max(1),
            max_scene_parallel: std::env::var("RESOLVER_MAX_SCENE_PARALLEL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_scene_parallel)
                .max(1),
            ranking: std::env::var("RESOLVER_RANKING")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.ranking),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_strategy_parse() {
        assert_eq!("Embedding".parse::<RankingStrategy>().unwrap(), RankingStrategy::Embedding);
        assert_eq!(" llm ".parse::<RankingStrategy>().unwrap(), RankingStrategy::Model);
        assert!("random".parse::<RankingStrategy>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.max_terms, 3);
        assert_eq!(config.candidate_window, 10);
        assert_eq!(config.ranking, RankingStrategy::Model);
    }
}

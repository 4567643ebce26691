//! Application state.

use std::sync::Arc;

use adreel_llm::{ChatClient, EmbeddingClient, Embedder, ScriptGenerator, TextGenerator};
use adreel_resolver::{build_ranker, RankingStrategy, ResolverConfig, SceneResolver};
use adreel_stock::{AssetSearch, PixabayClient};
use tracing::warn;

use crate::config::ApiConfig;
use crate::store::{InMemoryScriptStore, ScriptStore};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub scripts: ScriptGenerator,
    pub resolver: Arc<SceneResolver>,
    pub store: Arc<dyn ScriptStore>,
}

impl AppState {
    /// Create application state from environment configuration.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let generator: Arc<dyn TextGenerator> = Arc::new(ChatClient::from_env()?);
        let search: Arc<dyn AssetSearch> = Arc::new(PixabayClient::from_env()?);
        let resolver_config = ResolverConfig::from_env();

        let embedder: Option<Arc<dyn Embedder>> = match resolver_config.ranking {
            RankingStrategy::Embedding => match EmbeddingClient::from_env() {
                Ok(client) => Some(Arc::new(client)),
                Err(e) => {
                    warn!("Embedding client unavailable: {}", e);
                    None
                }
            },
            RankingStrategy::Model => None,
        };

        Ok(Self::from_parts(
            config,
            resolver_config,
            generator,
            search,
            embedder,
            Arc::new(InMemoryScriptStore::new()),
        ))
    }

    /// Assemble state from explicit collaborators.
    pub fn from_parts(
        config: ApiConfig,
        resolver_config: ResolverConfig,
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn AssetSearch>,
        embedder: Option<Arc<dyn Embedder>>,
        store: Arc<dyn ScriptStore>,
    ) -> Self {
        let ranker = build_ranker(resolver_config.ranking, generator.clone(), embedder);
        let resolver = SceneResolver::new(resolver_config, generator.clone(), search, ranker);

        Self {
            config,
            scripts: ScriptGenerator::new(generator),
            resolver: Arc::new(resolver),
            store,
        }
    }
}

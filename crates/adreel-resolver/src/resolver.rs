//! Scene resolver: drives the per-scene pipeline and aggregates results.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use adreel_llm::{Embedder, TextGenerator};
use adreel_models::{ClipMatch, NotFoundReason, Scene, SceneResolution, Script, ScriptResolution};
use adreel_stock::AssetSearch;
use futures::future::join_all;
use futures::FutureExt;
use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::config::{RankingStrategy, ResolverConfig};
use crate::dedupe::CandidatePool;
use crate::query::QuerySynthesizer;
use crate::rank::{rank, CandidateRanker, EmbeddingRanker, ModelRanker};
use crate::rendition::select_best;
use crate::search::search_many;

/// Maps every scene of a script to a stock clip.
pub struct SceneResolver {
    config: ResolverConfig,
    synthesizer: QuerySynthesizer,
    search: Arc<dyn AssetSearch>,
    ranker: Arc<dyn CandidateRanker>,
}

impl SceneResolver {
    pub fn new(
        config: ResolverConfig,
        generator: Arc<dyn TextGenerator>,
        search: Arc<dyn AssetSearch>,
        ranker: Arc<dyn CandidateRanker>,
    ) -> Self {
        let synthesizer = QuerySynthesizer::new(generator, config.max_terms);
        Self {
            config,
            synthesizer,
            search,
            ranker,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve all scenes. The result holds exactly one entry per scene.
    pub async fn resolve(&self, script: &Script) -> ScriptResolution {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        self.resolve_with_cancel(script, cancel_rx).await
    }

    /// Resolve all scenes, stopping early when `cancel` flips to `true`.
    ///
    /// Scenes still running at that point are reported as not found with
    /// reason `cancelled`.
    pub async fn resolve_with_cancel(
        &self,
        script: &Script,
        cancel: watch::Receiver<bool>,
    ) -> ScriptResolution {
        let semaphore = Arc::new(Semaphore::new(self.config.max_scene_parallel.max(1)));
        info!(
            scenes = script.len(),
            max_parallel = self.config.max_scene_parallel,
            ranker = self.ranker.name(),
            "Resolving script"
        );

        let futures = script.iter().map(|scene| {
            let semaphore = semaphore.clone();
            let cancel = cancel.clone();
            let span = info_span!("scene", scene_id = scene.id);

            async move {
                let started = Instant::now();
                let resolution = tokio::select! {
                    biased;
                    _ = wait_cancelled(cancel) => {
                        warn!("Scene cancelled");
                        SceneResolution::not_found(scene.id, fallback_terms(scene), NotFoundReason::Cancelled)
                    }
                    resolution = self.resolve_guarded(scene, &semaphore) => resolution,
                };

                let outcome = resolution
                    .not_found_reason()
                    .map_or("found", |reason| reason.as_str());
                metrics::counter!("adreel_scenes_resolved_total", "outcome" => outcome).increment(1);
                metrics::histogram!("adreel_scene_resolution_seconds")
                    .record(started.elapsed().as_secs_f64());
                resolution
            }
            .instrument(span)
        });

        let resolution: ScriptResolution = join_all(futures).await.into_iter().collect();
        info!(
            found = resolution.found_count(),
            not_found = resolution.not_found_count(),
            "Script resolved"
        );
        resolution
    }

    /// Resolve one scene under the parallelism limit, converting panics into
    /// a not-found marker.
    async fn resolve_guarded(&self, scene: &Scene, semaphore: &Semaphore) -> SceneResolution {
        let Ok(_permit) = semaphore.acquire().await else {
            return SceneResolution::not_found(scene.id, fallback_terms(scene), NotFoundReason::Failed);
        };

        match AssertUnwindSafe(self.resolve_scene(scene)).catch_unwind().await {
            Ok(resolution) => resolution,
            Err(_) => {
                error!("Scene resolution panicked");
                SceneResolution::not_found(scene.id, fallback_terms(scene), NotFoundReason::Failed)
            }
        }
    }

    /// Run the full pipeline for one scene.
    pub async fn resolve_scene(&self, scene: &Scene) -> SceneResolution {
        let terms = self.search_terms(scene).await;
        debug!(terms = ?terms, "Search terms ready");

        let hits = search_many(self.search.as_ref(), &terms).await;
        let mut pool = CandidatePool::from_hits(hits);
        if pool.is_empty() {
            info!(terms = ?terms, "No videos found");
            return SceneResolution::not_found(scene.id, terms, NotFoundReason::NoVideosFound);
        }

        let dropped = pool.retain_playable();
        if dropped > 0 {
            debug!(dropped, remaining = pool.len(), "Dropped candidates without playable renditions");
        }
        if pool.is_empty() {
            info!("No candidate has a playable rendition");
            return SceneResolution::not_found(scene.id, terms, NotFoundReason::NoPlayableRendition);
        }

        let Some(chosen) = rank(
            self.ranker.as_ref(),
            &scene.visual_description,
            &pool,
            self.config.candidate_window,
        )
        .await
        else {
            return SceneResolution::not_found(scene.id, terms, NotFoundReason::NoVideosFound);
        };

        let Some(rendition) = select_best(&chosen.asset) else {
            return SceneResolution::not_found(scene.id, terms, NotFoundReason::NoPlayableRendition);
        };

        let clip = ClipMatch::new(scene.id, chosen.source_term.clone(), &chosen.asset, rendition);
        info!(
            asset_id = clip.asset_id,
            term = %clip.search_query,
            resolution = %clip.resolution,
            pool = pool.len(),
            "Scene resolved"
        );
        SceneResolution::Found(clip)
    }

    /// Precomputed terms when the scene carries them, synthesized otherwise.
    async fn search_terms(&self, scene: &Scene) -> Vec<String> {
        let mut precomputed = scene.precomputed_terms();
        if !precomputed.is_empty() {
            precomputed.truncate(self.config.max_terms.max(1));
            return precomputed;
        }
        self.synthesizer.synthesize(&scene.visual_description).await
    }
}

/// Build the ranker for a strategy.
///
/// Embedding ranking without an embedder falls back to the model ranker.
pub fn build_ranker(
    strategy: RankingStrategy,
    generator: Arc<dyn TextGenerator>,
    embedder: Option<Arc<dyn Embedder>>,
) -> Arc<dyn CandidateRanker> {
    match (strategy, embedder) {
        (RankingStrategy::Embedding, Some(embedder)) => Arc::new(EmbeddingRanker::new(embedder)),
        (RankingStrategy::Embedding, None) => {
            warn!("Embedding ranking requested without an embedder, using model ranking");
            Arc::new(ModelRanker::new(generator))
        }
        (RankingStrategy::Model, _) => Arc::new(ModelRanker::new(generator)),
    }
}

/// Terms reported for scenes that never reached the search stage.
fn fallback_terms(scene: &Scene) -> Vec<String> {
    let terms = scene.precomputed_terms();
    if terms.is_empty() {
        vec![scene.visual_description.clone()]
    } else {
        terms
    }
}

/// Completes once the flag is `true`. Never completes if the sender is
/// dropped first.
async fn wait_cancelled(mut cancel: watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adreel_llm::{GenerationRequest, LlmResult};
    use adreel_models::{Asset, Rendition, SceneDuration};
    use adreel_stock::{StockError, StockResult};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers ranking prompts with a fixed index and query prompts by
    /// matching the quoted scene description.
    struct FakeModel {
        terms: Vec<(&'static str, &'static str)>,
        best_index: &'static str,
        query_calls: AtomicUsize,
    }

    impl FakeModel {
        fn new(terms: Vec<(&'static str, &'static str)>, best_index: &'static str) -> Arc<Self> {
            Arc::new(Self {
                terms,
                best_index,
                query_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for FakeModel {
        async fn generate(&self, request: &GenerationRequest) -> LlmResult<String> {
            if request.prompt.contains("Candidate clips") {
                return Ok(self.best_index.to_string());
            }
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .terms
                .iter()
                .find(|(desc, _)| request.prompt.contains(&format!("\"{desc}\"")))
                .map(|(_, reply)| reply.to_string())
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct FakeSearch {
        results: HashMap<&'static str, Vec<Asset>>,
        failing: Vec<&'static str>,
        stalled: Vec<&'static str>,
        panicking: Vec<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AssetSearch for FakeSearch {
        async fn search(&self, term: &str) -> StockResult<Vec<Asset>> {
            self.calls.lock().unwrap().push(term.to_string());
            if self.panicking.iter().any(|t| *t == term) {
                panic!("search blew up");
            }
            if self.stalled.iter().any(|t| *t == term) {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            if self.failing.iter().any(|t| *t == term) {
                return Err(StockError::ServiceUnavailable("provider returned 503".into()));
            }
            Ok(self.results.get(term).cloned().unwrap_or_default())
        }
    }

    fn asset(id: u64, tags: &str, renditions: &[(u32, u32)]) -> Asset {
        renditions
            .iter()
            .enumerate()
            .fold(Asset::new(id, tags), |a, (i, (w, h))| {
                a.with_rendition(
                    format!("r{i}"),
                    Rendition::new(*w, *h, format!("https://cdn/{id}/{w}x{h}.mp4")),
                )
            })
    }

    fn scene(id: u32, description: &str) -> Scene {
        Scene::new(id, SceneDuration::from_secs(5.0).unwrap(), description)
    }

    fn resolver(model: Arc<FakeModel>, search: FakeSearch) -> SceneResolver {
        let ranker = build_ranker(RankingStrategy::Model, model.clone(), None);
        SceneResolver::new(ResolverConfig::default(), model, Arc::new(search), ranker)
    }

    fn clip_of(resolution: &ScriptResolution, scene_id: u32) -> &ClipMatch {
        resolution
            .get(scene_id)
            .and_then(SceneResolution::clip)
            .unwrap_or_else(|| panic!("scene {scene_id} not resolved"))
    }

    #[tokio::test]
    async fn test_end_to_end_single_scene() {
        let model = FakeModel::new(vec![("sunset beach walk", "beach\nsunset")], r#"{"best_index": 1}"#);
        let search = FakeSearch {
            results: HashMap::from([
                ("beach", vec![asset(7, "beach", &[(640, 360)]), asset(9, "beach, walk", &[(1280, 720), (640, 360)])]),
                ("sunset", vec![asset(7, "beach", &[(640, 360)])]),
            ]),
            ..Default::default()
        };
        let resolver = resolver(model, search);

        let script = Script::new(vec![scene(1, "sunset beach walk")]).unwrap();
        let resolution = resolver.resolve(&script).await;

        assert_eq!(resolution.len(), 1);
        let clip = clip_of(&resolution, 1);
        assert_eq!(clip.asset_id, 9);
        assert_eq!(clip.resolution, "1280x720");
        assert_eq!(clip.search_query, "beach");
        assert_eq!(clip.video_file_url, "https://cdn/9/1280x720.mp4");
    }

    #[tokio::test]
    async fn test_every_scene_gets_an_entry() {
        let model = FakeModel::new(
            vec![("city at night", "skyline"), ("the void", "nothing here"), ("forest path", "trees")],
            "0",
        );
        let search = FakeSearch {
            results: HashMap::from([
                ("skyline", vec![asset(1, "city", &[(1920, 1080)])]),
                ("trees", vec![asset(2, "forest", &[(1280, 720)])]),
            ]),
            ..Default::default()
        };
        let resolver = resolver(model, search);

        let script = Script::new(vec![
            scene(1, "city at night"),
            scene(2, "the void"),
            scene(3, "forest path"),
        ])
        .unwrap();
        let resolution = resolver.resolve(&script).await;

        assert_eq!(resolution.len(), 3);
        assert_eq!(clip_of(&resolution, 1).asset_id, 1);
        assert_eq!(clip_of(&resolution, 3).asset_id, 2);
        match resolution.get(2).unwrap() {
            SceneResolution::NotFound { scene_id, query, reason, .. } => {
                assert_eq!(*scene_id, 2);
                assert_eq!(query, "nothing here");
                assert_eq!(*reason, NotFoundReason::NoVideosFound);
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_searches_mean_no_videos() {
        let model = FakeModel::new(vec![("rain", "rain\numbrella")], "0");
        let search = FakeSearch {
            failing: vec!["rain", "umbrella"],
            ..Default::default()
        };
        let resolver = resolver(model, search);

        let resolution = resolver.resolve(&Script::new(vec![scene(1, "rain")]).unwrap()).await;
        assert_eq!(
            resolution.get(1).unwrap().not_found_reason(),
            Some(NotFoundReason::NoVideosFound)
        );
    }

    #[tokio::test]
    async fn test_partial_search_failure_still_resolves() {
        let model = FakeModel::new(vec![("rain", "rain\numbrella")], "0");
        let search = FakeSearch {
            failing: vec!["rain"],
            results: HashMap::from([("umbrella", vec![asset(4, "umbrella", &[(960, 540)])])]),
            ..Default::default()
        };
        let resolver = resolver(model, search);

        let resolution = resolver.resolve(&Script::new(vec![scene(1, "rain")]).unwrap()).await;
        let clip = clip_of(&resolution, 1);
        assert_eq!(clip.asset_id, 4);
        assert_eq!(clip.search_query, "umbrella");
    }

    #[tokio::test]
    async fn test_no_playable_rendition() {
        let model = FakeModel::new(vec![("desert", "dunes")], "0");
        let search = FakeSearch {
            results: HashMap::from([("dunes", vec![asset(5, "dunes", &[])])]),
            ..Default::default()
        };
        let resolver = resolver(model, search);

        let resolution = resolver.resolve(&Script::new(vec![scene(1, "desert")]).unwrap()).await;
        assert_eq!(
            resolution.get(1).unwrap().not_found_reason(),
            Some(NotFoundReason::NoPlayableRendition)
        );
    }

    #[tokio::test]
    async fn test_out_of_range_rank_uses_first_candidate() {
        let model = FakeModel::new(vec![("cat", "cat")], r#"{"best_index": 99}"#);
        let search = FakeSearch {
            results: HashMap::from([(
                "cat",
                vec![asset(11, "cat", &[(640, 360)]), asset(12, "cat", &[(1920, 1080)])],
            )]),
            ..Default::default()
        };
        let resolver = resolver(model, search);

        let resolution = resolver.resolve(&Script::new(vec![scene(1, "cat")]).unwrap()).await;
        assert_eq!(clip_of(&resolution, 1).asset_id, 11);
    }

    #[tokio::test]
    async fn test_precomputed_terms_skip_synthesis() {
        let model = FakeModel::new(vec![], "0");
        let search = FakeSearch {
            results: HashMap::from([("espresso", vec![asset(3, "coffee", &[(1280, 720)])])]),
            ..Default::default()
        };
        let resolver = resolver(model.clone(), search);

        let script = Script::new(vec![scene(1, "a barista pulls a shot").with_search_query("espresso")]).unwrap();
        let resolution = resolver.resolve(&script).await;

        assert_eq!(clip_of(&resolution, 1).search_query, "espresso");
        assert_eq!(model.query_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_script() {
        let resolver = resolver(FakeModel::new(vec![], "0"), FakeSearch::default());
        assert!(resolver.resolve(&Script::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_panicking_scene_is_isolated() {
        let model = FakeModel::new(vec![("boom", "explode"), ("calm", "lake")], "0");
        let search = FakeSearch {
            panicking: vec!["explode"],
            results: HashMap::from([("lake", vec![asset(8, "lake", &[(1280, 720)])])]),
            ..Default::default()
        };
        let resolver = resolver(model, search);

        let script = Script::new(vec![scene(1, "boom"), scene(2, "calm")]).unwrap();
        let resolution = resolver.resolve(&script).await;

        assert_eq!(resolution.get(1).unwrap().not_found_reason(), Some(NotFoundReason::Failed));
        assert_eq!(clip_of(&resolution, 2).asset_id, 8);
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let model = FakeModel::new(vec![("a", "a")], "0");
        let resolver = resolver(model.clone(), FakeSearch::default());
        let (_tx, rx) = watch::channel(true);

        let script = Script::new(vec![scene(1, "a"), scene(2, "b")]).unwrap();
        let resolution = resolver.resolve_with_cancel(&script, rx).await;

        assert_eq!(resolution.len(), 2);
        for (_, r) in resolution.iter() {
            assert_eq!(r.not_found_reason(), Some(NotFoundReason::Cancelled));
        }
        assert_eq!(model.query_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_in_flight() {
        let model = FakeModel::new(vec![("slow", "stall"), ("quick", "lake")], "0");
        let search = FakeSearch {
            stalled: vec!["stall"],
            results: HashMap::from([("lake", vec![asset(8, "lake", &[(1280, 720)])])]),
            ..Default::default()
        };
        let resolver = resolver(model, search);
        let (tx, rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let _ = tx.send(true);
        });

        let script = Script::new(vec![scene(1, "slow"), scene(2, "quick")]).unwrap();
        let started = Instant::now();
        let resolution = resolver.resolve_with_cancel(&script, rx).await;

        assert!(started.elapsed() < Duration::from_secs(10));
        match resolution.get(1).unwrap() {
            SceneResolution::NotFound { reason, query, .. } => {
                assert_eq!(*reason, NotFoundReason::Cancelled);
                assert_eq!(query, "slow");
            }
            other => panic!("expected cancelled, got {other:?}"),
        }
        assert_eq!(clip_of(&resolution, 2).asset_id, 8);
    }

    #[tokio::test]
    async fn test_embedding_strategy_without_embedder_uses_model() {
        let model = FakeModel::new(vec![], "0");
        let ranker = build_ranker(RankingStrategy::Embedding, model, None);
        assert_eq!(ranker.name(), "model");
    }
}

//! End-to-end pipeline run: script, clip resolution, optional trimming.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use adreel_llm::{ChatClient, Embedder, EmbeddingClient, ScriptGenerator, TextGenerator};
use adreel_media::{ClipTrimmer, TrimConfig, TrimReport};
use adreel_models::{Script, ScriptResolution};
use adreel_resolver::{build_ranker, RankingStrategy, ResolverConfig, SceneResolver};
use adreel_stock::PixabayClient;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

/// Where the script comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptSource {
    Idea(String),
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: ScriptSource,
    pub ranking: Option<RankingStrategy>,
    pub trim: Option<TrimConfig>,
}

/// Everything a run produced, written out as JSON.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_idea: Option<String>,
    pub script: Script,
    pub clips: ScriptResolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trim: Option<TrimReport>,
}

/// Read a script from a JSON file.
pub async fn load_script(path: &Path) -> Result<Script> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read script file: {}", path.display()))?;
    let script = adreel_llm::parse_script(&text)
        .with_context(|| format!("Invalid script in {}", path.display()))?;
    Ok(script)
}

pub async fn run(options: RunOptions, cancel_rx: watch::Receiver<bool>) -> Result<RunOutput> {
    let generator: Arc<dyn TextGenerator> =
        Arc::new(ChatClient::from_env().context("Text generation client is not configured")?);

    let (campaign_idea, script) = match options.source {
        ScriptSource::Idea(idea) => {
            info!("Generating script");
            let script = ScriptGenerator::new(generator.clone())
                .generate(&idea)
                .await
                .context("Script generation failed")?;
            (Some(idea), script)
        }
        ScriptSource::File(path) => (None, load_script(&path).await?),
    };
    if script.is_empty() {
        bail!("Script has no scenes");
    }
    info!(scenes = script.len(), "Script ready");

    let mut resolver_config = ResolverConfig::from_env();
    if let Some(ranking) = options.ranking {
        resolver_config.ranking = ranking;
    }
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

    let search = Arc::new(PixabayClient::from_env().context("Stock search client is not configured")?);
    let ranker = build_ranker(resolver_config.ranking, generator.clone(), embedder);
    let resolver = SceneResolver::new(resolver_config, generator, search, ranker);

    let clips = resolver.resolve_with_cancel(&script, cancel_rx.clone()).await;
    info!(
        found = clips.found_count(),
        not_found = clips.not_found_count(),
        "Resolved clips"
    );

    let trim = match options.trim {
        Some(config) => {
            let trimmer = ClipTrimmer::new(config)
                .context("Failed to create clip trimmer")?
                .with_cancel(cancel_rx);
            Some(trimmer.trim_all(&script, &clips).await)
        }
        None => None,
    };

    Ok(RunOutput {
        campaign_idea,
        script,
        clips,
        trim,
    })
}

/// Write the run output as pretty JSON, or to stdout when no path is given.
pub async fn write_output(output: &RunOutput, path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(output).context("Failed to serialize output")?;
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            tokio::fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), "Wrote result");
        }
        None => println!("{}", json),
    }
    Ok(())
}

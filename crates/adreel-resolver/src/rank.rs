//! Candidate ranking.
//!
//! Rankers only ever see the candidate window and answer with an index into
//! it, or `None` when they have no signal. [`rank`] turns a missing or
//! out-of-range answer into index 0, so a non-empty pool always yields a
//! candidate.

use std::sync::Arc;

use adreel_llm::{extract_delimited, strip_code_fences, Embedder, GenerationRequest, TextGenerator};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dedupe::{Candidate, CandidatePool};
use crate::rendition::select_best;

/// Picks the best candidate for a scene description.
#[async_trait]
pub trait CandidateRanker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Index into `window` of the best match, or `None` without a signal.
    async fn pick(&self, description: &str, window: &[Candidate]) -> Option<usize>;
}

/// Choose one candidate from the first `window_size` entries of the pool.
///
/// Returns `None` only for an empty pool.
pub async fn rank<'a>(
    ranker: &dyn CandidateRanker,
    description: &str,
    pool: &'a CandidatePool,
    window_size: usize,
) -> Option<&'a Candidate> {
    let window = pool.window(window_size);
    if window.is_empty() {
        return None;
    }
    if window.len() == 1 {
        return window.first();
    }

    let index = match ranker.pick(description, window).await {
        Some(i) if i < window.len() => i,
        Some(i) => {
            warn!(ranker = ranker.name(), index = i, window = window.len(), "Ranking index out of range, using first candidate");
            0
        }
        None => {
            debug!(ranker = ranker.name(), "No ranking signal, using first candidate");
            0
        }
    };
    window.get(index)
}

#[derive(Serialize)]
struct CandidateOption<'a> {
    index: usize,
    tags: &'a str,
    duration: f64,
    resolution: String,
    views: u64,
}

/// Lets a text-generation model judge the window.
pub struct ModelRanker {
    generator: Arc<dyn TextGenerator>,
}

impl ModelRanker {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    fn build_prompt(description: &str, window: &[Candidate]) -> String {
        let options: Vec<CandidateOption<'_>> = window
            .iter()
            .enumerate()
            .map(|(index, c)| CandidateOption {
                index,
                tags: &c.asset.tags,
                duration: c.asset.duration,
                resolution: select_best(&c.asset)
                    .map(|r| r.resolution())
                    .unwrap_or_default(),
                views: c.asset.views,
            })
            .collect();
        let options = serde_json::to_string_pretty(&options).unwrap_or_default();

        format!(
            r#"You are selecting stock footage for one scene of a video ad.

Scene description: "{description}"

Candidate clips:
{options}

Pick the clip whose tags best match the scene. Prefer relevance first, then a duration close to a short ad scene, then higher resolution and views.
Return JSON of the form {{"best_index": <index>}} using the zero-based index from the list above."#
        )
    }
}

#[async_trait]
impl CandidateRanker for ModelRanker {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn pick(&self, description: &str, window: &[Candidate]) -> Option<usize> {
        let request = GenerationRequest::new(Self::build_prompt(description, window))
            .json()
            .with_temperature(0.0)
            .with_max_tokens(50);

        match self.generator.generate(&request).await {
            Ok(text) => {
                let index = parse_index(&text);
                if index.is_none() {
                    warn!(response = %text, "Unparseable ranking response");
                }
                index
            }
            Err(e) => {
                warn!(error = %e, "Ranking call failed");
                None
            }
        }
    }
}

/// Read a zero-based index from `{"best_index": n}`, a bare number, or a
/// numeric string. Negative and fractional values are rejected.
///
/// An object followed or preceded by prose is still read; failing that, the
/// first unsigned integer in the text is taken.
pub fn parse_index(text: &str) -> Option<usize> {
    let text = strip_code_fences(text);
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return index_from_json(&value);
    }
    if let Some(value) = extract_delimited(text, '{', '}')
        .and_then(|object| serde_json::from_str::<Value>(object).ok())
    {
        return index_from_json(&value);
    }
    first_integer(text)
}

fn index_from_json(value: &Value) -> Option<usize> {
    match value {
        Value::Object(map) => ["best_index", "index", "best"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(index_from_value),
        other => index_from_value(other),
    }
}

/// First run of ASCII digits not preceded by a minus sign.
fn first_integer(text: &str) -> Option<usize> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    if text[..start].ends_with('-') {
        return None;
    }
    let digits = &text[start..];
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

fn index_from_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| usize::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Ranks by cosine similarity between the description and candidate tags.
pub struct EmbeddingRanker {
    embedder: Arc<dyn Embedder>,
}

impl EmbeddingRanker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }
}

#[async_trait]
impl CandidateRanker for EmbeddingRanker {
    fn name(&self) -> &'static str {
        "embedding"
    }

    async fn pick(&self, description: &str, window: &[Candidate]) -> Option<usize> {
        let tagged: Vec<(usize, &str)> = window
            .iter()
            .enumerate()
            .filter(|(_, c)| c.asset.has_tags())
            .map(|(i, c)| (i, c.asset.tags.as_str()))
            .collect();
        if tagged.is_empty() {
            return None;
        }

        let mut inputs = Vec::with_capacity(tagged.len() + 1);
        inputs.push(description.to_string());
        inputs.extend(tagged.iter().map(|(_, tags)| tags.to_string()));

        let vectors = match self.embedder.embed(&inputs).await {
            Ok(v) if v.len() == inputs.len() => v,
            Ok(v) => {
                warn!(expected = inputs.len(), got = v.len(), "Embedding count mismatch");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Embedding call failed");
                return None;
            }
        };

        let (query, tag_vectors) = vectors.split_first()?;
        let mut best: Option<(usize, f32)> = None;
        for ((index, _), vector) in tagged.iter().zip(tag_vectors) {
            let score = cosine_similarity(query, vector);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((*index, score));
            }
        }
        best.map(|(index, _)| index)
    }
}

/// Cosine similarity; 0.0 for empty or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom > 0.0 {
        dot / denom
    } else {
        0.0
    }
}

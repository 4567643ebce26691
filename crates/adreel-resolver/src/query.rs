//! Search-term synthesis from scene descriptions.

use std::collections::HashSet;
use std::sync::Arc;

use adreel_llm::{extract_delimited, strip_code_fences, GenerationRequest, TextGenerator};
use serde_json::Value;
use tracing::{debug, warn};

/// Derives stock-footage search terms for a scene.
pub struct QuerySynthesizer {
    generator: Arc<dyn TextGenerator>,
    max_terms: usize,
}

impl QuerySynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, max_terms: usize) -> Self {
        Self {
            generator,
            max_terms: max_terms.max(1),
        }
    }

    /// Ordered search terms for a description, between 1 and `max_terms`.
    ///
    /// Falls back to the description itself when the model fails or
    /// returns nothing usable.
    pub async fn synthesize(&self, description: &str) -> Vec<String> {
        if description.trim().is_empty() {
            return vec![description.to_string()];
        }

        let request = GenerationRequest::new(build_prompt(description, self.max_terms))
            .json()
            .with_temperature(0.3)
            .with_max_tokens(200);

        let terms = match self.generator.generate(&request).await {
            Ok(text) => parse_terms(&text, self.max_terms),
            Err(e) => {
                warn!(error = %e, "Query generation failed, using description");
                Vec::new()
            }
        };

        if terms.is_empty() {
            return vec![description.to_string()];
        }
        debug!(terms = ?terms, "Synthesized search terms");
        terms
    }
}

fn build_prompt(description: &str, max_terms: usize) -> String {
    format!(
        r#"You write search queries for a stock video library.
Given the scene description below, produce up to {max_terms} short search queries (1 to 3 words each) built from concrete, filmable nouns such as objects, places and people. Avoid abstract words, brand names and camera directions.

Return JSON of the form {{"queries": ["first", "second"]}} ordered from most to least relevant.

Scene description: "{description}""#
    )
}

/// Parse model output into at most `max_terms` unique terms.
///
/// Accepts a JSON list, an object holding a list under `queries`, `terms`
/// or `keywords` (also when wrapped in prose or a fence), or plain text with
/// one term per line.
pub fn parse_terms(text: &str, max_terms: usize) -> Vec<String> {
    let text = strip_code_fences(text);

    let raw: Vec<String> = match embedded_json(text) {
        Some(value) => terms_from_json(value),
        None => text.lines().map(str::to_string).collect(),
    };

    let mut seen = HashSet::new();
    raw.iter()
        .filter_map(|line| clean_term(line))
        .filter(|term| seen.insert(term.to_lowercase()))
        .take(max_terms)
        .collect()
}

/// The whole text as JSON, else the outermost object, else the outermost list.
fn embedded_json(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok().or_else(|| {
        [('{', '}'), ('[', ']')]
            .iter()
            .filter_map(|(open, close)| extract_delimited(text, *open, *close))
            .find_map(|slice| serde_json::from_str(slice).ok())
    })
}

fn terms_from_json(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(string_item).collect(),
        Value::Object(mut map) => ["queries", "terms", "keywords", "search_queries"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .map(|items| items.into_iter().filter_map(string_item).collect())
            .unwrap_or_default(),
        Value::String(s) => s.lines().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

fn string_item(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Object(mut map) => match map.remove("query") {
            Some(Value::String(s)) => Some(s),
            _ => None,
        },
        _ => None,
    }
}

/// Strip list markers and quotes; `None` for blanks and headings.
fn clean_term(line: &str) -> Option<String> {
    let mut term = line.trim();
    if term.starts_with("```") {
        return None;
    }

    term = term
        .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•'))
        .trim_start();
    let digits = term.len() - term.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        let rest = &term[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            term = stripped.trim_start();
        }
    }

    let term = term
        .trim_end_matches(',')
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`'))
        .trim();

    if term.is_empty() || term.ends_with(':') {
        return None;
    }
    Some(term.to_string())
}

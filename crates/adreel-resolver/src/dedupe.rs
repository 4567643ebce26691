//! Candidate deduplication.

use std::collections::HashSet;

use adreel_models::Asset;

use crate::search::TermHits;

/// An asset together with the first search term that returned it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub asset: Asset,
    pub source_term: String,
}

/// Unique, order-preserving candidates for one scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    /// Keep the first occurrence of each asset id, in merged order.
    pub fn dedupe<I>(merged: I) -> Self
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut seen = HashSet::new();
        let candidates = merged
            .into_iter()
            .filter(|c| seen.insert(c.asset.id))
            .collect();
        Self { candidates }
    }

    /// Flatten per-term hits (term order) and dedupe.
    pub fn from_hits(hits: Vec<TermHits>) -> Self {
        Self::dedupe(hits.into_iter().flat_map(|TermHits { term, assets }| {
            assets.into_iter().map(move |asset| Candidate {
                asset,
                source_term: term.clone(),
            })
        }))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// The first `size` candidates.
    pub fn window(&self, size: usize) -> &[Candidate] {
        &self.candidates[..size.min(self.candidates.len())]
    }

    /// Drop candidates without a downloadable rendition. Returns how many
    /// were removed.
    pub fn retain_playable(&mut self) -> usize {
        let before = self.candidates.len();
        self.candidates.retain(|c| c.asset.has_playable_rendition());
        before - self.candidates.len()
    }
}

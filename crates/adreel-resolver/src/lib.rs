//! Scene-to-clip resolution.
//!
//! For every scene of a script: derive search terms, search the stock
//! provider for each term, dedupe the merged hits, rank the candidates and
//! pick the highest-resolution rendition of the winner. Scenes are resolved
//! independently; a scene that fails in any stage ends up as an explicit
//! not-found entry and never affects its siblings.

pub mod config;
pub mod dedupe;
pub mod query;
pub mod rank;
pub mod rendition;
pub mod resolver;
pub mod search;

pub use config::{RankingStrategy, ResolverConfig};
pub use dedupe::{Candidate, CandidatePool};
pub use query::QuerySynthesizer;
pub use rank::{cosine_similarity, rank, CandidateRanker, EmbeddingRanker, ModelRanker};
pub use rendition::select_best;
pub use resolver::{build_ranker, SceneResolver};
pub use search::{search_many, TermHits};

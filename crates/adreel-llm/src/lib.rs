//! Text-generation and embedding clients.
//!
//! Both clients speak the OpenAI-compatible HTTP dialect (Groq by default).
//! The pipeline depends only on the [`TextGenerator`] and [`Embedder`]
//! traits so tests can substitute fakes.

pub mod chat;
pub mod config;
pub mod embedding;
pub mod error;
pub mod parse;
pub mod script;
pub mod traits;

pub use chat::ChatClient;
pub use config::{EmbeddingConfig, LlmConfig};
pub use embedding::EmbeddingClient;
pub use error::{LlmError, LlmResult};
pub use parse::{extract_delimited, strip_code_fences};
pub use script::{parse_script, ScriptGenerator};
pub use traits::{Embedder, GenerationRequest, TextGenerator};

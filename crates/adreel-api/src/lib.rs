//! Axum HTTP API server.
//!
//! This crate provides:
//! - Script generation from a campaign idea
//! - Per-scene stock clip resolution for generated scripts
//! - Script lookup by id
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod store;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
pub use store::{InMemoryScriptStore, ScriptStore, StoreError, StoreResult};

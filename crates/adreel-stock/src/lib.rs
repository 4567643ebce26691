//! Stock-footage provider client.
//!
//! Searches the Pixabay videos API and normalizes hits into
//! [`adreel_models::Asset`] values.

pub mod client;
pub mod config;
pub mod error;
pub mod schema;

pub use client::{AssetSearch, PixabayClient};
pub use config::StockClientConfig;
pub use error::{StockError, StockResult};

//! Shared data models for the adreel pipeline.
//!
//! Scripts and scenes produced by the script generator, stock assets returned
//! by the footage provider, and the per-scene resolution map handed to the
//! trimmer.

pub mod asset;
pub mod duration;
pub mod error;
pub mod record;
pub mod resolution;
pub mod scene;

pub use asset::{Asset, AssetId, Rendition};
pub use duration::{parse_duration, DurationError, SceneDuration};
pub use error::{ModelError, ModelResult};
pub use record::ScriptRecord;
pub use resolution::{ClipMatch, NotFoundReason, SceneResolution, ScriptResolution};
pub use scene::{Scene, SceneId, Script};

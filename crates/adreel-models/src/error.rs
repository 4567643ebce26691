//! Model validation errors.

use thiserror::Error;

use crate::duration::DurationError;
use crate::scene::SceneId;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Scene id must be positive, got {0}")]
    InvalidSceneId(SceneId),

    #[error("Duplicate scene id {0} in script")]
    DuplicateSceneId(SceneId),

    #[error("Invalid scene duration: {0}")]
    InvalidDuration(#[from] DurationError),
}

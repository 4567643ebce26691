//! Script and scene models.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::duration::SceneDuration;
use crate::error::{ModelError, ModelResult};

/// Scene identifier, unique within a script (1-indexed).
pub type SceneId = u32;

/// One segment of a generated ad script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene number
    #[serde(rename = "scene", alias = "scene_id", alias = "id")]
    pub id: SceneId,

    /// Target duration on screen
    pub duration: SceneDuration,

    /// What the viewer sees; primary input to search and ranking
    pub visual_description: String,

    /// Voice-over or character dialogue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,

    /// Text shown on screen
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_screen_text: Option<String>,

    /// Search query precomputed by the script generator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,

    /// Extra keyword candidates precomputed by the script generator
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl Scene {
    /// Create a scene with only the fields the resolver needs.
    pub fn new(id: SceneId, duration: SceneDuration, visual_description: impl Into<String>) -> Self {
        Self {
            id,
            duration,
            visual_description: visual_description.into(),
            dialogue: None,
            on_screen_text: None,
            search_query: None,
            keywords: Vec::new(),
        }
    }

    /// Attach a precomputed search query.
    pub fn with_search_query(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    /// Attach precomputed keyword candidates.
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Precomputed search terms: the search query first, then keywords.
    ///
    /// Blank entries and case-insensitive repeats are dropped.
    pub fn precomputed_terms(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.search_query
            .iter()
            .chain(self.keywords.iter())
            .map(|term| term.trim())
            .filter(|term| !term.is_empty())
            .filter(|term| seen.insert(term.to_lowercase()))
            .map(str::to_string)
            .collect()
    }
}

/// Ordered list of scenes with unique, positive ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Scene>", into = "Vec<Scene>")]
pub struct Script {
    scenes: Vec<Scene>,
}

impl Script {
    /// Validate and wrap a scene list.
    pub fn new(scenes: Vec<Scene>) -> ModelResult<Self> {
        let mut ids = HashSet::with_capacity(scenes.len());
        for scene in &scenes {
            if scene.id == 0 {
                return Err(ModelError::InvalidSceneId(scene.id));
            }
            if !ids.insert(scene.id) {
                return Err(ModelError::DuplicateSceneId(scene.id));
            }
        }
        Ok(Self { scenes })
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scene> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Look up a scene by id.
    pub fn scene(&self, id: SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Sum of all target durations in seconds.
    pub fn total_duration_secs(&self) -> f64 {
        self.scenes.iter().map(|s| s.duration.as_secs()).sum()
    }
}

impl TryFrom<Vec<Scene>> for Script {
    type Error = ModelError;

    fn try_from(scenes: Vec<Scene>) -> Result<Self, Self::Error> {
        Self::new(scenes)
    }
}

impl From<Script> for Vec<Scene> {
    fn from(script: Script) -> Self {
        script.scenes
    }
}

impl<'a> IntoIterator for &'a Script {
    type Item = &'a Scene;
    type IntoIter = std::slice::Iter<'a, Scene>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenes.iter()
    }
}

//! Per-scene clip resolution results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::asset::{Asset, AssetId, Rendition};
use crate::scene::SceneId;

/// Why a scene ended without a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    /// No search results across all terms
    NoVideosFound,
    /// Candidates existed but none had a downloadable rendition
    NoPlayableRendition,
    /// Resolution was abandoned before the scene finished
    Cancelled,
    /// The scene pipeline failed unexpectedly
    Failed,
}

impl NotFoundReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotFoundReason::NoVideosFound => "no_videos_found",
            NotFoundReason::NoPlayableRendition => "no_playable_rendition",
            NotFoundReason::Cancelled => "cancelled",
            NotFoundReason::Failed => "failed",
        }
    }
}

impl std::fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The asset and rendition chosen for a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipMatch {
    pub scene_id: SceneId,
    /// Search term whose results first contained the asset
    pub search_query: String,
    pub asset_id: AssetId,
    pub page_url: String,
    pub video_file_url: String,
    pub thumbnail_url: String,
    /// `WIDTHxHEIGHT` of the chosen rendition
    pub resolution: String,
    pub width: u32,
    pub height: u32,
    pub file_size: u64,
    /// Asset length in seconds
    pub duration_s: f64,
    pub tags: String,
}

impl ClipMatch {
    pub fn new(scene_id: SceneId, search_query: impl Into<String>, asset: &Asset, rendition: &Rendition) -> Self {
        Self {
            scene_id,
            search_query: search_query.into(),
            asset_id: asset.id,
            page_url: asset.page_url.clone(),
            video_file_url: rendition.url.clone(),
            thumbnail_url: rendition.thumbnail.clone(),
            resolution: rendition.resolution(),
            width: rendition.width,
            height: rendition.height,
            file_size: rendition.size,
            duration_s: asset.duration,
            tags: asset.tags.clone(),
        }
    }
}

/// Outcome of resolving one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SceneResolution {
    Found(ClipMatch),
    NotFound {
        scene_id: SceneId,
        /// Primary query attempted for the scene
        query: String,
        /// Every term searched, in order
        #[serde(default)]
        attempted_terms: Vec<String>,
        reason: NotFoundReason,
    },
}

impl SceneResolution {
    /// Build a not-found marker; the first attempted term becomes the query.
    pub fn not_found(scene_id: SceneId, attempted_terms: Vec<String>, reason: NotFoundReason) -> Self {
        let query = attempted_terms.first().cloned().unwrap_or_default();
        Self::NotFound {
            scene_id,
            query,
            attempted_terms,
            reason,
        }
    }

    pub fn scene_id(&self) -> SceneId {
        match self {
            SceneResolution::Found(clip) => clip.scene_id,
            SceneResolution::NotFound { scene_id, .. } => *scene_id,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SceneResolution::Found(_))
    }

    pub fn clip(&self) -> Option<&ClipMatch> {
        match self {
            SceneResolution::Found(clip) => Some(clip),
            SceneResolution::NotFound { .. } => None,
        }
    }

    pub fn not_found_reason(&self) -> Option<NotFoundReason> {
        match self {
            SceneResolution::Found(_) => None,
            SceneResolution::NotFound { reason, .. } => Some(*reason),
        }
    }
}

/// Script-wide mapping from scene id to its resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptResolution(BTreeMap<SceneId, SceneResolution>);

impl ScriptResolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resolution keyed by its own scene id.
    pub fn insert(&mut self, resolution: SceneResolution) -> Option<SceneResolution> {
        self.0.insert(resolution.scene_id(), resolution)
    }

    pub fn get(&self, scene_id: SceneId) -> Option<&SceneResolution> {
        self.0.get(&scene_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SceneId, &SceneResolution)> {
        self.0.iter()
    }

    /// Resolved clips in scene order.
    pub fn clips(&self) -> impl Iterator<Item = &ClipMatch> {
        self.0.values().filter_map(SceneResolution::clip)
    }

    pub fn found_count(&self) -> usize {
        self.0.values().filter(|r| r.is_found()).count()
    }

    pub fn not_found_count(&self) -> usize {
        self.len() - self.found_count()
    }
}

impl FromIterator<SceneResolution> for ScriptResolution {
    fn from_iter<I: IntoIterator<Item = SceneResolution>>(iter: I) -> Self {
        let mut map = Self::new();
        for resolution in iter {
            map.insert(resolution);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_clip(scene_id: SceneId) -> ClipMatch {
        let rendition = Rendition {
            width: 1280,
            height: 720,
            url: "https://cdn/large.mp4".into(),
            thumbnail: "https://cdn/large.jpg".into(),
            size: 1024,
        };
        let mut asset = Asset::new(9, "beach, walk").with_rendition("large", rendition.clone());
        asset.page_url = "https://pixabay.com/videos/id-9/".into();
        asset.duration = 12.0;
        ClipMatch::new(scene_id, "beach", &asset, &rendition)
    }

    #[test]
    fn test_clip_match_from_asset() {
        let clip = sample_clip(1);
        assert_eq!(clip.asset_id, 9);
        assert_eq!(clip.resolution, "1280x720");
        assert_eq!(clip.video_file_url, "https://cdn/large.mp4");
        assert_eq!(clip.thumbnail_url, "https://cdn/large.jpg");
        assert_eq!(clip.duration_s, 12.0);
    }

    #[test]
    fn test_not_found_carries_first_query() {
        let r = SceneResolution::not_found(
            3,
            vec!["city lights".into(), "neon".into()],
            NotFoundReason::NoVideosFound,
        );
        assert_eq!(r.scene_id(), 3);
        assert!(!r.is_found());
        assert_eq!(r.not_found_reason(), Some(NotFoundReason::NoVideosFound));

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["query"], "city lights");
        assert_eq!(json["reason"], "no_videos_found");
    }

    #[test]
    fn test_found_serializes_with_status_tag() {
        let json = serde_json::to_value(SceneResolution::Found(sample_clip(1))).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["asset_id"], 9);
        assert_eq!(json["resolution"], "1280x720");
    }

    #[test]
    fn test_script_resolution_counts() {
        let map: ScriptResolution = vec![
            SceneResolution::Found(sample_clip(2)),
            SceneResolution::not_found(1, vec![], NotFoundReason::Cancelled),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.len(), 2);
        assert_eq!(map.found_count(), 1);
        assert_eq!(map.not_found_count(), 1);
        assert_eq!(map.clips().map(|c| c.scene_id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(map.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![1, 2]);

        let json = serde_json::to_string(&map).unwrap();
        let back: ScriptResolution = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}

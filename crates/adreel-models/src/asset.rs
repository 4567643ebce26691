//! Stock-footage asset models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Provider asset identifier.
pub type AssetId = u64;

/// One encoded file of an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    pub width: u32,
    pub height: u32,
    /// Direct file URL
    pub url: String,
    /// Poster frame URL
    pub thumbnail: String,
    /// File size in bytes
    pub size: u64,
}

impl Rendition {
    pub fn new(width: u32, height: u32, url: impl Into<String>) -> Self {
        Self {
            width,
            height,
            url: url.into(),
            ..Default::default()
        }
    }

    /// Width × height, widened so large renditions cannot overflow.
    pub fn pixel_area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Resolution label such as `1280x720`.
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    /// A rendition without a file URL cannot be downloaded.
    pub fn is_playable(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// One stock video returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: AssetId,
    /// Comma-separated provider tags
    pub tags: String,
    /// Clip length in seconds
    pub duration: f64,
    /// Quality label (`large`, `medium`, `small`, `tiny`) to rendition
    pub renditions: BTreeMap<String, Rendition>,
    /// Provider detail page
    pub page_url: String,
    /// Popularity signal
    pub views: u64,
}

impl Asset {
    pub fn new(id: AssetId, tags: impl Into<String>) -> Self {
        Self {
            id,
            tags: tags.into(),
            ..Default::default()
        }
    }

    /// Add a rendition under a quality label.
    pub fn with_rendition(mut self, label: impl Into<String>, rendition: Rendition) -> Self {
        self.renditions.insert(label.into(), rendition);
        self
    }

    /// Individual tags, trimmed, without blanks.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.trim().is_empty()
    }

    /// True when at least one rendition has a downloadable file.
    pub fn has_playable_rendition(&self) -> bool {
        self.renditions.values().any(Rendition::is_playable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendition_area_and_label() {
        let r = Rendition::new(3840, 2160, "https://cdn/4k.mp4");
        assert_eq!(r.pixel_area(), 8_294_400);
        assert_eq!(r.resolution(), "3840x2160");
        assert!(r.is_playable());
        assert!(!Rendition::new(640, 360, " ").is_playable());
    }

    #[test]
    fn test_asset_tags() {
        let asset = Asset::new(7, "beach, sunset ,, waves");
        assert_eq!(asset.tag_list(), vec!["beach", "sunset", "waves"]);
        assert!(asset.has_tags());
        assert!(!Asset::new(8, "  ").has_tags());
    }

    #[test]
    fn test_playable_rendition() {
        let asset = Asset::new(1, "x").with_rendition("large", Rendition::new(0, 0, ""));
        assert!(!asset.has_playable_rendition());

        let asset = asset.with_rendition("small", Rendition::new(640, 360, "https://cdn/s.mp4"));
        assert!(asset.has_playable_rendition());
    }
}

//! Provider wire schema.
//!
//! The provider omits fields and sends `null` freely, so every field has a
//! default and each hit is decoded on its own: one malformed hit is dropped
//! without losing the rest of the page.

use std::collections::BTreeMap;

use adreel_models::{Asset, Rendition};
use serde::{Deserialize, Deserializer};
use tracing::warn;

/// Top-level search response.
#[derive(Debug, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default, rename = "totalHits", deserialize_with = "null_as_default")]
    pub total_hits: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub hits: Vec<serde_json::Value>,
}

/// One video hit.
#[derive(Debug, Default, Deserialize)]
pub struct Hit {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub videos: BTreeMap<String, Option<VideoFile>>,
    #[serde(default, rename = "pageURL", deserialize_with = "null_as_default")]
    pub page_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub views: u64,
}

/// One rendition in a hit's `videos` map.
#[derive(Debug, Default, Deserialize)]
pub struct VideoFile {
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub width: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub height: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub size: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub thumbnail: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Hit {
    /// Convert to a domain asset.
    ///
    /// Returns `None` for hits without an id. Renditions with no file URL
    /// are dropped; the asset may end up with none.
    pub fn into_asset(self) -> Option<Asset> {
        if self.id == 0 {
            return None;
        }

        let renditions = self
            .videos
            .into_iter()
            .filter_map(|(label, file)| {
                let file = file?;
                if file.url.trim().is_empty() {
                    return None;
                }
                Some((
                    label,
                    Rendition {
                        width: file.width,
                        height: file.height,
                        url: file.url,
                        thumbnail: file.thumbnail,
                        size: file.size,
                    },
                ))
            })
            .collect();

        Some(Asset {
            id: self.id,
            tags: self.tags,
            duration: self.duration,
            renditions,
            page_url: self.page_url,
            views: self.views,
        })
    }
}

impl SearchResponse {
    /// Decode hits one by one, keeping provider order.
    pub fn into_assets(self) -> Vec<Asset> {
        self.hits
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<Hit>(raw) {
                Ok(hit) => hit.into_asset(),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed search hit");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_hit_converts() {
        let response: SearchResponse = serde_json::from_value(json!({
            "total": 1,
            "totalHits": 1,
            "hits": [{
                "id": 125,
                "pageURL": "https://pixabay.com/videos/id-125/",
                "tags": "beach, sunset, waves",
                "duration": 12,
                "views": 4021,
                "videos": {
                    "large": {"url": "https://cdn/l.mp4", "width": 1920, "height": 1080, "size": 6615235, "thumbnail": "https://cdn/l.jpg"},
                    "tiny": {"url": "https://cdn/t.mp4", "width": 640, "height": 360, "size": 1000}
                }
            }]
        }))
        .unwrap();

        let assets = response.into_assets();
        assert_eq!(assets.len(), 1);
        let asset = &assets[0];
        assert_eq!(asset.id, 125);
        assert_eq!(asset.duration, 12.0);
        assert_eq!(asset.views, 4021);
        assert_eq!(asset.renditions.len(), 2);
        assert_eq!(asset.renditions["large"].resolution(), "1920x1080");
        assert_eq!(asset.renditions["tiny"].thumbnail, "");
    }

    #[test]
    fn test_missing_and_null_fields_default() {
        let response: SearchResponse = serde_json::from_value(json!({
            "hits": [{"id": 5, "tags": null, "videos": null}]
        }))
        .unwrap();

        let assets = response.into_assets();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].tags, "");
        assert_eq!(assets[0].duration, 0.0);
        assert!(assets[0].renditions.is_empty());
    }

    #[test]
    fn test_empty_url_renditions_are_dropped() {
        let hit: Hit = serde_json::from_value(json!({
            "id": 9,
            "videos": {
                "large": {"url": "", "width": 3840, "height": 2160},
                "medium": null,
                "small": {"url": "https://cdn/s.mp4", "width": 960, "height": 540}
            }
        }))
        .unwrap();

        let asset = hit.into_asset().unwrap();
        assert_eq!(asset.renditions.keys().collect::<Vec<_>>(), vec!["small"]);
    }

    #[test]
    fn test_malformed_hits_are_skipped() {
        let response: SearchResponse = serde_json::from_value(json!({
            "hits": [
                {"id": "not-a-number"},
                {"tags": "no id"},
                {"id": 3, "tags": "ok"}
            ]
        }))
        .unwrap();

        let ids: Vec<_> = response.into_assets().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_missing_hits_is_empty() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.into_assets().is_empty());
    }
}

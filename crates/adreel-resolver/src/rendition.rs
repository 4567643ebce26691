//! Rendition selection.

use std::cmp::Reverse;

use adreel_models::{Asset, Rendition};

/// Labels in the order the provider lists them.
const PROVIDER_ORDER: [&str; 4] = ["large", "medium", "small", "tiny"];

fn provider_rank(label: &str) -> usize {
    PROVIDER_ORDER
        .iter()
        .position(|known| *known == label)
        .unwrap_or(PROVIDER_ORDER.len())
}

/// Highest-resolution playable rendition.
///
/// Equal areas go to the label the provider lists first (large, medium,
/// small, tiny); unknown labels come after those, alphabetically.
pub fn select_best(asset: &Asset) -> Option<&Rendition> {
    asset
        .renditions
        .iter()
        .filter(|(_, r)| r.is_playable())
        .min_by_key(|(label, r)| (Reverse(r.pixel_area()), provider_rank(label)))
        .map(|(_, r)| r)
}

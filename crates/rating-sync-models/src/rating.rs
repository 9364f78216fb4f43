use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::media_ids::ItemIds;

/// Largest value on the source scale
pub const SOURCE_SCALE_MAX: i32 = 10;

/// Largest star count on the target scale
pub const TARGET_SCALE_MAX: u8 = 5;

/// One rated movie from the source list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingItem {
    /// 0-10, 0 when the source omitted it
    pub rating: i32,
    pub title: String,
    pub year: Option<u32>,
    pub ids: ItemIds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rated_at: Option<DateTime<Utc>>,
}

impl RatingItem {
    pub fn new(title: impl Into<String>, year: Option<u32>, rating: i32, ids: ItemIds) -> Self {
        Self {
            rating,
            title: title.into(),
            year,
            ids,
            rated_at: None,
        }
    }

    /// Stable dedup key: trakt id, else slug, else `{title}_{year}`
    ///
    /// A missing year is spelled `None` so keys already persisted for
    /// year-less titles keep matching.
    ///
    /// Two untagged items whose titles differ only by case produce different
    /// keys; the source gives us nothing better to go on.
    pub fn identity_key(&self) -> String {
        if let Some(trakt_id) = self.ids.trakt_id {
            return trakt_id.to_string();
        }
        if let Some(slug) = self.ids.slug() {
            return slug.to_string();
        }
        match self.year {
            Some(year) => format!("{}_{}", self.title, year),
            None => format!("{}_None", self.title),
        }
    }

    /// Rating converted to the target star scale
    pub fn stars(&self) -> u8 {
        to_five_star(self.rating)
    }
}

/// Convert a 10-point rating to 1-5 stars.
///
/// Non-positive input maps to 1 rather than "unrated". Halves round up,
/// so 1 -> 1, 5 -> 3, 9 -> 5.
pub fn to_five_star(rating: i32) -> u8 {
    if rating <= 0 {
        return 1;
    }
    let stars = (rating.min(SOURCE_SCALE_MAX) + 1) / 2;
    stars.clamp(1, TARGET_SCALE_MAX as i32) as u8
}

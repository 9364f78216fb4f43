use serde::{Deserialize, Serialize};

/// Identifier bundle attached to a rated title by the rating service
///
/// Any subset may be present. `tmdb_id` and `imdb_id` are the external
/// catalog ids used for resolution; `trakt_id` and `slug` are the rating
/// service's own ids and only feed the identity key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ItemIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trakt_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_id: Option<u32>,
}

impl ItemIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when at least one external catalog id (TMDB or IMDb) is usable
    pub fn has_catalog_id(&self) -> bool {
        self.tmdb_id.is_some() || self.imdb().is_some()
    }

    /// IMDb id with empty strings treated as absent
    pub fn imdb(&self) -> Option<&str> {
        self.imdb_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Slug with empty strings treated as absent
    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref().filter(|slug| !slug.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.trakt_id.is_none() && self.slug().is_none() && self.imdb().is_none() && self.tmdb_id.is_none()
    }
}

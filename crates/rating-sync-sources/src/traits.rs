use async_trait::async_trait;
use rating_sync_models::{InterestUpdate, MediaType, RatingItem};
use crate::error::SourceError;

/// Catalog subject returned by a resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch {
    pub id: String,
    pub title: Option<String>,
}

/// Title lookup for the fallback resolution stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleQuery {
    pub name: String,
    pub year: Option<u32>,
    pub media_type: MediaType,
    pub imdb_id: Option<String>,
}

/// Where rated titles come from
#[async_trait]
pub trait RatingSource: Send + Sync {
    fn source_name(&self) -> &str;

    /// Full rating list in source order
    async fn fetch_rated_movies(&self) -> Result<Vec<RatingItem>, SourceError>;
}

/// Maps external ids or title/year to a catalog subject id
#[async_trait]
pub trait CatalogResolver: Send + Sync {
    async fn match_by_tmdb(&self, tmdb_id: u32, media_type: MediaType) -> Result<Option<CatalogMatch>, SourceError>;

    async fn match_by_title(&self, query: &TitleQuery) -> Result<Option<CatalogMatch>, SourceError>;
}

/// Writes watched status and stars to the catalog site
#[async_trait]
pub trait StatusWriter: Send + Sync {
    /// Establish the authenticated session used by later writes
    async fn open_session(&self) -> Result<(), SourceError> {
        Ok(())
    }

    /// Submit one mutation. Every failure mode is reported as `false`
    /// and explained in the log.
    async fn set_interest(&self, update: &InterestUpdate) -> bool;
}

/// Supplies the raw cookie string for the catalog site
#[async_trait]
pub trait CookieProvider: Send + Sync {
    async fn douban_cookie(&self) -> Result<Option<String>, SourceError>;
}

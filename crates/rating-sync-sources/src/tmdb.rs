use rating_sync_models::MediaType;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use crate::error::SourceError;
use crate::http::{create_client, truncate_body};

const TMDB_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct ExternalIds {
    imdb_id: Option<String>,
}

/// Looks up the IMDb id that belongs to a TMDB id
#[derive(Clone)]
pub struct TmdbClient {
    client: Arc<Client>,
    base_url: String,
    api_key: String,
}

pub fn external_ids_url(base_url: &str, tmdb_id: u32, media_type: MediaType) -> String {
    format!("{}/3/{}/{}/external_ids", base_url, media_type.as_str(), tmdb_id)
}

impl TmdbClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Arc::new(create_client(TMDB_TIMEOUT)),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// `Ok(None)` when TMDB has no such title or no IMDb link for it
    pub async fn imdb_id_for(&self, tmdb_id: u32, media_type: MediaType) -> Result<Option<String>, SourceError> {
        let url = external_ids_url(&self.base_url, tmdb_id, media_type);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            debug!("TMDB has no {} {}", media_type.as_str(), tmdb_id);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate_body(&body, 200),
            });
        }

        let ids: ExternalIds = response
            .json()
            .await
            .map_err(|e| SourceError::Malformed(format!("TMDB external ids: {}", e)))?;
        Ok(ids.imdb_id.filter(|id| !id.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_ids_url() {
        assert_eq!(
            external_ids_url("https://api.themoviedb.org", 603, MediaType::Movie),
            "https://api.themoviedb.org/3/movie/603/external_ids"
        );
        assert_eq!(
            external_ids_url("http://localhost:9000", 1399, MediaType::Tv),
            "http://localhost:9000/3/tv/1399/external_ids"
        );
    }

    #[test]
    fn test_external_ids_blank_imdb() {
        let ids: ExternalIds = serde_json::from_str(r#"{"id":1,"imdb_id":null}"#).unwrap();
        assert_eq!(ids.imdb_id, None);
    }
}

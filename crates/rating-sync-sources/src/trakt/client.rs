use async_trait::async_trait;
use rating_sync_config::Config;
use rating_sync_models::RatingItem;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use crate::error::SourceError;
use crate::http::create_client;
use crate::trakt::api;
use crate::traits::RatingSource;

const TRAKT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads a user's public ratings; needs only an application client id
#[derive(Clone)]
pub struct TraktClient {
    client: Arc<Client>,
    base_url: String,
    username: String,
    client_id: String,
}

impl TraktClient {
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            client: Arc::new(create_client(TRAKT_TIMEOUT)),
            base_url: base_url.into(),
            username: username.into(),
            client_id: client_id.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.endpoints.trakt_api.clone(),
            config.trakt_username.clone(),
            config.trakt_client_id.clone(),
        )
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

#[async_trait]
impl RatingSource for TraktClient {
    fn source_name(&self) -> &str {
        "trakt"
    }

    async fn fetch_rated_movies(&self) -> Result<Vec<RatingItem>, SourceError> {
        let items = api::get_rated_movies(&self.client, &self.base_url, &self.username, &self.client_id).await?;
        info!("Fetched {} Trakt movie ratings for {}", items.len(), self.username);
        Ok(items)
    }
}

use async_trait::async_trait;
use rating_sync_config::Config;
use rating_sync_models::MediaType;
use regex::Regex;
use reqwest::Client;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, warn};
use crate::error::SourceError;
use crate::http::{create_client, truncate_body};
use crate::tmdb::TmdbClient;
use crate::traits::{CatalogMatch, CatalogResolver, TitleQuery};

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Search category covering films and series
const MOVIE_CATEGORY: &str = "1002";

/// One entry of the search result page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub subject_id: Option<String>,
    /// Text of the whole result block, used for year matching
    pub context: String,
}

fn anchor_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)<a\b[^>]*?href="([^"]*)"[^>]*>(.*?)</a>"#).expect("valid anchor regex"))
}

fn subject_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"subject/(\d+)/").expect("valid subject regex"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"))
}

fn strip_tags(html: &str) -> String {
    tag_regex().replace_all(html, " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Subject id from a (possibly redirect-wrapped, percent-encoded) result link
pub fn subject_id_from_link(href: &str) -> Option<String> {
    let decoded = urlencoding::decode(href)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| href.to_string());
    subject_regex()
        .captures(&decoded)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse result blocks marked `class="title"` in page order
pub fn parse_search_results(html: &str) -> Vec<SearchHit> {
    html.split(r#"class="title""#)
        .skip(1)
        .filter_map(|block| {
            let caps = anchor_regex().captures(block)?;
            let href = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let title = caps.get(2).map(|m| strip_tags(m.as_str())).unwrap_or_default();
            Some(SearchHit {
                title,
                subject_id: subject_id_from_link(href),
                context: strip_tags(block),
            })
        })
        .collect()
}

/// First hit mentioning `year`, else the first hit
pub fn pick_hit(hits: &[SearchHit], year: Option<u32>) -> Option<&SearchHit> {
    let with_id: Vec<&SearchHit> = hits.iter().filter(|h| h.subject_id.is_some()).collect();
    if let Some(year) = year {
        let needle = year.to_string();
        if let Some(hit) = with_id.iter().find(|h| h.context.contains(&needle)) {
            return Some(hit);
        }
    }
    with_id.first().copied()
}

/// Resolves titles against the site search page
#[derive(Clone)]
pub struct DoubanSearchResolver {
    client: Arc<Client>,
    www_base: String,
    tmdb: Option<TmdbClient>,
}

impl DoubanSearchResolver {
    pub fn new(www_base: impl Into<String>, tmdb: Option<TmdbClient>) -> Self {
        Self {
            client: Arc::new(create_client(SEARCH_TIMEOUT)),
            www_base: www_base.into(),
            tmdb,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let tmdb = config
            .resolver
            .tmdb_api_key
            .as_ref()
            .map(|key| TmdbClient::new(config.endpoints.tmdb_api.clone(), key.clone()));
        Self::new(config.endpoints.douban_www.clone(), tmdb)
    }

    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, SourceError> {
        let response = self
            .client
            .get(format!("{}/search", self.www_base))
            .query(&[("cat", MOVIE_CATEGORY), ("q", query)])
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SourceError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate_body(&body, 200),
            });
        }
        Ok(parse_search_results(&body))
    }

    async fn search_one(&self, query: &str, year: Option<u32>) -> Result<Option<CatalogMatch>, SourceError> {
        let hits = self.search(query).await?;
        let found = pick_hit(&hits, year).and_then(|hit| {
            hit.subject_id.clone().map(|id| CatalogMatch {
                id,
                title: Some(hit.title.clone()).filter(|t| !t.is_empty()),
            })
        });
        if found.is_none() {
            debug!("No Douban subject for query {:?}", query);
        }
        Ok(found)
    }
}

#[async_trait]
impl CatalogResolver for DoubanSearchResolver {
    async fn match_by_tmdb(&self, tmdb_id: u32, media_type: MediaType) -> Result<Option<CatalogMatch>, SourceError> {
        let Some(tmdb) = &self.tmdb else {
            return Ok(None);
        };
        match tmdb.imdb_id_for(tmdb_id, media_type).await? {
            Some(imdb_id) => self.search_one(&imdb_id, None).await,
            None => Ok(None),
        }
    }

    async fn match_by_title(&self, query: &TitleQuery) -> Result<Option<CatalogMatch>, SourceError> {
        if let Some(imdb_id) = query.imdb_id.as_deref().filter(|id| !id.is_empty()) {
            match self.search_one(imdb_id, None).await {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) => {}
                Err(e) => warn!("Douban search by {} failed: {}", imdb_id, e),
            }
        }
        self.search_one(&query.name, query.year).await
    }
}

use async_trait::async_trait;
use rating_sync_config::Config;
use rating_sync_models::InterestUpdate;
use reqwest::header::{COOKIE, ORIGIN, REFERER};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use crate::douban::cookie::{CookieFile, StaticCookie};
use crate::douban::session::DoubanSession;
use crate::error::SourceError;
use crate::http::{create_client, truncate_body};
use crate::traits::{CookieProvider, StatusWriter};

const DOUBAN_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one interest mutation as reported by the site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterestReply {
    Accepted,
    /// `r: false`, the site refuses ratings for unreleased titles
    NotReleased,
    Malformed,
}

/// Form body for `POST /j/subject/{id}/interest`
pub fn build_interest_form(ck: &str, update: &InterestUpdate) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("ck", ck.to_string()),
        ("interest", update.status.as_form_value().to_string()),
        ("rating", update.form_rating().map(|r| r.to_string()).unwrap_or_default()),
        ("foldcollect", "U".to_string()),
        ("tags", String::new()),
        ("comment", String::new()),
    ];
    if update.private {
        form.push(("private", "on".to_string()));
    }
    form
}

/// Judge a 200 response body: only an explicit `r: false` is a refusal
pub fn parse_interest_response(body: &str) -> InterestReply {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => match json.get("r") {
            Some(Value::Bool(false)) => InterestReply::NotReleased,
            _ => InterestReply::Accepted,
        },
        Err(_) => InterestReply::Malformed,
    }
}

/// Writes watched status and star ratings through the site's JSON endpoint
pub struct DoubanClient {
    client: Arc<Client>,
    www_base: String,
    movie_base: String,
    cookies: Arc<dyn CookieProvider>,
    session: RwLock<DoubanSession>,
}

impl DoubanClient {
    pub fn new(www_base: impl Into<String>, movie_base: impl Into<String>, cookies: Arc<dyn CookieProvider>) -> Self {
        Self {
            client: Arc::new(create_client(DOUBAN_TIMEOUT)),
            www_base: www_base.into(),
            movie_base: movie_base.into(),
            cookies,
            session: RwLock::new(DoubanSession::default()),
        }
    }

    /// Inline cookie wins over the cookie file; neither leaves the session empty
    pub fn from_config(config: &Config) -> Self {
        let cookies: Arc<dyn CookieProvider> = match (&config.cookie_file, config.has_douban_cookie()) {
            (_, true) => Arc::new(StaticCookie::new(config.douban_cookie.clone())),
            (Some(path), false) => Arc::new(CookieFile::new(path.clone())),
            (None, false) => Arc::new(StaticCookie::new(String::new())),
        };
        Self::new(config.endpoints.douban_www.clone(), config.endpoints.douban_movie.clone(), cookies)
    }

    pub async fn session(&self) -> DoubanSession {
        self.session.read().await.clone()
    }
}

#[async_trait]
impl StatusWriter for DoubanClient {
    async fn open_session(&self) -> Result<(), SourceError> {
        let raw = self.cookies.douban_cookie().await?.unwrap_or_default();
        let mut session = DoubanSession::from_cookie(&raw);
        if !session.has_cookies() {
            error!("Douban cookie is empty; check douban_cookie or cookie_file");
        }

        session.refresh_ck(&self.client, &self.www_base).await?;
        if session.is_authenticated() {
            info!("Douban session ready");
        } else {
            error!("Douban did not issue a ck token; the cookie is probably logged out");
        }

        *self.session.write().await = session;
        Ok(())
    }

    async fn set_interest(&self, update: &InterestUpdate) -> bool {
        let session = self.session.read().await.clone();
        let subject_url = format!("{}/subject/{}/", self.movie_base, update.subject_id);
        let form = build_interest_form(session.ck(), update);

        let response = match self
            .client
            .post(format!("{}/j/subject/{}/interest", self.movie_base, update.subject_id))
            .header(REFERER, subject_url)
            .header(ORIGIN, self.movie_base.as_str())
            .header(COOKIE, session.cookie_header())
            .form(&form)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Douban request for {} failed: {}", update.subject_id, e);
                return false;
            }
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                error!("Douban returned no content for {}: {}", update.subject_id, e);
                return false;
            }
        };

        if status.as_u16() != 200 {
            error!("Douban interest update for {} failed ({}): {}", update.subject_id, status, truncate_body(&body, 200));
            return false;
        }

        match parse_interest_response(&body) {
            InterestReply::Accepted => {
                debug!("Douban accepted {} {:?}", update.subject_id, update.rating);
                true
            }
            InterestReply::NotReleased => {
                error!("douban_id: {} is not yet released", update.subject_id);
                false
            }
            InterestReply::Malformed => {
                error!("Unparsable Douban reply for {}: {}", update.subject_id, truncate_body(&body, 200));
                false
            }
        }
    }
}

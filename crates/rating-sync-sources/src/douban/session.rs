use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::Client;
use std::collections::BTreeMap;
use tracing::debug;
use crate::error::SourceError;

const CK: &str = "ck";

/// Cookies and `ck` token that authenticate writes to the catalog site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoubanSession {
    cookies: BTreeMap<String, String>,
    ck: String,
}

/// Split a `Cookie` header style string into name/value pairs.
/// Surrounding double quotes on values are kept; the site expects them.
pub fn parse_cookie_string(raw: &str) -> BTreeMap<String, String> {
    raw.split(';')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Find a usable `ck` among `Set-Cookie` header values
pub fn extract_ck<'a>(set_cookie: impl IntoIterator<Item = &'a str>) -> Option<String> {
    set_cookie.into_iter().find_map(|header| {
        let first = header.split(';').next()?;
        let (name, value) = first.split_once('=')?;
        if name.trim() != CK {
            return None;
        }
        let value = value.trim();
        if value.is_empty() || value.trim_matches('"') == "deleted" {
            return None;
        }
        Some(value.to_string())
    })
}

impl DoubanSession {
    /// Build from a raw cookie string, dropping values that must be refreshed
    pub fn from_cookie(raw: &str) -> Self {
        let mut cookies = parse_cookie_string(raw);
        cookies.remove("__utmz");
        cookies.remove(CK);
        Self { cookies, ck: String::new() }
    }

    pub fn ck(&self) -> &str {
        &self.ck
    }

    pub fn has_cookies(&self) -> bool {
        !self.cookies.is_empty()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.ck.is_empty()
    }

    pub fn set_ck(&mut self, ck: Option<String>) {
        match ck {
            Some(ck) => {
                self.cookies.insert(CK.to_string(), ck.clone());
                self.ck = ck;
            }
            None => {
                self.cookies.remove(CK);
                self.ck.clear();
            }
        }
    }

    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Visit the site home page and pick up a fresh `ck` from `Set-Cookie`
    pub async fn refresh_ck(&mut self, client: &Client, www_base: &str) -> Result<(), SourceError> {
        let response = client
            .get(format!("{}/", www_base))
            .header(COOKIE, self.cookie_header())
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "zh-CN,zh;q=0.8,en-US;q=0.6,en;q=0.4")
            .send()
            .await?;

        let ck = extract_ck(
            response
                .headers()
                .get_all(SET_COOKIE)
                .iter()
                .filter_map(|value| value.to_str().ok()),
        );
        debug!("Douban ck refresh: status={}, ck_present={}", response.status(), ck.is_some());
        self.set_ck(ck);
        Ok(())
    }
}

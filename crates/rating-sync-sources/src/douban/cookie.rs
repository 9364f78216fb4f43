use async_trait::async_trait;
use std::path::PathBuf;
use crate::error::SourceError;
use crate::traits::CookieProvider;

/// Cookie string taken verbatim from configuration
pub struct StaticCookie(String);

impl StaticCookie {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }
}

#[async_trait]
impl CookieProvider for StaticCookie {
    async fn douban_cookie(&self) -> Result<Option<String>, SourceError> {
        let cookie = self.0.trim();
        Ok((!cookie.is_empty()).then(|| cookie.to_string()))
    }
}

/// Cookie kept in a file by an external cookie-sync tool.
///
/// Re-read on every session open so a refreshed export is picked up
/// without restarting.
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CookieProvider for CookieFile {
    async fn douban_cookie(&self) -> Result<Option<String>, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Cookie(format!("failed to read {}: {}", self.path.display(), e)))?;
        let cookie = content.trim();
        Ok((!cookie.is_empty()).then(|| cookie.to_string()))
    }
}

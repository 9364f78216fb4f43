use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Schedule used when none is configured or the configured one is unusable
pub const DEFAULT_CRON: &str = "0 2 * * *";

/// Identity the persisted state blobs are keyed under
pub const PLUGIN_ID: &str = "trakt_ratings_sync";

const PLACEHOLDER_CLIENT_ID: &str = "YOUR_CLIENT_ID";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub trakt_username: String,
    #[serde(default)]
    pub trakt_client_id: String,
    /// Raw `Cookie` header for the catalog site; empty means "use cookie_file"
    #[serde(default)]
    pub douban_cookie: String,
    /// Cookie exported by an external cookie-sync tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie_file: Option<PathBuf>,
    /// Mark written interests as visible only to the account owner
    #[serde(default = "default_true")]
    pub private: bool,
    /// Declared for compatibility; only movie ratings are fetched
    #[serde(default = "default_true")]
    pub only_movies: bool,
    /// Process only the first N items of the source list (0 = all)
    #[serde(default)]
    pub max_sync_count: usize,
    #[serde(default = "default_cron")]
    pub cron: String,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub endpoints: EndpointConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    /// Upper bound on one title's catalog resolution
    #[serde(default = "default_resolve_timeout_secs")]
    pub timeout_secs: u64,
    /// Enables the TMDB id stage of resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmdb_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

/// Base URLs of the remote services, overridable for proxies
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointConfig {
    #[serde(default = "default_trakt_api")]
    pub trakt_api: String,
    #[serde(default = "default_douban_www")]
    pub douban_www: String,
    #[serde(default = "default_douban_movie")]
    pub douban_movie: String,
    #[serde(default = "default_tmdb_api")]
    pub tmdb_api: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("trakt_username is not configured")]
    MissingTraktUsername,
    #[error("trakt_client_id is not configured")]
    MissingTraktClientId,
    #[error("resolver.timeout_secs must be greater than zero")]
    ZeroResolveTimeout,
}

fn default_true() -> bool {
    true
}

fn default_cron() -> String {
    DEFAULT_CRON.to_string()
}

fn default_resolve_timeout_secs() -> u64 {
    30
}

fn default_bind() -> String {
    "127.0.0.1:3011".to_string()
}

fn default_trakt_api() -> String {
    "https://api.trakt.tv".to_string()
}

fn default_douban_www() -> String {
    "https://www.douban.com".to_string()
}

fn default_douban_movie() -> String {
    "https://movie.douban.com".to_string()
}

fn default_tmdb_api() -> String {
    "https://api.themoviedb.org".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable: false,
            trakt_username: String::new(),
            trakt_client_id: String::new(),
            douban_cookie: String::new(),
            cookie_file: None,
            private: default_true(),
            only_movies: default_true(),
            max_sync_count: 0,
            cron: default_cron(),
            resolver: ResolverConfig::default(),
            server: ServerConfig::default(),
            endpoints: EndpointConfig::default(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_resolve_timeout_secs(),
            tmdb_api_key: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            trakt_api: default_trakt_api(),
            douban_www: default_douban_www(),
            douban_movie: default_douban_movie(),
            tmdb_api: default_tmdb_api(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config.normalized())
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Trim user-entered strings and restore defaults for blank ones
    pub fn normalized(mut self) -> Self {
        self.trakt_username = self.trakt_username.trim().to_string();
        self.trakt_client_id = self.trakt_client_id.trim().to_string();
        self.douban_cookie = self.douban_cookie.trim().to_string();
        self.cron = self.cron.trim().to_string();
        if self.cron.is_empty() {
            self.cron = default_cron();
        }
        self.resolver.tmdb_api_key = self
            .resolver
            .tmdb_api_key
            .take()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        for url in [
            &mut self.endpoints.trakt_api,
            &mut self.endpoints.douban_www,
            &mut self.endpoints.douban_movie,
            &mut self.endpoints.tmdb_api,
        ] {
            let trimmed = url.trim().trim_end_matches('/').to_string();
            *url = trimmed;
        }
        self
    }

    /// First missing credential needed to read the rating list
    pub fn missing_credentials(&self) -> Option<ConfigError> {
        if self.trakt_username.is_empty() {
            return Some(ConfigError::MissingTraktUsername);
        }
        if self.trakt_client_id.is_empty() || self.trakt_client_id == PLACEHOLDER_CLIENT_ID {
            return Some(ConfigError::MissingTraktClientId);
        }
        None
    }

    /// A disabled config is always valid; an enabled one needs credentials
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolver.timeout_secs == 0 {
            return Err(ConfigError::ZeroResolveTimeout);
        }
        if !self.enable {
            return Ok(());
        }
        match self.missing_credentials() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn has_douban_cookie(&self) -> bool {
        !self.douban_cookie.is_empty()
    }

    /// `max_sync_count` as an optional cap
    pub fn sync_limit(&self) -> Option<usize> {
        (self.max_sync_count > 0).then_some(self.max_sync_count)
    }
}

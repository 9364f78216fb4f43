pub mod clear;
pub mod config;
pub mod prompts;
pub mod serve;
pub mod status;
pub mod sync;

use color_eyre::Result;
use rating_sync_config::{Config, PathManager};
use std::path::Path;

/// Config from disk, or defaults when the file does not exist yet
pub fn load_config(paths: &PathManager) -> Result<Config> {
    load_config_from(&paths.config_file())
}

pub fn load_config_from(config_file: &Path) -> Result<Config> {
    if !config_file.exists() {
        tracing::debug!("No config at {}, using defaults", config_file.display());
        return Ok(Config::default());
    }
    Config::load_from_file(&config_file.to_path_buf())
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

/// Show the first and last two characters of a secret
pub fn mask_string(s: &str) -> String {
    if s.is_empty() || s == "YOUR_CLIENT_ID" {
        return "<not set>".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

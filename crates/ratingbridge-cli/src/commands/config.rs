use super::{load_config, mask_string, prompts};
use crate::output::Output;
use crate::ConfigCommands;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use rating_sync_config::{config_form, Config, PathManager};

pub async fn run_config(cmd: ConfigCommands, output: &Output) -> Result<()> {
    match cmd {
        ConfigCommands::Show { full } => show_config(full, output),
        ConfigCommands::Init => run_interactive_config(output),
        ConfigCommands::Cookie { file } => configure_cookie(file, output),
        ConfigCommands::Form => {
            output.serialize(&config_form());
            Ok(())
        }
    }
}

fn check(flag: bool) -> String {
    if flag { "✓".green().to_string() } else { "✗".red().to_string() }
}

/// Copy of `config` with secrets masked, for display
pub fn masked(config: &Config) -> Config {
    let mut shown = config.clone();
    shown.trakt_client_id = mask_string(&config.trakt_client_id);
    shown.douban_cookie = mask_string(&config.douban_cookie);
    shown.resolver.tmdb_api_key = config.resolver.tmdb_api_key.as_deref().map(mask_string);
    shown
}

pub fn config_table(config: &Config) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Setting").add_attribute(comfy_table::Attribute::Bold),
        Cell::new("Value").add_attribute(comfy_table::Attribute::Bold),
    ]);
    let cookie_file = config
        .cookie_file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string());
    let rows: Vec<(&str, String)> = vec![
        ("Enabled", check(config.enable)),
        ("Trakt username", config.trakt_username.clone()),
        ("Trakt Client ID", config.trakt_client_id.clone()),
        ("Douban cookie", config.douban_cookie.clone()),
        ("Cookie file", cookie_file),
        ("Private", check(config.private)),
        ("Movies only", check(config.only_movies)),
        ("Max items per run", if config.max_sync_count == 0 { "unlimited".to_string() } else { config.max_sync_count.to_string() }),
        ("Schedule", config.cron.clone()),
        ("Lookup timeout", format!("{}s", config.resolver.timeout_secs)),
        ("TMDB API key", config.resolver.tmdb_api_key.clone().unwrap_or_else(|| "<not set>".to_string())),
        ("HTTP bind", config.server.bind.clone()),
    ];
    for (name, value) in rows {
        table.add_row(vec![Cell::new(name), Cell::new(value)]);
    }
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
    table
}

fn show_config(full: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let config_file = paths.config_file();
    if !config_file.exists() {
        output.warn(format!("Configuration file not found at: {}", config_file.display()));
        output.info("Run 'ratingbridge config init' to create one. Showing defaults.");
    }

    let config = load_config(&paths)?;
    let shown = if full { config } else { masked(&config) };

    if !output.is_human() {
        output.serialize(&shown);
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!("{} {}", "Config file:".bright_white().bold(), config_file.display());
    println!("{}", config_table(&shown));
    if let Err(e) = shown.validate() {
        println!("{} {}", "⚠".yellow(), e);
    }
    Ok(())
}

fn print_section_header(title: &str, output: &Output) {
    output.println("");
    output.println(format!("{}", title.bold().bright_cyan()));
    output.println(format!("{}", "─".repeat(title.chars().count()).bright_cyan()));
}

fn validate_client_id(input: &str) -> Result<(), &'static str> {
    if input.is_empty() {
        return Err("Client ID cannot be empty");
    }
    if input.len() < 10 {
        return Err("Client ID seems too short. Please verify it's correct.");
    }
    Ok(())
}

fn save(config: &Config, paths: &PathManager) -> Result<()> {
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;
    let config_file = paths.config_file();
    config
        .save_to_file(&config_file)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save config to {}: {}", config_file.display(), e))
}

/// Interactive configuration wizard
pub fn run_interactive_config(output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let mut config = load_config(&paths)?;

    print_section_header("Trakt", output);
    output.println("Public ratings are read with an API app's Client ID.");
    output.println("Create one at https://trakt.tv/oauth/applications");
    config.trakt_username = prompts::prompt_string("Trakt username", Some(config.trakt_username.as_str()))?
        .trim()
        .to_string();
    config.trakt_client_id = loop {
        let input = prompts::prompt_string("Trakt Client ID", Some(config.trakt_client_id.as_str()))?;
        match validate_client_id(input.trim()) {
            Ok(()) => break input.trim().to_string(),
            Err(e) => output.error(format!("Validation error: {}", e)),
        }
    };

    print_section_header("Douban", output);
    if config.has_douban_cookie() {
        output.info(format!("Current cookie: {}", mask_string(&config.douban_cookie)));
    }
    if prompts::prompt_yes_no("Enter a Douban cookie now?", Some(!config.has_douban_cookie()))? {
        config.douban_cookie = read_cookie()?;
    }
    config.private = prompts::prompt_yes_no("Mark synced titles as private?", Some(config.private))?;

    print_section_header("Schedule", output);
    config.cron = prompts::prompt_string("Cron schedule (5 fields)", Some(config.cron.as_str()))?;
    config.max_sync_count = prompts::prompt_number("Max items per run (0 = unlimited)", config.max_sync_count)?;
    config.enable = prompts::prompt_yes_no("Enable sync?", Some(true))?;

    let config = config.normalized();
    if let Err(e) = config.validate() {
        output.warn(format!("Configuration saved but incomplete: {}", e));
    }
    save(&config, &paths)?;
    output.success(format!("Configuration saved to {}", paths.config_file().display()));
    Ok(())
}

fn read_cookie() -> Result<String> {
    let cookie = rpassword::prompt_password("Douban cookie (input hidden): ")
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read cookie: {}", e))?;
    Ok(cookie.trim().to_string())
}

fn configure_cookie(file: Option<std::path::PathBuf>, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let mut config = load_config(&paths)?;

    match file {
        Some(path) => {
            if !path.exists() {
                output.warn(format!("{} does not exist yet; it will be read at each sync", path.display()));
            }
            config.cookie_file = Some(path);
            config.douban_cookie.clear();
        }
        None => {
            let cookie = read_cookie()?;
            if cookie.is_empty() {
                return Err(color_eyre::eyre::eyre!("Cookie is empty"));
            }
            config.douban_cookie = cookie;
        }
    }

    save(&config, &paths)?;
    output.success("Douban cookie updated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_hides_secrets() {
        let config = Config {
            trakt_username: "someone".to_string(),
            trakt_client_id: "0123456789abcdef".to_string(),
            douban_cookie: "bid=abc; dbcl2=\"1:x\"".to_string(),
            ..Config::default()
        };
        let shown = masked(&config);
        assert_eq!(shown.trakt_username, "someone");
        assert_eq!(shown.trakt_client_id, "01***ef");
        assert!(!shown.douban_cookie.contains("dbcl2"));
        assert_eq!(shown.resolver.tmdb_api_key, None);
    }

    #[test]
    fn test_validate_client_id() {
        assert!(validate_client_id("").is_err());
        assert!(validate_client_id("short").is_err());
        assert!(validate_client_id("0123456789abcdef").is_ok());
    }

    #[test]
    fn test_config_table_rows() {
        let rendered = config_table(&Config::default()).to_string();
        assert!(rendered.contains("0 2 * * *"));
        assert!(rendered.contains("127.0.0.1:3011"));
        assert!(rendered.contains("unlimited"));
    }
}

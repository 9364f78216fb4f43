use crate::output::Output;
use color_eyre::Result;
use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;
use rating_sync_config::PathManager;
use rating_sync_core::{load_state, open_store};
use rating_sync_models::{to_five_star, PendingReason, SyncState};
use serde_json::json;

fn year_cell(year: Option<u32>) -> Cell {
    Cell::new(year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()))
}

fn styled(table: &mut Table) {
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS);
}

pub fn synced_table(state: &SyncState) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Title", "Year", "Trakt", "Stars", "Douban ID"]);
    for (key, record) in &state.synced {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(&record.title),
            year_cell(record.year),
            Cell::new(record.trakt_rating),
            Cell::new(to_five_star(record.trakt_rating)),
            Cell::new(&record.douban_id),
        ]);
    }
    styled(&mut table);
    table
}

pub fn pending_table(state: &SyncState) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Title", "Year", "Trakt", "Waiting on"]);
    for (key, entry) in &state.wait {
        let reason = match &entry.reason {
            PendingReason::Unwritten { subject_id } => format!("write to {}", subject_id),
            PendingReason::Unresolved { tmdb_id, imdb_id } => format!(
                "lookup (tmdb {}, imdb {})",
                tmdb_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
                imdb_id.as_deref().unwrap_or("-")
            ),
        };
        table.add_row(vec![
            Cell::new(key),
            Cell::new(&entry.title),
            year_cell(entry.year),
            Cell::new(entry.trakt_rating),
            Cell::new(reason),
        ]);
    }
    styled(&mut table);
    table
}

pub async fn run_status(pending: bool, output: &Output) -> Result<()> {
    let paths = PathManager::default();
    let store = open_store(&paths);
    let state = load_state(&store)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to read sync state in {}: {}", store.dir().display(), e))?;

    if !output.is_human() {
        output.json(&json!({
            "synced": state.synced,
            "wait": state.wait,
        }));
        return Ok(());
    }
    if output.is_quiet() {
        return Ok(());
    }

    println!(
        "{} synced, {} waiting for retry ({})",
        state.synced.len().to_string().green(),
        state.wait.len().to_string().yellow(),
        store.dir().display()
    );

    if pending {
        if state.wait.is_empty() {
            println!("{}", "Nothing waiting for retry".bright_black());
        } else {
            println!("{}", pending_table(&state));
        }
    } else if !state.synced.is_empty() {
        println!("{}", synced_table(&state));
    }
    Ok(())
}

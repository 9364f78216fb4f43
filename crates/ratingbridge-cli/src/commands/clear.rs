use crate::output::Output;
use color_eyre::Result;
use rating_sync_config::PathManager;
use rating_sync_core::{open_store, StateStore, SYNCED_KEY, WAIT_KEY};

/// Blob keys selected by the flags
pub fn selected_keys(all: bool, synced: bool, pending: bool) -> Vec<&'static str> {
    let mut keys = Vec::new();
    if all || synced {
        keys.push(SYNCED_KEY);
    }
    if all || pending {
        keys.push(WAIT_KEY);
    }
    keys
}

pub async fn run_clear(all: bool, synced: bool, pending: bool, output: &Output) -> Result<()> {
    let keys = selected_keys(all, synced, pending);
    if keys.is_empty() {
        output.warn("No clear option specified. Use --synced, --pending, or --all");
        output.println("\nExample: ratingbridge clear --pending");
        return Ok(());
    }

    let paths = PathManager::default();
    let store = open_store(&paths);
    clear_keys(&store, &keys, output)
}

pub fn clear_keys(store: &dyn StateStore, keys: &[&str], output: &Output) -> Result<()> {
    for key in keys {
        let removed = store
            .remove(key)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to clear {} state: {}", key, e))?;
        if removed {
            output.success(format!("Cleared {} state", key));
        } else {
            output.info(format!("No {} state to clear", key));
        }
    }
    Ok(())
}

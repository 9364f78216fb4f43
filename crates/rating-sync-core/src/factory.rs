use anyhow::Result;
use rating_sync_config::{Config, ConfigError, PathManager, PLUGIN_ID};
use rating_sync_sources::{DoubanClient, DoubanSearchResolver, TraktClient};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use crate::bridge::RuntimeBridge;
use crate::state_store::JsonFileStore;
use crate::sync::SyncOrchestrator;

pub fn open_store(paths: &PathManager) -> JsonFileStore {
    JsonFileStore::new(&paths.state_dir(), PLUGIN_ID)
}

/// Wire the HTTP collaborators described by `config`
///
/// Missing credentials are not an error here; the orchestrator reports them
/// as a run outcome.
pub fn build_orchestrator(config: Config, paths: &PathManager, handle: Handle) -> Result<SyncOrchestrator> {
    if config.resolver.timeout_secs == 0 {
        return Err(ConfigError::ZeroResolveTimeout.into());
    }
    let bridge = RuntimeBridge::new(handle, Duration::from_secs(config.resolver.timeout_secs));
    let source = Arc::new(TraktClient::from_config(&config));
    let resolver = Arc::new(DoubanSearchResolver::from_config(&config));
    let writer = Arc::new(DoubanClient::from_config(&config));
    let store = Arc::new(open_store(paths));
    Ok(SyncOrchestrator::new(config, source, resolver, writer, store, bridge))
}

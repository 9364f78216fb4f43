pub mod bridge;
pub mod factory;
pub mod resolve;
pub mod service;
pub mod state_store;
pub mod sync;

pub use bridge::{BridgeError, RuntimeBridge};
pub use factory::{build_orchestrator, open_store};
pub use resolve::resolve_catalog_id;
pub use service::{OrchestratorFactory, SyncService, TriggerResponse, ALREADY_RUNNING};
pub use state_store::{load_state, save_state, JsonFileStore, MemoryStore, StateStore, StoreError, SYNCED_KEY, WAIT_KEY};
pub use sync::{ItemOutcome, RunOutcome, RunReport, SyncOrchestrator};

use anyhow::Result;
use rating_sync_config::Config;
use rating_sync_models::{InterestUpdate, PendingReason, PendingRetry, RatingItem, SyncRecord, SyncState};
use rating_sync_sources::{CatalogResolver, RatingSource, StatusWriter};
use serde::Serialize;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use crate::bridge::RuntimeBridge;
use crate::resolve::{resolve_catalog_id, UNKNOWN_TITLE};
use crate::state_store::{load_state, save_state, StateStore};

/// What happened to one rated title during a pass
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    /// Neither TMDB nor IMDb id; never retried
    MissingIds,
    AlreadySynced { key: String },
    /// Resolution finished but found no subject; not retried
    Unmatched { key: String },
    /// Resolution timed out or its task failed
    ResolveFailed { key: String, entry: PendingRetry },
    WriteFailed { key: String, entry: PendingRetry },
    Synced { key: String, record: SyncRecord },
    /// Anything else that went wrong while handling the item
    Crashed { reason: String },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::AlreadySynced { .. } | ItemOutcome::Synced { .. })
    }

    /// Apply this outcome to the persisted maps
    pub fn fold_into(self, state: &mut SyncState) {
        match self {
            ItemOutcome::AlreadySynced { key } => {
                state.clear_pending(&key);
            }
            ItemOutcome::Synced { key, record } => state.mark_synced(key, record),
            ItemOutcome::ResolveFailed { key, entry } | ItemOutcome::WriteFailed { key, entry } => {
                state.mark_pending(key, entry)
            }
            ItemOutcome::MissingIds | ItemOutcome::Unmatched { .. } | ItemOutcome::Crashed { .. } => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Disabled,
    MissingCredentials,
    /// Fetch failed or returned nothing; state untouched
    Aborted(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub success: usize,
    pub failure: usize,
    pub duration: Duration,
}

impl RunReport {
    fn skipped(outcome: RunOutcome, start: Instant) -> Self {
        Self {
            outcome,
            success: 0,
            failure: 0,
            duration: start.elapsed(),
        }
    }

    pub fn summary(&self) -> String {
        match &self.outcome {
            RunOutcome::Completed => format!("sync finished: success {}, failure {}", self.success, self.failure),
            RunOutcome::Disabled => "sync is disabled".to_string(),
            RunOutcome::MissingCredentials => "trakt_username or trakt_client_id is not configured".to_string(),
            RunOutcome::Aborted(reason) => format!("sync aborted: {}", reason),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Drives one pass: fetch, per-item resolve and write, persist.
///
/// All methods are synchronous and block on async collaborators through
/// the [`RuntimeBridge`], so call them off the runtime's worker threads.
pub struct SyncOrchestrator {
    config: Config,
    source: Arc<dyn RatingSource>,
    resolver: Arc<dyn CatalogResolver>,
    writer: Arc<dyn StatusWriter>,
    store: Arc<dyn StateStore>,
    bridge: RuntimeBridge,
}

impl SyncOrchestrator {
    pub fn new(
        config: Config,
        source: Arc<dyn RatingSource>,
        resolver: Arc<dyn CatalogResolver>,
        writer: Arc<dyn StatusWriter>,
        store: Arc<dyn StateStore>,
        bridge: RuntimeBridge,
    ) -> Self {
        Self {
            config,
            source,
            resolver,
            writer,
            store,
            bridge,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn load_state(&self) -> Result<SyncState> {
        Ok(load_state(self.store.as_ref())?)
    }

    /// One full scheduled or manual pass
    #[instrument(skip(self), fields(source = self.source.source_name()))]
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();

        if !self.config.enable {
            debug!("Rating sync is disabled, skipping");
            return Ok(RunReport::skipped(RunOutcome::Disabled, start));
        }
        if let Some(missing) = self.config.missing_credentials() {
            warn!("Skipping rating sync: {}", missing);
            return Ok(RunReport::skipped(RunOutcome::MissingCredentials, start));
        }

        info!(operation = "sync", "Starting Trakt rating sync");
        let source = self.source.clone();
        let mut items = match self.bridge.call(async move { source.fetch_rated_movies().await }) {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                warn!("Fetching ratings failed: {}", e);
                return Ok(RunReport::skipped(RunOutcome::Aborted(e.to_string()), start));
            }
            Err(e) => {
                error!("Fetching ratings failed: {}", e);
                return Ok(RunReport::skipped(RunOutcome::Aborted(e.to_string()), start));
            }
        };
        if items.is_empty() {
            info!("No Trakt movie ratings returned");
            return Ok(RunReport::skipped(RunOutcome::Aborted("no ratings".to_string()), start));
        }

        let state = self.load_state()?;

        let writer = self.writer.clone();
        match self.bridge.call(async move { writer.open_session().await }) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Opening Douban session failed, writes will fail: {}", e),
            Err(e) => error!("Opening Douban session failed, writes will fail: {}", e),
        }

        if let Some(limit) = self.config.sync_limit() {
            if items.len() > limit {
                debug!("Processing first {} of {} ratings", limit, items.len());
                items.truncate(limit);
            }
        }

        let (state, mut report) = self.run_pass(state, &items);
        save_state(self.store.as_ref(), &state)?;

        report.duration = start.elapsed();
        info!(
            operation = "sync",
            success = report.success,
            failure = report.failure,
            duration_ms = report.duration.as_millis() as u64,
            "Trakt rating sync finished"
        );
        Ok(report)
    }

    /// Process `items` in order and fold the outcomes into `state`
    pub fn run_pass(&self, mut state: SyncState, items: &[RatingItem]) -> (SyncState, RunReport) {
        let start = Instant::now();
        // Outcomes are folded after the loop, so repeats of a key are dropped up front
        let mut seen = HashSet::new();
        let outcomes: Vec<ItemOutcome> = items
            .iter()
            .filter(|item| {
                let first = seen.insert(item.identity_key());
                if !first {
                    debug!("Skipping repeated rating in this pass: {} ({:?})", item.title, item.year);
                }
                first
            })
            .map(|item| {
                catch_unwind(AssertUnwindSafe(|| self.process_item(&state, item))).unwrap_or_else(|payload| {
                    let reason = panic_message(payload.as_ref());
                    error!("Rating sync for {} panicked: {}", item.title, reason);
                    ItemOutcome::Crashed { reason }
                })
            })
            .collect();

        let success = outcomes.iter().filter(|o| o.is_success()).count();
        let failure = outcomes.len() - success;
        for outcome in outcomes {
            outcome.fold_into(&mut state);
        }

        let report = RunReport {
            outcome: RunOutcome::Completed,
            success,
            failure,
            duration: start.elapsed(),
        };
        (state, report)
    }

    /// Decide and perform the work for one item without touching `state`
    pub fn process_item(&self, state: &SyncState, item: &RatingItem) -> ItemOutcome {
        let title = if item.title.is_empty() { UNKNOWN_TITLE } else { item.title.as_str() };

        if !item.ids.has_catalog_id() {
            warn!("Rating has no tmdb/imdb id: {} ({:?})", title, item.year);
            return ItemOutcome::MissingIds;
        }

        let key = item.identity_key();
        if state.is_current(&key, item.rating) {
            debug!("Already synced with the same rating: {}", title);
            return ItemOutcome::AlreadySynced { key };
        }

        let subject_id = match state.pending_subject(&key) {
            Some(subject_id) => {
                debug!("Retrying write for {} with subject {}", title, subject_id);
                subject_id.to_string()
            }
            None => {
                let resolver = self.resolver.clone();
                let ids = item.ids.clone();
                let lookup_title = item.title.clone();
                let year = item.year;
                let resolved = self.bridge.call_with_timeout(async move {
                    resolve_catalog_id(resolver.as_ref(), &ids, &lookup_title, year).await
                });
                match resolved {
                    Ok(Some(subject_id)) => subject_id,
                    Ok(None) => {
                        warn!("No Douban subject found: {} ({:?})", title, item.year);
                        return ItemOutcome::Unmatched { key };
                    }
                    Err(e) => {
                        warn!("Douban lookup failed for {} ({:?}): {}", title, item.year, e);
                        let entry = PendingRetry {
                            title: title.to_string(),
                            year: item.year,
                            trakt_rating: item.rating,
                            reason: PendingReason::Unresolved {
                                tmdb_id: item.ids.tmdb_id,
                                imdb_id: item.ids.imdb().map(str::to_string),
                            },
                        };
                        return ItemOutcome::ResolveFailed { key, entry };
                    }
                }
            }
        };

        let stars = item.stars();
        let update = InterestUpdate::watched(subject_id.clone(), stars, self.config.private);
        let writer = self.writer.clone();
        let written = match self.bridge.call(async move { writer.set_interest(&update).await }) {
            Ok(written) => written,
            Err(e) => {
                error!("Douban write for {} crashed: {}", title, e);
                return ItemOutcome::Crashed { reason: e.to_string() };
            }
        };

        if written {
            info!("Synced {} ({:?}) -> Douban {} with {} stars", title, item.year, subject_id, stars);
            ItemOutcome::Synced {
                key,
                record: SyncRecord {
                    douban_id: subject_id,
                    trakt_rating: item.rating,
                    title: title.to_string(),
                    year: item.year,
                },
            }
        } else {
            error!("Douban write failed: {} ({:?}) subject_id={}", title, item.year, subject_id);
            ItemOutcome::WriteFailed {
                key,
                entry: PendingRetry {
                    title: title.to_string(),
                    year: item.year,
                    trakt_rating: item.rating,
                    reason: PendingReason::Unwritten { subject_id },
                },
            }
        }
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use rating_sync_config::Config;
use rating_sync_core::{MemoryStore, RuntimeBridge, StateStore, SyncOrchestrator};
use rating_sync_models::{InterestUpdate, ItemIds, MediaType, RatingItem};
use rating_sync_sources::{CatalogMatch, CatalogResolver, RatingSource, SourceError, StatusWriter, TitleQuery};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Runtime;

pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

pub fn movie(trakt_id: u64, tmdb_id: u32, title: &str, year: u32, rating: i32) -> RatingItem {
    RatingItem::new(
        title,
        Some(year),
        rating,
        ItemIds {
            trakt_id: Some(trakt_id),
            tmdb_id: Some(tmdb_id),
            ..ItemIds::default()
        },
    )
}

pub fn enabled_config() -> Config {
    Config {
        enable: true,
        trakt_username: "someone".to_string(),
        trakt_client_id: "client".to_string(),
        ..Config::default()
    }
}

pub struct MockSource {
    pub items: Mutex<Result<Vec<RatingItem>, String>>,
}

impl MockSource {
    pub fn new(items: Vec<RatingItem>) -> Arc<Self> {
        Arc::new(Self { items: Mutex::new(Ok(items)) })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self { items: Mutex::new(Err(message.to_string())) })
    }

    pub fn set(&self, items: Vec<RatingItem>) {
        *self.items.lock().unwrap() = Ok(items);
    }
}

#[async_trait]
impl RatingSource for MockSource {
    fn source_name(&self) -> &str {
        "mock"
    }

    async fn fetch_rated_movies(&self) -> Result<Vec<RatingItem>, SourceError> {
        self.items.lock().unwrap().clone().map_err(SourceError::new)
    }
}

/// Answers TMDB lookups from a table; can be told to hang or panic
#[derive(Default)]
pub struct MockResolver {
    pub by_tmdb: Mutex<HashMap<u32, String>>,
    pub slow: Mutex<HashSet<u32>>,
    pub panics: Mutex<HashSet<u32>>,
    pub calls: Mutex<usize>,
}

impl MockResolver {
    pub fn with(entries: &[(u32, &str)]) -> Arc<Self> {
        let resolver = Self::default();
        for (tmdb, id) in entries {
            resolver.by_tmdb.lock().unwrap().insert(*tmdb, id.to_string());
        }
        Arc::new(resolver)
    }

    pub fn insert(&self, tmdb: u32, id: &str) {
        self.by_tmdb.lock().unwrap().insert(tmdb, id.to_string());
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl CatalogResolver for MockResolver {
    async fn match_by_tmdb(&self, tmdb_id: u32, _media_type: MediaType) -> Result<Option<CatalogMatch>, SourceError> {
        *self.calls.lock().unwrap() += 1;
        let explode = self.panics.lock().unwrap().contains(&tmdb_id);
        if explode {
            panic!("resolver exploded on {}", tmdb_id);
        }
        let slow = self.slow.lock().unwrap().contains(&tmdb_id);
        if slow {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        let id = self.by_tmdb.lock().unwrap().get(&tmdb_id).cloned();
        Ok(id.map(|id| CatalogMatch { id, title: None }))
    }

    async fn match_by_title(&self, _query: &TitleQuery) -> Result<Option<CatalogMatch>, SourceError> {
        Ok(None)
    }
}

/// Records every submitted update
#[derive(Default)]
pub struct MockWriter {
    pub updates: Mutex<Vec<InterestUpdate>>,
    pub rejects: Mutex<HashSet<String>>,
    pub panics: Mutex<HashSet<String>>,
    pub sessions: Mutex<usize>,
    pub session_error: bool,
}

impl MockWriter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn written(&self) -> Vec<InterestUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn reject(&self, subject_id: &str) {
        self.rejects.lock().unwrap().insert(subject_id.to_string());
    }

    pub fn accept(&self, subject_id: &str) {
        self.rejects.lock().unwrap().remove(subject_id);
    }
}

#[async_trait]
impl StatusWriter for MockWriter {
    async fn open_session(&self) -> Result<(), SourceError> {
        *self.sessions.lock().unwrap() += 1;
        if self.session_error {
            return Err(SourceError::Cookie("no cookie".to_string()));
        }
        Ok(())
    }

    async fn set_interest(&self, update: &InterestUpdate) -> bool {
        if self.panics.lock().unwrap().contains(&update.subject_id) {
            panic!("writer exploded on {}", update.subject_id);
        }
        self.updates.lock().unwrap().push(update.clone());
        !self.rejects.lock().unwrap().contains(&update.subject_id)
    }
}

pub struct Harness {
    pub runtime: Runtime,
    pub source: Arc<MockSource>,
    pub resolver: Arc<MockResolver>,
    pub writer: Arc<MockWriter>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new(items: Vec<RatingItem>, resolver: Arc<MockResolver>) -> Self {
        Self {
            runtime: runtime(),
            source: MockSource::new(items),
            resolver,
            writer: MockWriter::new(),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn orchestrator(&self, config: Config) -> SyncOrchestrator {
        self.orchestrator_with_timeout(config, Duration::from_secs(2))
    }

    pub fn orchestrator_with_timeout(&self, config: Config, timeout: Duration) -> SyncOrchestrator {
        let store: Arc<dyn StateStore> = self.store.clone();
        SyncOrchestrator::new(
            config,
            self.source.clone(),
            self.resolver.clone(),
            self.writer.clone(),
            store,
            RuntimeBridge::new(self.runtime.handle().clone(), timeout),
        )
    }
}

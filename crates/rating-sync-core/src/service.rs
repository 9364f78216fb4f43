use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use crate::sync::{RunOutcome, RunReport, SyncOrchestrator};

pub const ALREADY_RUNNING: &str = "a sync is already running";

/// Builds a fresh orchestrator per run so config edits apply without restart
pub type OrchestratorFactory = Arc<dyn Fn() -> Result<SyncOrchestrator> + Send + Sync>;

/// Body of the manual trigger endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub message: String,
}

impl TriggerResponse {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            success: !matches!(report.outcome, RunOutcome::Aborted(_)),
            message: report.summary(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Serializes scheduled and manual runs inside one process
#[derive(Clone)]
pub struct SyncService {
    factory: OrchestratorFactory,
    running: Arc<Mutex<()>>,
}

impl SyncService {
    pub fn new(factory: OrchestratorFactory) -> Self {
        Self {
            factory,
            running: Arc::new(Mutex::new(())),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Run one pass unless another is in flight
    pub async fn run_once(&self) -> Result<Option<RunReport>> {
        let Ok(guard) = self.running.clone().try_lock_owned() else {
            return Ok(None);
        };
        let factory = self.factory.clone();
        let report = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let orchestrator = factory()?;
            orchestrator.run()
        })
        .await??;
        Ok(Some(report))
    }

    /// Manual trigger; never fails, reports problems in the response
    pub async fn trigger(&self) -> TriggerResponse {
        match self.run_once().await {
            Ok(Some(report)) => {
                info!("Manual sync: {}", report.summary());
                TriggerResponse::from_report(&report)
            }
            Ok(None) => {
                warn!("Manual sync rejected: {}", ALREADY_RUNNING);
                TriggerResponse::failed(ALREADY_RUNNING)
            }
            Err(e) => {
                error!("Manual sync failed: {:#}", e);
                TriggerResponse::failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_error_is_reported() {
        let service = SyncService::new(Arc::new(|| Err(anyhow::anyhow!("config file is unreadable"))));
        let response = service.trigger().await;
        assert_eq!(response, TriggerResponse::failed("config file is unreadable"));
        assert!(!service.is_running());
    }

    #[test]
    fn test_response_from_report() {
        let report = RunReport {
            outcome: RunOutcome::Completed,
            success: 1,
            failure: 2,
            duration: std::time::Duration::ZERO,
        };
        let response = TriggerResponse::from_report(&report);
        assert!(response.success);
        assert_eq!(response.message, "sync finished: success 1, failure 2");

        let aborted = RunReport {
            outcome: RunOutcome::Aborted("user someone not found".into()),
            ..report
        };
        assert!(!TriggerResponse::from_report(&aborted).success);
    }
}

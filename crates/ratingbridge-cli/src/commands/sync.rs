use crate::output::Output;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use rating_sync_config::PathManager;
use rating_sync_core::{build_orchestrator, RunOutcome};
use tokio::runtime::Handle;
use super::load_config;

/// One pass now, in the foreground
pub async fn run_sync(output: &Output) -> Result<()> {
    tracing::debug!("Sync command started");

    let paths = PathManager::default();
    let config = load_config(&paths)?;
    let handle = Handle::current();

    let report = tokio::task::spawn_blocking(move || {
        let orchestrator = build_orchestrator(config, &paths, handle)?;
        orchestrator.run()
    })
    .await
    .wrap_err("Sync task failed")?
    .map_err(|e| color_eyre::eyre::eyre!("Sync failed: {:#}", e))?;

    if !output.is_human() {
        output.serialize(&report);
        return Ok(());
    }

    match &report.outcome {
        RunOutcome::Completed if report.failure == 0 => output.success(report.summary()),
        RunOutcome::Completed => output.warn(report.summary()),
        RunOutcome::Disabled => {
            output.warn(report.summary());
            output.info("Set enable = true in the config file or run 'ratingbridge config init'.");
        }
        RunOutcome::MissingCredentials => output.error(report.summary()),
        RunOutcome::Aborted(_) => output.error(report.summary()),
    }
    Ok(())
}

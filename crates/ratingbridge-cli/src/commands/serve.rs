use crate::api::{self, ApiState, ConfigSource};
use crate::output::Output;
use color_eyre::Result;
use rating_sync_config::{PathManager, DEFAULT_CRON};
use rating_sync_core::{build_orchestrator, SyncService};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};
use super::load_config;

/// Crontab weekday (0-7, Sunday at both ends) to the scheduler's 1-7 with Sunday = 1
fn scheduler_weekday(day: u32) -> u32 {
    day % 7 + 1
}

fn weekday_part(part: &str) -> Option<Vec<u32>> {
    let (range, step) = match part.split_once('/') {
        Some((range, step)) => (range, Some(step.parse::<usize>().ok().filter(|s| *s > 0)?)),
        None => (part, None),
    };
    let (lo, hi) = if range == "*" {
        (0, 6)
    } else if let Some((lo, hi)) = range.split_once('-') {
        (lo.parse::<u32>().ok()?, hi.parse::<u32>().ok()?)
    } else {
        let day = range.parse::<u32>().ok()?;
        (day, if step.is_some() { 6 } else { day })
    };
    if lo > hi || hi > 7 {
        return None;
    }
    Some((lo..=hi).step_by(step.unwrap_or(1)).map(scheduler_weekday).collect())
}

/// Rewrite a numeric crontab day-of-week field as an explicit scheduler list.
///
/// Fields the translation does not understand (names, `?`) are passed
/// through for the scheduler to accept or reject.
fn translate_weekdays(field: &str) -> String {
    if field == "*" {
        return field.to_string();
    }
    let mut days = Vec::new();
    for part in field.split(',') {
        match weekday_part(part) {
            Some(part_days) => days.extend(part_days),
            None => return field.to_string(),
        }
    }
    days.sort_unstable();
    days.dedup();
    days.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
}

/// Convert a 5-field crontab line to the scheduler's seconds-first form.
///
/// Expressions that already carry a seconds field are left alone.
pub fn normalize_cron(expr: &str) -> String {
    let expr = expr.trim();
    let fields: Vec<&str> = expr.split_whitespace().collect();
    match fields.as_slice() {
        [minute, hour, day, month, weekday] => {
            format!("0 {} {} {} {} {}", minute, hour, day, month, translate_weekdays(weekday))
        }
        _ => expr.to_string(),
    }
}

fn sync_job(schedule: &str, service: SyncService) -> Result<Job> {
    Job::new_async(normalize_cron(schedule).as_str(), move |_uuid, _scheduler| {
        let service = service.clone();
        Box::pin(async move {
            info!(operation = "scheduled_sync_start", "Starting scheduled sync");
            match service.run_once().await {
                Ok(Some(report)) => info!(
                    operation = "scheduled_sync_complete",
                    success = report.success,
                    failure = report.failure,
                    "{}",
                    report.summary()
                ),
                Ok(None) => warn!(operation = "scheduled_sync_skipped", "Previous sync still running"),
                Err(e) => error!(operation = "scheduled_sync_error", error = %e, "Scheduled sync failed"),
            }
        })
    })
    .map_err(|e| color_eyre::eyre::eyre!("invalid cron expression {:?}: {:?}", schedule, e))
}

/// Job for `schedule`, else for the default schedule, else nothing
pub fn schedule_job(schedule: &str, service: SyncService) -> Option<(String, Job)> {
    let schedule = if schedule.trim().is_empty() { DEFAULT_CRON } else { schedule.trim() };
    match sync_job(schedule, service.clone()) {
        Ok(job) => return Some((schedule.to_string(), job)),
        Err(e) => warn!("{}; falling back to {}", e, DEFAULT_CRON),
    }
    match sync_job(DEFAULT_CRON, service) {
        Ok(job) => Some((DEFAULT_CRON.to_string(), job)),
        Err(e) => {
            error!("Default schedule unusable, no sync will be scheduled: {}", e);
            None
        }
    }
}

pub async fn run_serve(
    cron_override: Option<String>,
    bind_override: Option<String>,
    run_on_startup: bool,
    output: &Output,
) -> Result<()> {
    let paths = Arc::new(PathManager::default());
    paths
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create data directories: {}", e))?;
    let config = load_config(&paths)?;

    let handle = Handle::current();
    let factory_paths = paths.clone();
    let service = SyncService::new(Arc::new(move || {
        let config = load_config(&factory_paths).map_err(|e| anyhow::anyhow!("{}", e))?;
        build_orchestrator(config, &factory_paths, handle.clone())
    }));

    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create scheduler: {:?}", e))?;
    if config.enable {
        let schedule = cron_override.unwrap_or_else(|| config.cron.clone());
        if let Some((schedule, job)) = schedule_job(&schedule, service.clone()) {
            scheduler
                .add(job)
                .await
                .map_err(|e| color_eyre::eyre::eyre!("Failed to add sync job: {:?}", e))?;
            info!(operation = "scheduler_started", schedule = %schedule, "Sync scheduled (UTC)");
            output.info(format!("Sync scheduled: {} (UTC)", schedule));
        }
    } else {
        output.warn("Sync is disabled; no schedule registered. Manual triggers still report status.");
    }
    scheduler
        .start()
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to start scheduler: {:?}", e))?;

    if run_on_startup {
        let startup = service.clone();
        tokio::spawn(async move {
            info!(operation = "scheduler_startup", "Running initial sync on startup");
            let response = startup.trigger().await;
            info!(operation = "scheduler_startup", success = response.success, "{}", response.message);
        });
    }

    let config_paths = paths.clone();
    let config_source: ConfigSource = Arc::new(move || {
        load_config(&config_paths).map_err(|e| anyhow::anyhow!("{}", e))
    });
    let app = api::router(ApiState {
        service,
        config: config_source,
    });

    let bind = bind_override.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to bind {}: {}", bind, e))?;
    output.success(format!("Listening on http://{} (GET|POST /sync, GET /form, GET /state)", bind));
    info!(operation = "server_started", bind = %bind, "HTTP trigger listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await?;

    info!(operation = "shutdown", "Shutting down scheduler");
    if let Err(e) = scheduler.shutdown().await {
        warn!("Scheduler shutdown failed: {:?}", e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Weekday};

    fn idle_service() -> SyncService {
        SyncService::new(Arc::new(|| Err(anyhow::anyhow!("not used"))))
    }

    #[test]
    fn test_normalize_cron() {
        assert_eq!(normalize_cron("0 2 * * *"), "0 0 2 * * *");
        assert_eq!(normalize_cron("  */30 * * * *  "), "0 */30 * * * *");
        assert_eq!(normalize_cron("15 0 2 * * *"), "15 0 2 * * *");
    }

    #[test]
    fn test_normalize_cron_weekdays() {
        assert_eq!(normalize_cron("0 2 * * 0"), "0 0 2 * * 1");
        assert_eq!(normalize_cron("0 2 * * 7"), "0 0 2 * * 1");
        assert_eq!(normalize_cron("0 2 * * 1"), "0 0 2 * * 2");
        assert_eq!(normalize_cron("0 2 * * 1-5"), "0 0 2 * * 2,3,4,5,6");
        assert_eq!(normalize_cron("0 2 * * 5-7"), "0 0 2 * * 1,6,7");
        assert_eq!(normalize_cron("0 2 * * 0,6"), "0 0 2 * * 1,7");
        assert_eq!(normalize_cron("0 2 * * */2"), "0 0 2 * * 1,3,5,7");
        assert_eq!(normalize_cron("0 2 * * MON"), "0 0 2 * * MON");
    }

    async fn next_weekday(schedule: &str) -> (String, Weekday) {
        let mut scheduler = JobScheduler::new().await.unwrap();
        let (registered, job) = schedule_job(schedule, idle_service()).unwrap();
        let id = scheduler.add(job).await.unwrap();
        let next = scheduler.next_tick_for_job(id).await.unwrap().unwrap();
        (registered, next.weekday())
    }

    #[tokio::test]
    async fn test_crontab_weekday_fires_on_that_day() {
        assert_eq!(next_weekday("0 2 * * 0").await, ("0 2 * * 0".to_string(), Weekday::Sun));
        assert_eq!(next_weekday("30 4 * * 1").await, ("30 4 * * 1".to_string(), Weekday::Mon));
        assert_eq!(next_weekday("0 2 * * 6").await, ("0 2 * * 6".to_string(), Weekday::Sat));
    }

    #[tokio::test]
    async fn test_invalid_schedule_falls_back_to_default() {
        let (schedule, _job) = schedule_job("every night please", idle_service()).unwrap();
        assert_eq!(schedule, DEFAULT_CRON);

        let (schedule, _job) = schedule_job("   ", idle_service()).unwrap();
        assert_eq!(schedule, DEFAULT_CRON);
    }
}

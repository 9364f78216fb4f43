use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use rating_sync_config::{config_form, form_values, Config, ConfigForm};
use rating_sync_core::{SyncService, TriggerResponse};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

/// Reads the current configuration for each request
pub type ConfigSource = Arc<dyn Fn() -> anyhow::Result<Config> + Send + Sync>;

#[derive(Clone)]
pub struct ApiState {
    pub service: SyncService,
    pub config: ConfigSource,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub enabled: bool,
    pub running: bool,
}

#[derive(Debug, Serialize)]
pub struct FormResponse {
    #[serde(flatten)]
    pub form: ConfigForm,
    /// Current values, when the config file is readable
    pub values: Option<Value>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/sync", get(trigger_sync).post(trigger_sync))
        .route("/form", get(form))
        .route("/state", get(plugin_state))
        .with_state(state)
}

async fn trigger_sync(State(state): State<ApiState>) -> Json<TriggerResponse> {
    Json(state.service.trigger().await)
}

async fn form(State(state): State<ApiState>) -> Json<FormResponse> {
    let values = match (state.config)() {
        Ok(config) => Some(form_values(&config)),
        Err(e) => {
            warn!("Config unavailable for /form: {:#}", e);
            None
        }
    };
    Json(FormResponse {
        form: config_form(),
        values,
    })
}

async fn plugin_state(State(state): State<ApiState>) -> Json<StateResponse> {
    let enabled = match (state.config)() {
        Ok(config) => config.enable,
        Err(e) => {
            warn!("Config unavailable for /state: {:#}", e);
            false
        }
    };
    Json(StateResponse {
        enabled,
        running: state.service.is_running(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use rating_sync_config::PathManager;
    use rating_sync_core::build_orchestrator;
    use tempfile::TempDir;
    use tokio::runtime::Handle;
    use tower::ServiceExt;

    fn app(config: Config, dir: &TempDir) -> Router {
        let paths = Arc::new(PathManager::with_base(dir.path().to_path_buf()));
        let handle = Handle::current();
        let factory_config = config.clone();
        let service = SyncService::new(Arc::new(move || {
            build_orchestrator(factory_config.clone(), &paths, handle.clone())
        }));
        router(ApiState {
            service,
            config: Arc::new(move || Ok(config.clone())),
        })
    }

    async fn call(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sync_endpoint_accepts_get_and_post() {
        let dir = TempDir::new().unwrap();
        for method in [Method::GET, Method::POST] {
            let (status, body) = call(app(Config::default(), &dir), method, "/sync").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["success"], true);
            assert_eq!(body["message"], "sync is disabled");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sync_endpoint_reports_missing_credentials() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            enable: true,
            ..Config::default()
        };
        let (status, body) = call(app(config, &dir), Method::POST, "/sync").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "trakt_username or trakt_client_id is not configured");
    }

    #[tokio::test]
    async fn test_state_endpoint() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            enable: true,
            ..Config::default()
        };
        let (_, body) = call(app(config, &dir), Method::GET, "/state").await;
        assert_eq!(body["enabled"], true);
        assert_eq!(body["running"], false);
    }

    #[tokio::test]
    async fn test_form_endpoint() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            trakt_username: "someone".to_string(),
            ..Config::default()
        };
        let (status, body) = call(app(config, &dir), Method::GET, "/form").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["defaults"]["cron"], "0 2 * * *");
        assert_eq!(body["values"]["trakt_username"], "someone");
        assert!(body["fields"].as_array().map(|f| f.len() == 8).unwrap_or(false));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let dir = TempDir::new().unwrap();
        let response = app(Config::default(), &dir)
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

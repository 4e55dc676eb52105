use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use resmon_core::{AlertEvaluator, KillRequest, MetricSampler, ProcessManager, SortKey};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

const DEFAULT_LIMIT: usize = 5;

/// Shared handles for the request handlers.
#[derive(Clone)]
pub struct AppState {
    pub sampler: Arc<MetricSampler>,
    pub processes: Arc<ProcessManager>,
    pub alerts: Arc<AlertEvaluator>,
    /// Upper bound for any single call into the OS.
    pub os_timeout: Duration,
}

/// Response envelope shared by every `/api` route.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn ok<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }),
    )
        .into_response()
}

fn fail(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(error.into()),
        }),
    )
        .into_response()
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/system", get(system_handler))
        .route("/api/alerts", get(alerts_handler))
        .route("/api/processes", get(processes_handler))
        .route("/api/process/kill", post(kill_handler))
        .route("/api/cache/purge", post(purge_handler))
        .route("/health", get(|| async { "OK" }))
        .layer(cors)
        .with_state(state)
}

/// Runs a blocking OS call off the async runtime, bounded by the configured
/// timeout.
async fn run_blocking<T, F>(state: &AppState, call: F) -> Result<T, Response>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(state.os_timeout, tokio::task::spawn_blocking(call)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            tracing::error!("OS call panicked: {}", e);
            Err(fail(StatusCode::INTERNAL_SERVER_ERROR, "internal error"))
        }
        Err(_) => {
            tracing::warn!("OS call exceeded {:?}", state.os_timeout);
            Err(fail(StatusCode::GATEWAY_TIMEOUT, "operating system call timed out"))
        }
    }
}

async fn system_handler(State(state): State<AppState>) -> Response {
    let sampler = Arc::clone(&state.sampler);
    match run_blocking(&state, move || sampler.sample()).await {
        Ok(snapshot) => ok(snapshot),
        Err(resp) => resp,
    }
}

async fn alerts_handler(State(state): State<AppState>) -> Response {
    let sampler = Arc::clone(&state.sampler);
    let evaluator = Arc::clone(&state.alerts);
    match run_blocking(&state, move || evaluator.evaluate(&sampler.sample())).await {
        Ok(alerts) => ok(alerts),
        Err(resp) => resp,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessQuery {
    sort: Option<String>,
    limit: Option<String>,
    group: Option<String>,
}

impl ProcessQuery {
    fn sort_key(&self) -> SortKey {
        SortKey::from(self.sort.as_deref().unwrap_or("cpu"))
    }

    /// Anything other than a positive integer falls back to the default.
    fn limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|l| l.parse::<usize>().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
    }

    fn grouped(&self) -> bool {
        self.group.as_deref() == Some("true")
    }
}

async fn processes_handler(
    State(state): State<AppState>,
    Query(query): Query<ProcessQuery>,
) -> Response {
    let (sort, limit, grouped) = (query.sort_key(), query.limit(), query.grouped());
    tracing::debug!("listing processes sort={:?} limit={} grouped={}", sort, limit, grouped);

    let processes = Arc::clone(&state.processes);
    match run_blocking(&state, move || processes.list_processes(sort, limit, grouped)).await {
        Ok(Ok(list)) => ok(list),
        Ok(Err(e)) => fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Err(resp) => resp,
    }
}

async fn kill_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let req: KillRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(_) => return fail(StatusCode::BAD_REQUEST, "invalid request body"),
    };

    if req.validate().is_err() {
        return fail(StatusCode::BAD_REQUEST, "invalid PID");
    }

    let processes = Arc::clone(&state.processes);
    match run_blocking(&state, move || processes.kill_process(&req)).await {
        Ok(Ok(outcome)) => ok(json!({
            "pid": outcome.pid,
            "killed": true,
            "signal": outcome.signal,
            "children_signalled": outcome.children_signalled,
            "children_failed": outcome.children_failed,
        })),
        Ok(Err(e)) => fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Err(resp) => resp,
    }
}

async fn purge_handler(State(state): State<AppState>) -> Response {
    let processes = Arc::clone(&state.processes);
    match run_blocking(&state, move || processes.purge_cache()).await {
        Ok(Ok(())) => ok(json!({ "purged": true })),
        Ok(Err(e)) => fail(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        Err(resp) => resp,
    }
}

//! HTTP gateway over [`LearningService`].
//!
//! Every response is a JSON object with an `ok` flag. When a bearer token is
//! configured, all `/api/*` routes require `Authorization: Bearer <token>`;
//! `/health` is always open.

use crate::config::GatewayConfig;
use crate::error::{LearnError, Result};
use crate::service::LearningService;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

const DEFAULT_RESULTS_LIMIT: usize = 20;
const DEFAULT_QUEUE_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Clone)]
pub struct GatewayState {
    service: Arc<LearningService>,
    bearer_token: Option<String>,
}

impl GatewayState {
    /// Blank tokens are treated as unset.
    pub fn new(service: Arc<LearningService>, bearer_token: Option<String>) -> Self {
        let bearer_token = bearer_token
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty());
        Self {
            service,
            bearer_token,
        }
    }
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

#[derive(Deserialize)]
struct EnqueueBody {
    #[serde(default, alias = "q")]
    query: String,
}

#[derive(Deserialize, Default)]
struct LearnOnceBody {
    #[serde(default, alias = "query")]
    q: Option<String>,
    #[serde(default)]
    topics: Option<Vec<String>>,
}

#[derive(Deserialize, Default)]
struct SchedulerStartBody {
    #[serde(default, alias = "interval")]
    interval_seconds: Option<u64>,
    #[serde(default)]
    run_immediately: Option<bool>,
}

/// Build the gateway router.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/queue", post(enqueue).get(queue_snapshot))
        .route("/api/learn/once", post(learn_once))
        .route("/api/results", get(results))
        .route("/api/scheduler/start", post(scheduler_start))
        .route("/api/scheduler/stop", post(scheduler_stop))
        .with_state(state)
}

/// Serve on an already bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    tracing::info!("gateway listening on http://{local_addr}");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LearnError::Gateway(e.to_string()))
}

/// Bind `config.host:config.port` and serve until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_gateway<F>(
    config: &GatewayConfig,
    service: Arc<LearningService>,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| LearnError::Gateway(format!("failed to bind {addr}: {e}")))?;
    serve(
        listener,
        GatewayState::new(service, config.bearer_token.clone()),
        shutdown,
    )
    .await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true, "status": "ok" }))
}

async fn status(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    if let Some(denied) = authorize(&state, &headers) {
        return denied;
    }
    ok(json!({ "status": state.service.scheduler_status() }))
}

async fn enqueue(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(denied) = authorize(&state, &headers) {
        return denied;
    }
    let body: EnqueueBody = match parse_body(&body) {
        Ok(Some(b)) => b,
        Ok(None) => return error(StatusCode::BAD_REQUEST, "query is required"),
        Err(resp) => return resp,
    };
    let query = body.query.trim();
    if query.is_empty() {
        return error(StatusCode::BAD_REQUEST, "query is required");
    }

    state.service.enqueue(query);
    ok(json!({
        "queued": query,
        "queue_size": state.service.runner().queue().len(),
    }))
}

async fn queue_snapshot(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(params): Query<LimitQuery>,
) -> Response {
    if let Some(denied) = authorize(&state, &headers) {
        return denied;
    }
    let limit = clamp_limit(params.limit, DEFAULT_QUEUE_LIMIT);
    ok(json!({
        "items": state.service.queue_snapshot(limit),
        "size": state.service.runner().queue().len(),
    }))
}

async fn learn_once(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(denied) = authorize(&state, &headers) {
        return denied;
    }
    let body: LearnOnceBody = match parse_body(&body) {
        Ok(b) => b.unwrap_or_default(),
        Err(resp) => return resp,
    };

    if let Some(q) = body.q {
        let q = q.trim();
        if q.is_empty() {
            return error(StatusCode::BAD_REQUEST, "q must not be empty");
        }
        let record = state.service.learn_now(q).await;
        return ok(json!({ "record": record }));
    }

    let report = state.service.run_cycle_now(body.topics.as_deref()).await;
    ok(json!({ "report": report }))
}

async fn results(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Query(params): Query<LimitQuery>,
) -> Response {
    if let Some(denied) = authorize(&state, &headers) {
        return denied;
    }
    let limit = clamp_limit(params.limit, DEFAULT_RESULTS_LIMIT);
    match state.service.recent_results(limit).await {
        Ok(records) => ok(json!({ "results": records })),
        Err(e) => {
            tracing::warn!("failed to read results: {e}");
            error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn scheduler_start(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(denied) = authorize(&state, &headers) {
        return denied;
    }
    let body: SchedulerStartBody = match parse_body(&body) {
        Ok(b) => b.unwrap_or_default(),
        Err(resp) => return resp,
    };

    match state
        .service
        .scheduler_start(body.interval_seconds, body.run_immediately)
    {
        Ok(started) => ok(json!({
            "started": started,
            "status": state.service.scheduler_status(),
        })),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}

async fn scheduler_stop(State(state): State<GatewayState>, headers: HeaderMap) -> Response {
    if let Some(denied) = authorize(&state, &headers) {
        return denied;
    }
    let stopped = state.service.scheduler_stop();
    ok(json!({ "stopped": stopped }))
}

fn authorize(state: &GatewayState, headers: &HeaderMap) -> Option<Response> {
    if bearer_is_valid(headers, &state.bearer_token) {
        None
    } else {
        Some(error(StatusCode::UNAUTHORIZED, "unauthorized"))
    }
}

fn bearer_is_valid(headers: &HeaderMap, expected: &Option<String>) -> bool {
    let Some(expected_token) = expected else {
        return true;
    };
    let candidate = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .trim();
    !expected_token.is_empty() && candidate == expected_token
}

/// Parse an optional JSON body. An empty body yields `Ok(None)`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> std::result::Result<Option<T>, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| error(StatusCode::BAD_REQUEST, &format!("invalid JSON body: {e}")))
}

fn clamp_limit(requested: Option<usize>, default: usize) -> usize {
    requested.unwrap_or(default).clamp(1, MAX_LIMIT)
}

fn ok(mut payload: serde_json::Value) -> Response {
    if let Some(map) = payload.as_object_mut() {
        map.insert("ok".to_owned(), json!(true));
    }
    (StatusCode::OK, Json(payload)).into_response()
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "ok": false, "error": message }))).into_response()
}

//! HTTP gateway over a real listener.

use crate::helpers::simple_service;
use autolearn::gateway::{self, GatewayState};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::sync::oneshot;

struct TestGateway {
    base: String,
    client: reqwest::Client,
    _shutdown: oneshot::Sender<()>,
    _dir: tempfile::TempDir,
}

async fn start_gateway(topics: &[&str], token: Option<&str>) -> TestGateway {
    let dir = tempfile::tempdir().unwrap();
    let service = simple_service(dir.path(), topics);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let state = GatewayState::new(service, token.map(str::to_owned));
    tokio::spawn(async move {
        gateway::serve(listener, state, async move {
            let _ = rx.await;
        })
        .await
        .unwrap();
    });

    TestGateway {
        base: format!("http://{addr}"),
        client: reqwest::Client::new(),
        _shutdown: tx,
        _dir: dir,
    }
}

impl TestGateway {
    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();
        (resp.status(), resp.json().await.unwrap())
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}{path}", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        (resp.status(), resp.json().await.unwrap())
    }
}

#[tokio::test]
async fn health_is_ok() {
    let gw = start_gateway(&[], None).await;
    let (status, body) = gw.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn empty_query_is_rejected_before_the_core() {
    let gw = start_gateway(&[], None).await;
    let (status, body) = gw.post("/api/queue", json!({ "query": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);

    let (_, queue) = gw.get("/api/queue").await;
    assert_eq!(queue["size"], 0);

    let (status, _) = gw.post("/api/learn/once", json!({ "q": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn enqueue_then_snapshot_newest_first() {
    let gw = start_gateway(&[], None).await;
    for q in ["first", "second"] {
        let (status, body) = gw.post("/api/queue", json!({ "query": q })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["queued"], q);
    }

    let (status, body) = gw.get("/api/queue?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["items"], json!(["second", "first"]));
    assert_eq!(body["size"], 2);
}

#[tokio::test]
async fn learn_once_runs_a_cycle_and_results_are_listed() {
    let gw = start_gateway(&["t1"], None).await;
    gw.post("/api/queue", json!({ "query": "a" })).await;

    let (status, body) = gw.post("/api/learn/once", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["report"]["queue_processed"], 1);
    assert_eq!(body["report"]["topics_processed"], 1);

    let (status, body) = gw.post("/api/learn/once", json!({ "q": "manual" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["query"], "manual");
    assert_eq!(body["record"]["origin"], "manual");

    let (_, body) = gw.get("/api/results?limit=2").await;
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["query"], "manual");

    let (_, body) = gw.get("/api/status").await;
    assert_eq!(body["status"]["runs"], 1);
}

#[tokio::test]
async fn scheduler_start_and_stop_report_state() {
    let gw = start_gateway(&[], None).await;
    let (status, body) = gw
        .post(
            "/api/scheduler/start",
            json!({ "interval_seconds": 3600, "run_immediately": false }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["started"], true);
    assert_eq!(body["status"]["running"], true);
    assert_eq!(body["status"]["interval_seconds"], 3600);

    let (_, body) = gw.post("/api/scheduler/start", json!({})).await;
    assert_eq!(body["started"], false);

    let (_, body) = gw.post("/api/scheduler/stop", json!({})).await;
    assert_eq!(body["stopped"], true);
    let (_, body) = gw.post("/api/scheduler/stop", json!({})).await;
    assert_eq!(body["stopped"], false);
}

#[tokio::test]
async fn bearer_token_guards_api_routes_only() {
    let gw = start_gateway(&[], Some("s3cret")).await;

    let (status, _) = gw.get("/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = gw.get("/api/status").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["ok"], false);

    let resp = gw
        .client
        .get(format!("{}/api/status", gw.base))
        .bearer_auth("s3cret")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

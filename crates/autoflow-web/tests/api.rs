//! In-process API tests through `tower::ServiceExt::oneshot`.

use std::collections::HashMap;
use std::sync::Arc;

use autoflow_actions::{ActionExecutor, Endpoints};
use autoflow_auth::{CredentialResolver, EnvironmentTier};
use autoflow_engine::RunOptions;
use autoflow_store::{AccountStore, CredentialRecord, MemoryAccountStore};
use autoflow_web::{AppState, router};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app(server: &MockServer, accounts: Arc<MemoryAccountStore>) -> Router {
    let resolver = CredentialResolver::without_accounts(EnvironmentTier::from_map(HashMap::new()));
    let executor = ActionExecutor::with_endpoints(Arc::new(resolver), Endpoints::uniform(&server.uri()));
    let state = AppState::new(Arc::new(executor), accounts, RunOptions::default());
    router(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn task_without_action_id_is_400() {
    let server = MockServer::start().await;
    let app = app(&server, Arc::new(MemoryAccountStore::new())).await;

    let (status, body) = send(app, post_json("/api/execute/task", json!({"config": {}}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "actionId is required"}));
}

#[tokio::test]
async fn task_success_returns_execution_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pong": true})))
        .mount(&server)
        .await;
    let app = app(&server, Arc::new(MemoryAccountStore::new())).await;

    let (status, body) = send(
        app,
        post_json(
            "/api/execute/task",
            json!({"actionId": "http_request", "config": {"url": format!("{}/ping", server.uri())}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["output"], json!({"pong": true}));
}

#[tokio::test]
async fn task_credentials_act_as_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat.postMessage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    let app = app(&server, Arc::new(MemoryAccountStore::new())).await;

    let (status, body) = send(
        app,
        post_json(
            "/api/execute/task",
            json!({
                "actionId": "slack_send_message",
                "config": {"channel": "C1", "text": "hi"},
                "credentials": {"SLACK_BOT_TOKEN": "pasted"}
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
}

#[tokio::test]
async fn failed_task_is_500_with_error() {
    let server = MockServer::start().await;
    let app = app(&server, Arc::new(MemoryAccountStore::new())).await;

    let (status, body) = send(
        app,
        post_json("/api/execute/task", json!({"actionId": "teleport_user"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("teleport_user"));
}

#[tokio::test]
async fn workflow_without_nodes_is_400() {
    let server = MockServer::start().await;
    let app = app(&server, Arc::new(MemoryAccountStore::new())).await;

    let (status, body) = send(
        app,
        post_json("/api/execute/workflow", json!({"workflow": {"edges": []}})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"error": "Valid workflow object with nodes is required"})
    );
}

#[tokio::test]
async fn workflow_returns_run_report() {
    let server = MockServer::start().await;
    let app = app(&server, Arc::new(MemoryAccountStore::new())).await;

    let (status, body) = send(
        app,
        post_json(
            "/api/execute/workflow",
            json!({
                "workflow": {
                    "nodes": [
                        {"id": "a", "position": {"x": 0, "y": 0}, "data": {"label": "Note"}}
                    ],
                    "edges": []
                }
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["results"]["a"]["status"], "skipped");
    assert_eq!(body["logs"][1], "Node a skipped (no actionId)");
    assert!(body["run_id"].is_string());
}

#[tokio::test]
async fn integrations_status_lists_connected_providers() {
    let server = MockServer::start().await;
    let accounts = Arc::new(MemoryAccountStore::new());
    accounts
        .upsert(CredentialRecord::new("user_1", "google", "tok"))
        .await
        .unwrap();
    accounts
        .upsert(CredentialRecord::new("user_1", "slack", "tok"))
        .await
        .unwrap();
    let app = app(&server, accounts).await;

    let request = Request::get("/api/integrations/status")
        .header("x-user-id", "user_1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app.clone(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"connections": {"google": true, "slack": true}}));

    let anonymous = Request::get("/api/integrations/status")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(app, anonymous).await;
    assert_eq!(body, json!({"connections": {}}));
}

#[tokio::test]
async fn actions_catalog_filters_by_platform() {
    let server = MockServer::start().await;
    let app = app(&server, Arc::new(MemoryAccountStore::new())).await;

    let request = Request::get("/api/actions?platform=GitHub")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["actions"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|a| a["id"].as_str())
        .collect();
    assert_eq!(
        ids,
        ["github_create_issue", "github_comment_issue", "github_list_issues"]
    );
}

#[tokio::test]
async fn health_reports_version() {
    let server = MockServer::start().await;
    let app = app(&server, Arc::new(MemoryAccountStore::new())).await;

    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

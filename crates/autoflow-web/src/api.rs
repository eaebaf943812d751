//! REST API route handlers.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use autoflow_actions::{ActionDefinition, registry};
use autoflow_auth::CredentialOverrides;
use autoflow_engine::WorkflowGraph;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

fn user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Keep string-valued, non-empty credentials; anything else is ignored.
fn overrides(credentials: Option<Map<String, Value>>) -> Option<CredentialOverrides> {
    let map: CredentialOverrides = credentials?
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::String(s) if !s.is_empty() => Some((k, s)),
            _ => None,
        })
        .collect();
    (!map.is_empty()).then_some(map)
}

// ---------------------------------------------------------------------------
// POST /api/execute/task
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[serde(default)]
    pub action_id: Option<String>,
    #[serde(default)]
    pub config: Value,
    #[serde(default)]
    pub credentials: Option<Map<String, Value>>,
}

/// Run one action.  The body is the `ExecutionResult`; a failed action
/// answers 500.
pub async fn execute_task(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<TaskRequest>,
) -> Result<Response> {
    let action_id = request
        .action_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("actionId is required".into()))?;
    let user = user_id(&headers);
    let overrides = overrides(request.credentials);

    let result = state
        .executor
        .execute(&action_id, request.config, overrides.as_ref(), user.as_deref())
        .await;

    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((status, Json(result)).into_response())
}

// ---------------------------------------------------------------------------
// POST /api/execute/workflow
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct WorkflowRequest {
    #[serde(default)]
    pub workflow: Value,
    #[serde(default)]
    pub credentials: Option<Map<String, Value>>,
}

/// Run a workflow graph and return its report.
pub async fn execute_workflow(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<WorkflowRequest>,
) -> Result<Response> {
    let graph = WorkflowGraph::from_value(request.workflow)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let user = user_id(&headers);
    let overrides = overrides(request.credentials);

    let report = state
        .runner
        .run(&graph, overrides.as_ref(), user.as_deref())
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(report).into_response())
}

// ---------------------------------------------------------------------------
// GET /api/actions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ActionsQuery {
    pub platform: Option<String>,
}

#[derive(Serialize)]
pub struct ActionsResponse {
    pub platforms: Vec<&'static str>,
    pub actions: Vec<&'static ActionDefinition>,
}

/// The action catalog, optionally narrowed to one platform.
pub async fn actions(Query(query): Query<ActionsQuery>) -> Json<ActionsResponse> {
    let actions = match query.platform.as_deref() {
        Some(platform) => registry::by_platform(platform).collect(),
        None => registry::all().iter().collect(),
    };
    Json(ActionsResponse {
        platforms: registry::platforms(),
        actions,
    })
}

// ---------------------------------------------------------------------------
// GET /api/integrations/status
// ---------------------------------------------------------------------------

/// `{ "connections": { "<provider>": true } }` for the calling user.
pub async fn integrations_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>> {
    let mut connections = BTreeMap::new();
    if let Some(user) = user_id(&headers) {
        for provider in state.accounts.list_providers(&user).await? {
            connections.insert(provider, true);
        }
    }
    Ok(Json(json!({ "connections": connections })))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn blank_identity_is_anonymous() {
        let mut headers = HeaderMap::new();
        assert_eq!(user_id(&headers), None);
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("  "));
        assert_eq!(user_id(&headers), None);
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("user_42"));
        assert_eq!(user_id(&headers).as_deref(), Some("user_42"));
    }

    #[test]
    fn only_non_empty_string_credentials_survive() {
        let creds = json!({"SLACK_BOT_TOKEN": "x", "EMPTY": "", "NUM": 3})
            .as_object()
            .cloned();
        let map = overrides(creds).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["SLACK_BOT_TOKEN"], "x");

        assert!(overrides(Some(Map::new())).is_none());
        assert!(overrides(None).is_none());
    }
}

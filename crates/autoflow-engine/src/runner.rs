//! The workflow runner.
//!
//! Runs every node of a graph, one at a time, in a deterministic order and
//! collects a [`RunReport`].  A failing node never stops the run unless
//! [`RunOptions::stop_on_failure`] is set; the report always holds one
//! result per node.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};
use uuid::Uuid;

use autoflow_actions::{ActionExecutor, ExecutionResult};
use autoflow_auth::CredentialOverrides;

use crate::error::Result;
use crate::graph::{Node, NodeStatus, WorkflowGraph};
use crate::observer::{NoopObserver, RunObserver};

// ---------------------------------------------------------------------------
// Invoker
// ---------------------------------------------------------------------------

/// Executes one action on behalf of the runner.
#[async_trait]
pub trait ActionInvoker: Send + Sync {
    async fn invoke(
        &self,
        action_id: &str,
        config: Value,
        context: &Value,
        overrides: Option<&CredentialOverrides>,
        user_id: Option<&str>,
    ) -> ExecutionResult;
}

#[async_trait]
impl ActionInvoker for ActionExecutor {
    async fn invoke(
        &self,
        action_id: &str,
        config: Value,
        context: &Value,
        overrides: Option<&CredentialOverrides>,
        user_id: Option<&str>,
    ) -> ExecutionResult {
        self.execute_with_context(action_id, config, context, overrides, user_id)
            .await
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How the run order is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordering {
    /// Ascending `position.x`.
    #[default]
    LayoutX,
    /// Ascending `data.sequence`; nodes without one follow, by `position.x`.
    Sequence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub ordering: Ordering,
    /// Skip every node after the first failure.
    pub stop_on_failure: bool,
}

/// Nodes in run order.  Both orderings are stable: ties keep array order.
pub fn execution_order(nodes: &[Node], ordering: Ordering) -> Vec<&Node> {
    let mut ordered: Vec<&Node> = nodes.iter().collect();
    match ordering {
        Ordering::LayoutX => {
            ordered.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));
        }
        Ordering::Sequence => ordered.sort_by(|a, b| {
            let key = |n: &Node| (n.data.sequence.is_none(), n.data.sequence.unwrap_or(0));
            key(a)
                .cmp(&key(b))
                .then_with(|| a.position.x.total_cmp(&b.position.x))
        }),
    }
    ordered
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Terminal state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failed,
    Skipped,
}

impl From<ResultStatus> for NodeStatus {
    fn from(status: ResultStatus) -> Self {
        match status {
            ResultStatus::Success => Self::Completed,
            ResultStatus::Failed => Self::Failed,
            ResultStatus::Skipped => Self::Skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl NodeResult {
    fn from_execution(result: ExecutionResult) -> Self {
        Self {
            status: if result.success {
                ResultStatus::Success
            } else {
                ResultStatus::Failed
            },
            output: result.output,
            error: result.error,
            message: None,
            timestamp: Utc::now(),
        }
    }

    fn skipped(message: &str) -> Self {
        Self {
            status: ResultStatus::Skipped,
            output: None,
            error: None,
            message: Some(message.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// The shape later nodes see in their interpolation context.
    fn context_entry(&self) -> Value {
        json!({
            "status": self.status,
            "output": self.output,
            "error": self.error,
        })
    }
}

/// Outcome of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    /// `false` if any node failed.
    pub success: bool,
    pub results: BTreeMap<String, NodeResult>,
    pub logs: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    pub fn failed_nodes(&self) -> impl Iterator<Item = &str> {
        self.results
            .iter()
            .filter(|(_, r)| r.status == ResultStatus::Failed)
            .map(|(id, _)| id.as_str())
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

const NO_ACTION_MESSAGE: &str = "No actionId defined";
const AFTER_FAILURE_MESSAGE: &str = "Skipped after an earlier node failed";

/// Sequential workflow runner.
pub struct WorkflowRunner {
    invoker: Arc<dyn ActionInvoker>,
    observer: Arc<dyn RunObserver>,
    options: RunOptions,
}

impl WorkflowRunner {
    pub fn new(invoker: Arc<dyn ActionInvoker>) -> Self {
        Self {
            invoker,
            observer: Arc::new(NoopObserver),
            options: RunOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    /// Run every node of `graph`.
    ///
    /// # Errors
    ///
    /// Only when the graph fails [`WorkflowGraph::validate`]; nothing has
    /// run in that case.  Node failures are recorded in the report.
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        overrides: Option<&CredentialOverrides>,
        user_id: Option<&str>,
    ) -> Result<RunReport> {
        graph.validate()?;

        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        let order = execution_order(&graph.nodes, self.options.ordering);

        info!(
            run_id = %run_id,
            nodes = order.len(),
            user = user_id.unwrap_or("-"),
            "starting workflow run"
        );

        let mut results = BTreeMap::new();
        let mut logs = Vec::with_capacity(order.len() * 2);
        let mut context = Map::new();
        let mut success = true;
        let mut halted = false;

        for node in order {
            logs.push(format!("Starting Node {} ({})", node.id, node.data.label));

            let result = if halted {
                logs.push(format!("Node {} skipped (earlier failure)", node.id));
                NodeResult::skipped(AFTER_FAILURE_MESSAGE)
            } else if let Some(action_id) = node.action_id() {
                self.observer.on_node_status(&node.id, NodeStatus::Active).await;
                debug!(run_id = %run_id, node = %node.id, action = action_id, "invoking node");

                let execution = self
                    .invoker
                    .invoke(
                        action_id,
                        node.resolved_config(),
                        &Value::Object(context.clone()),
                        overrides,
                        user_id,
                    )
                    .await;
                let result = NodeResult::from_execution(execution);

                if result.status == ResultStatus::Failed {
                    success = false;
                    halted = self.options.stop_on_failure;
                    let error = result.error.as_deref().unwrap_or("unknown error");
                    warn!(run_id = %run_id, node = %node.id, error, "node failed");
                    logs.push(format!("Node {} failed: {error}", node.id));
                } else {
                    logs.push(format!("Node {} completed successfully", node.id));
                }
                result
            } else {
                logs.push(format!("Node {} skipped (no actionId)", node.id));
                NodeResult::skipped(NO_ACTION_MESSAGE)
            };

            self.observer
                .on_node_status(&node.id, result.status.into())
                .await;
            context.insert(node.id.clone(), result.context_entry());
            results.insert(node.id.clone(), result);
        }

        let finished_at = Utc::now();
        info!(
            run_id = %run_id,
            success,
            elapsed_ms = (finished_at - started_at).num_milliseconds(),
            "workflow run finished"
        );

        Ok(RunReport {
            run_id,
            success,
            results,
            logs,
            started_at,
            finished_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::ChannelObserver;
    use std::sync::Mutex;

    /// Invoker that records calls and answers from a fixed table.
    #[derive(Default)]
    struct ScriptedInvoker {
        calls: Mutex<Vec<(String, Value, Value)>>,
        failing: Vec<&'static str>,
    }

    #[async_trait]
    impl ActionInvoker for ScriptedInvoker {
        async fn invoke(
            &self,
            action_id: &str,
            config: Value,
            context: &Value,
            _overrides: Option<&CredentialOverrides>,
            _user_id: Option<&str>,
        ) -> ExecutionResult {
            self.calls
                .lock()
                .unwrap()
                .push((action_id.to_string(), config, context.clone()));
            if self.failing.iter().any(|f| *f == action_id) {
                ExecutionResult::failure(format!("{action_id} broke"), vec![])
            } else {
                ExecutionResult::success(json!({"from": action_id}), vec![])
            }
        }
    }

    fn graph(nodes: Value) -> WorkflowGraph {
        WorkflowGraph::from_value(json!({ "nodes": nodes })).unwrap()
    }

    fn node(id: &str, x: f64, action: Option<&str>) -> Value {
        json!({
            "id": id,
            "position": {"x": x, "y": 0},
            "data": {"label": id.to_uppercase(), "actionId": action}
        })
    }

    #[test]
    fn layout_order_is_stable() {
        let g = graph(json!([
            node("c", 300.0, None),
            node("a", 0.0, None),
            node("b1", 150.0, None),
            node("b2", 150.0, None),
        ]));
        let ids: Vec<_> = execution_order(&g.nodes, Ordering::LayoutX)
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, ["a", "b1", "b2", "c"]);
    }

    #[test]
    fn sequence_order_puts_unsequenced_last() {
        let g = graph(json!([
            {"id": "late", "position": {"x": 0, "y": 0}, "data": {}},
            {"id": "second", "position": {"x": 900, "y": 0}, "data": {"sequence": 2}},
            {"id": "first", "position": {"x": 500, "y": 0}, "data": {"sequence": 1}},
        ]));
        let ids: Vec<_> = execution_order(&g.nodes, Ordering::Sequence)
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, ["first", "second", "late"]);
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_run() {
        let invoker = Arc::new(ScriptedInvoker {
            failing: vec!["bad"],
            ..Default::default()
        });
        let runner = WorkflowRunner::new(invoker.clone());
        let g = graph(json!([
            node("n1", 0.0, Some("ok")),
            node("n2", 100.0, Some("bad")),
            node("n3", 200.0, Some("ok")),
        ]));

        let report = runner.run(&g, None, None).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results["n2"].status, ResultStatus::Failed);
        assert_eq!(report.results["n3"].status, ResultStatus::Success);
        assert_eq!(report.failed_nodes().collect::<Vec<_>>(), ["n2"]);
        assert!(report.logs.contains(&"Node n2 failed: bad broke".to_string()));
        assert_eq!(invoker.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn stop_on_failure_skips_the_rest() {
        let invoker = Arc::new(ScriptedInvoker {
            failing: vec!["bad"],
            ..Default::default()
        });
        let runner = WorkflowRunner::new(invoker.clone()).with_options(RunOptions {
            stop_on_failure: true,
            ..Default::default()
        });
        let g = graph(json!([node("n1", 0.0, Some("bad")), node("n2", 10.0, Some("ok"))]));

        let report = runner.run(&g, None, None).await.unwrap();

        assert!(!report.success);
        assert_eq!(report.results["n2"].status, ResultStatus::Skipped);
        assert_eq!(
            report.results["n2"].message.as_deref(),
            Some(AFTER_FAILURE_MESSAGE)
        );
        assert_eq!(invoker.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn context_carries_prior_results() {
        let invoker = Arc::new(ScriptedInvoker::default());
        let runner = WorkflowRunner::new(invoker.clone());
        let g = graph(json!([
            node("second", 50.0, Some("b")),
            node("first", 0.0, Some("a")),
        ]));

        runner.run(&g, None, None).await.unwrap();

        let calls = invoker.calls.lock().unwrap();
        assert_eq!(calls[0].0, "a");
        assert_eq!(calls[0].2, json!({}));
        assert_eq!(calls[1].0, "b");
        assert_eq!(
            calls[1].2,
            json!({"first": {"status": "success", "output": {"from": "a"}, "error": null}})
        );
    }

    #[tokio::test]
    async fn observer_sees_active_then_terminal() {
        let (observer, mut rx) = ChannelObserver::channel(16);
        let runner = WorkflowRunner::new(Arc::new(ScriptedInvoker::default()))
            .with_observer(Arc::new(observer));
        let g = graph(json!([node("n1", 0.0, Some("a")), node("n2", 1.0, None)]));

        runner.run(&g, None, None).await.unwrap();
        drop(runner);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push((event.node_id, event.status));
        }
        assert_eq!(
            events,
            vec![
                ("n1".to_string(), NodeStatus::Active),
                ("n1".to_string(), NodeStatus::Completed),
                ("n2".to_string(), NodeStatus::Skipped),
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_ids_fail_before_running() {
        let invoker = Arc::new(ScriptedInvoker::default());
        let runner = WorkflowRunner::new(invoker.clone());
        let g = WorkflowGraph {
            nodes: vec![
                serde_json::from_value(node("a", 0.0, Some("x"))).unwrap(),
                serde_json::from_value(node("a", 1.0, Some("x"))).unwrap(),
            ],
            edges: vec![],
        };

        assert!(runner.run(&g, None, None).await.is_err());
        assert!(invoker.calls.lock().unwrap().is_empty());
    }
}

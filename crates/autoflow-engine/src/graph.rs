//! Workflow graph model.
//!
//! The planner produces a node graph in the editor's JSON shape:
//!
//! ```json
//! {
//!   "nodes": [{
//!     "id": "n1",
//!     "position": { "x": 0, "y": 40 },
//!     "data": { "label": "Post", "actionId": "slack_send_message",
//!               "config": { "channel": { "mode": "manual", "value": "C1" } } }
//!   }],
//!   "edges": [{ "id": "e1", "source": "n1", "target": "n2" }]
//! }
//! ```
//!
//! Edges are kept for round-tripping but never consulted for ordering.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{EngineError, Result};

/// Message returned when a request carries no usable node list.
pub const INVALID_GRAPH_MESSAGE: &str = "Valid workflow object with nodes is required";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A workflow as emitted by the planner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

/// One step of a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Editor node type; informational only.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: Position,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: NodeData,
}

/// Layout position in the editor canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Node payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Display state written by the editor; never read when running.
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: NodeStatus,
    /// Kept as a string: ids unknown to this build still reach the executor
    /// and come back as "not implemented".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub config: Map<String, Value>,
    /// Explicit position in the run order; only read under
    /// [`Ordering::Sequence`](crate::Ordering::Sequence).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
}

/// Per-run, per-node state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Failed,
    Skipped,
}

/// An explicit `null` reads like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Unknown or malformed status values fall back to [`NodeStatus::Pending`].
fn lenient_status<'de, D>(deserializer: D) -> std::result::Result<NodeStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|value| serde_json::from_value(value).ok())
        .unwrap_or_default())
}

/// Visual connection between two nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
}

/// A config value as stored on a node: a bare scalar (legacy graphs) or a
/// `{ mode, value }` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Envelope { mode: FieldMode, value: Value },
    Scalar(Value),
}

/// How an enveloped value was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldMode {
    /// Entered by the user; used verbatim.
    Manual,
    /// Synthesized by the planner before the run.
    Ai,
}

impl FieldValue {
    /// The plain value the executor receives.
    pub fn into_value(self) -> Value {
        match self {
            Self::Envelope { value, .. } => value,
            Self::Scalar(value) => value,
        }
    }
}

// ---------------------------------------------------------------------------
// Construction and validation
// ---------------------------------------------------------------------------

impl WorkflowGraph {
    /// Parse a graph from request JSON, rejecting anything without a
    /// `nodes` array before attempting full deserialization.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.get("nodes").is_some_and(Value::is_array) {
            return Err(EngineError::InvalidGraph {
                reason: INVALID_GRAPH_MESSAGE.to_string(),
            });
        }
        let graph: Self = serde_json::from_value(value)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Check that node ids are present and unique.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            if node.id.trim().is_empty() {
                return Err(EngineError::EmptyNodeId { index });
            }
            if !seen.insert(node.id.as_str()) {
                return Err(EngineError::DuplicateNode {
                    id: node.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

impl Node {
    /// The action id, treating an empty string as absent.
    pub fn action_id(&self) -> Option<&str> {
        self.data
            .action_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// The node's config with every envelope flattened to its value.
    pub fn resolved_config(&self) -> Value {
        let map = self
            .data
            .config
            .iter()
            .map(|(key, raw)| {
                let value = serde_json::from_value::<FieldValue>(raw.clone())
                    .map(FieldValue::into_value)
                    .unwrap_or_else(|_| raw.clone());
                (key.clone(), value)
            })
            .collect::<Map<String, Value>>();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_nodes_is_rejected() {
        for value in [json!({}), json!({"nodes": {}}), json!(null), json!({"edges": []})] {
            let err = WorkflowGraph::from_value(value).unwrap_err();
            assert_eq!(err.to_string(), INVALID_GRAPH_MESSAGE);
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = WorkflowGraph::from_value(json!({
            "nodes": [{"id": "a"}, {"id": "b"}, {"id": "a"}]
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::DuplicateNode { ref id } if id == "a"));
    }

    #[test]
    fn editor_json_deserializes() {
        let graph = WorkflowGraph::from_value(json!({
            "nodes": [{
                "id": "n1",
                "type": "custom",
                "position": {"x": 120.5, "y": 40},
                "data": {
                    "label": "Post",
                    "status": "pending",
                    "actionId": "slack_send_message",
                    "config": {"channel": {"mode": "manual", "value": "C1"}, "text": "hi"}
                }
            }],
            "edges": [{"id": "e1", "source": "n1", "target": "n2"}]
        }))
        .unwrap();

        let node = graph.node("n1").unwrap();
        assert_eq!(node.position.x, 120.5);
        assert_eq!(node.action_id(), Some("slack_send_message"));
        assert_eq!(
            node.resolved_config(),
            json!({"channel": "C1", "text": "hi"})
        );
        assert_eq!(graph.edges.len(), 1);
    }

    #[test]
    fn blank_action_id_is_absent() {
        let node: Node = serde_json::from_value(json!({
            "id": "n", "data": {"label": "x", "actionId": "  "}
        }))
        .unwrap();
        assert_eq!(node.action_id(), None);
    }

    #[test]
    fn ai_envelopes_flatten_like_manual_ones() {
        let node: Node = serde_json::from_value(json!({
            "id": "n",
            "data": {"config": {"subject": {"mode": "ai", "value": "Weekly report"}, "n": 3}}
        }))
        .unwrap();
        assert_eq!(
            node.resolved_config(),
            json!({"subject": "Weekly report", "n": 3})
        );
    }

    #[test]
    fn null_config_and_label_read_as_empty() {
        let graph = WorkflowGraph::from_value(json!({
            "nodes": [{
                "id": "n1",
                "position": null,
                "data": {"label": null, "actionId": "http_request", "config": null}
            }]
        }))
        .unwrap();

        let node = graph.node("n1").unwrap();
        assert_eq!(node.data.label, "");
        assert!(node.data.config.is_empty());
        assert_eq!(node.position, Position::default());
        assert_eq!(node.resolved_config(), json!({}));
    }

    #[test]
    fn foreign_status_values_do_not_reject_the_graph() {
        let graph = WorkflowGraph::from_value(json!({
            "nodes": [
                {"id": "a", "data": {"status": "success"}},
                {"id": "b", "data": {"status": 3}},
                {"id": "c", "data": {"status": null}},
                {"id": "d", "data": {"status": "failed"}}
            ]
        }))
        .unwrap();

        let status = |id: &str| graph.node(id).unwrap().data.status;
        assert_eq!(status("a"), NodeStatus::Pending);
        assert_eq!(status("b"), NodeStatus::Pending);
        assert_eq!(status("c"), NodeStatus::Pending);
        assert_eq!(status("d"), NodeStatus::Failed);
    }

    #[test]
    fn null_data_reads_as_empty() {
        let graph = WorkflowGraph::from_value(json!({"nodes": [{"id": "a", "data": null}]})).unwrap();
        assert_eq!(graph.nodes[0].action_id(), None);
    }
}

//! The uniform result of one action execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of a single action, success or failure.
///
/// Serialized verbatim as the single-action endpoint's response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl ExecutionResult {
    pub fn success(output: Value, logs: Vec<String>) -> Self {
        Self {
            success: true,
            output: Some(output),
            error: None,
            logs,
        }
    }

    pub fn failure(error: impl Into<String>, logs: Vec<String>) -> Self {
        Self {
            success: false,
            output: None,
            error: Some(error.into()),
            logs,
        }
    }
}

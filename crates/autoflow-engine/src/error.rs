//! Engine error types.
//!
//! Node-level failures never surface here; they are recorded in the
//! [`RunReport`](crate::RunReport).  [`EngineError`] covers only input that
//! is rejected before any node runs.

/// Unified error type for the workflow engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The graph is structurally unusable (e.g. no `nodes` array).
    #[error("{reason}")]
    InvalidGraph { reason: String },

    /// Two nodes share an id, so results could not be keyed by node.
    #[error("duplicate node id `{id}` in workflow")]
    DuplicateNode { id: String },

    /// A node has an empty id.
    #[error("workflow node at index {index} has an empty id")]
    EmptyNodeId { index: usize },

    /// JSON deserialization of the graph failed.
    #[error("invalid workflow JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;
